use alloy_primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{config::TicketDefaults, consts::PACKED_TICKET_SIZE, errors::Error};

/// A probabilistic payment instrument, created by a sender and consumed
/// exactly once by the ledger.
///
/// A ticket pays out [`face_value`][Ticket::face_value] to the receiver with
/// probability `win_prob / 2^256`. The outcome is decided at redemption by
/// hashing both parties' revealed randomness together with the ticket
/// signature, so neither party alone can bias it.
///
/// Changing any field changes [`Ticket::hash`] and invalidates any prior
/// signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    /// The account paying for the ticket from its escrow.
    pub sender: Address,

    /// The account which is paid if the ticket wins.
    pub receiver: Address,

    /// The value transferred from sender escrow to the receiver on a win.
    pub face_value: U256,

    /// The win probability, as a numerator over `2^256`.
    pub win_prob: U256,

    /// The last block at which the ticket can be redeemed. Zero means the
    /// ticket never expires.
    pub expiration_block: u64,

    /// The hash of the sender's secret random value.
    pub sender_commit: B256,

    /// The hash of the receiver's secret random value. The sender must receive
    /// this before signing, but must never learn the value behind it.
    pub receiver_commit: B256,

    /// Distinguishes otherwise-identical tickets from the same sender.
    pub sender_nonce: u32,
}

impl Ticket {
    /// Encode the ticket in the tight binary format the ledger hashes.
    ///
    /// Equivalent to Solidity's `abi.encodePacked(sender, receiver, faceValue,
    /// winProb, expirationBlock, senderCommit, receiverCommit, senderNonce)`
    /// where `expirationBlock` is a `uint256` and `senderNonce` a `uint32`.
    pub fn encode_packed(&self) -> [u8; PACKED_TICKET_SIZE] {
        let mut buf = [0u8; PACKED_TICKET_SIZE];
        let mut cursor = 0;
        let mut put = |bytes: &[u8]| {
            buf[cursor..cursor + bytes.len()].copy_from_slice(bytes);
            cursor += bytes.len();
        };

        put(self.sender.as_slice());
        put(self.receiver.as_slice());
        put(&self.face_value.to_be_bytes::<32>());
        put(&self.win_prob.to_be_bytes::<32>());
        put(&U256::from(self.expiration_block).to_be_bytes::<32>());
        put(self.sender_commit.as_slice());
        put(self.receiver_commit.as_slice());
        put(&self.sender_nonce.to_be_bytes());

        buf
    }

    /// Compute the canonical ticket hash, which the sender signs.
    pub fn hash(&self) -> B256 {
        keccak256(self.encode_packed())
    }

    /// Returns true if the ticket can no longer be redeemed at `block`.
    pub fn is_expired_at(&self, block: u64) -> bool {
        self.expiration_block != 0 && block > self.expiration_block
    }

    /// Check the ticket's expiry against the given block height.
    pub fn check_expiry(&self, current_block: u64) -> Result<(), Error> {
        if self.is_expired_at(current_block) {
            return Err(Error::TicketExpired {
                expiration_block: self.expiration_block,
                current_block,
            });
        }
        Ok(())
    }

    /// Verifies the ticket is well formed, independent of any ledger state.
    pub fn validate(&self) -> Result<(), Error> {
        if self.sender.is_zero() {
            return Err(Error::InvalidTicket("sender is the zero address"));
        }
        if self.receiver.is_zero() {
            return Err(Error::InvalidTicket("receiver is the zero address"));
        }
        Ok(())
    }
}

/// Builds [`Ticket`]s, filling in face value, win probability and expiry
/// from configured defaults unless explicitly overridden.
#[derive(Debug, Clone)]
pub struct TicketBuilder {
    sender: Address,
    receiver: Address,
    face_value: U256,
    win_prob: U256,
    expiration_block: u64,
    sender_commit: Option<B256>,
    receiver_commit: Option<B256>,
    sender_nonce: u32,
}

impl TicketBuilder {
    pub fn new(sender: Address, receiver: Address) -> TicketBuilder {
        TicketBuilder::with_defaults(sender, receiver, &TicketDefaults::default(), 0)
    }

    /// Start a ticket using configured defaults. The expiry is derived from
    /// `current_block` and the configured ticket lifetime.
    pub fn with_defaults(
        sender: Address,
        receiver: Address,
        defaults: &TicketDefaults,
        current_block: u64,
    ) -> TicketBuilder {
        let expiration_block = match defaults.ticket_lifetime {
            0 => 0,
            lifetime => current_block.saturating_add(lifetime),
        };
        TicketBuilder {
            sender,
            receiver,
            face_value: defaults.face_value,
            win_prob: defaults.win_prob,
            expiration_block,
            sender_commit: None,
            receiver_commit: None,
            sender_nonce: 0,
        }
    }

    pub fn face_value(mut self, face_value: U256) -> Self {
        self.face_value = face_value;
        self
    }

    pub fn win_prob(mut self, win_prob: U256) -> Self {
        self.win_prob = win_prob;
        self
    }

    pub fn expiration_block(mut self, expiration_block: u64) -> Self {
        self.expiration_block = expiration_block;
        self
    }

    pub fn sender_commit(mut self, commit: B256) -> Self {
        self.sender_commit = Some(commit);
        self
    }

    pub fn receiver_commit(mut self, commit: B256) -> Self {
        self.receiver_commit = Some(commit);
        self
    }

    pub fn sender_nonce(mut self, nonce: u32) -> Self {
        self.sender_nonce = nonce;
        self
    }

    /// Finish the ticket. Both commitments must have been provided, since
    /// a ticket signed without the receiver's commitment would let the
    /// sender choose tickets knowing their outcome.
    pub fn build(self) -> Result<Ticket, Error> {
        let ticket = Ticket {
            sender: self.sender,
            receiver: self.receiver,
            face_value: self.face_value,
            win_prob: self.win_prob,
            expiration_block: self.expiration_block,
            sender_commit: self
                .sender_commit
                .ok_or(Error::InvalidTicket("missing sender commitment"))?,
            receiver_commit: self
                .receiver_commit
                .ok_or(Error::InvalidTicket("missing receiver commitment"))?,
            sender_nonce: self.sender_nonce,
        };
        ticket.validate()?;
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_ticket() -> Ticket {
        Ticket {
            sender: Address::repeat_byte(0x11),
            receiver: Address::repeat_byte(0x22),
            face_value: U256::from(1000u64),
            win_prob: U256::MAX,
            expiration_block: 77,
            sender_commit: B256::repeat_byte(0x33),
            receiver_commit: B256::repeat_byte(0x44),
            sender_nonce: 5,
        }
    }

    #[test]
    fn packed_encoding_layout() {
        let packed = sample_ticket().encode_packed();

        assert_eq!(&packed[0..20], &[0x11; 20]);
        assert_eq!(&packed[20..40], &[0x22; 20]);
        assert_eq!(&packed[40..70], &[0u8; 30]);
        assert_eq!(&packed[70..72], &[0x03, 0xe8]);
        assert_eq!(&packed[72..104], &[0xff; 32]);
        assert_eq!(&packed[104..135], &[0u8; 31]);
        assert_eq!(packed[135], 77);
        assert_eq!(&packed[136..168], &[0x33; 32]);
        assert_eq!(&packed[168..200], &[0x44; 32]);
        assert_eq!(&packed[200..204], &[0, 0, 0, 5]);
    }

    #[test]
    fn hash_is_keccak_of_packed_encoding() {
        let ticket = sample_ticket();
        assert_eq!(ticket.hash(), keccak256(ticket.encode_packed()));
        assert_eq!(ticket.hash(), sample_ticket().hash());
    }

    #[test]
    fn hash_changes_with_every_field() {
        let base = sample_ticket();
        let mutations: Vec<Box<dyn Fn(&mut Ticket)>> = vec![
            Box::new(|t| t.sender = Address::repeat_byte(0x12)),
            Box::new(|t| t.receiver = Address::repeat_byte(0x23)),
            Box::new(|t| t.face_value += U256::from(1u64)),
            Box::new(|t| t.win_prob -= U256::from(1u64)),
            Box::new(|t| t.expiration_block += 1),
            Box::new(|t| t.sender_commit = B256::repeat_byte(0x34)),
            Box::new(|t| t.receiver_commit = B256::repeat_byte(0x45)),
            Box::new(|t| t.sender_nonce += 1),
        ];

        for mutate in mutations {
            let mut mutated = base.clone();
            mutate(&mut mutated);
            assert_ne!(mutated.hash(), base.hash());
        }
    }

    #[test]
    fn expiry() {
        let mut ticket = sample_ticket();
        assert!(!ticket.is_expired_at(77));
        assert!(ticket.is_expired_at(78));
        assert_eq!(
            ticket.check_expiry(100),
            Err(Error::TicketExpired {
                expiration_block: 77,
                current_block: 100
            })
        );

        ticket.expiration_block = 0;
        assert!(!ticket.is_expired_at(u64::MAX));
    }

    #[test]
    fn builder_requires_commitments_and_parties() {
        let sender = Address::repeat_byte(1);
        let receiver = Address::repeat_byte(2);

        let err = TicketBuilder::new(sender, receiver)
            .sender_commit(B256::repeat_byte(3))
            .build()
            .unwrap_err();
        assert_eq!(err, Error::InvalidTicket("missing receiver commitment"));

        let err = TicketBuilder::new(Address::ZERO, receiver)
            .sender_commit(B256::repeat_byte(3))
            .receiver_commit(B256::repeat_byte(4))
            .build()
            .unwrap_err();
        assert_eq!(err, Error::InvalidTicket("sender is the zero address"));
    }

    #[test]
    fn builder_applies_defaults() {
        let defaults = TicketDefaults {
            face_value: U256::from(50u64),
            win_prob: U256::from(1u64) << 255,
            ticket_lifetime: 20,
        };
        let ticket = TicketBuilder::with_defaults(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            &defaults,
            100,
        )
        .sender_commit(B256::repeat_byte(3))
        .receiver_commit(B256::repeat_byte(4))
        .sender_nonce(9)
        .build()
        .unwrap();

        assert_eq!(ticket.face_value, U256::from(50u64));
        assert_eq!(ticket.win_prob, U256::from(1u64) << 255);
        assert_eq!(ticket.expiration_block, 120);
        assert_eq!(ticket.sender_nonce, 9);

        let ticket = TicketBuilder::with_defaults(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            &defaults,
            100,
        )
        .face_value(U256::from(7u64))
        .expiration_block(0)
        .sender_commit(B256::repeat_byte(3))
        .receiver_commit(B256::repeat_byte(4))
        .build()
        .unwrap();
        assert_eq!(ticket.face_value, U256::from(7u64));
        assert_eq!(ticket.expiration_block, 0);
    }
}
