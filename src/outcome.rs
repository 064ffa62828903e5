//! Deterministic evaluation of whether a ticket wins.

use alloy_primitives::{aliases::U512, keccak256, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    commitment::{self, RandomValue},
    consts::{ALWAYS_WIN, RANDOM_VALUE_SIZE, SIGNATURE_SIZE},
    errors::{Error, Party},
    signing::{self, Signature, TicketSigner},
    ticket::Ticket,
};

/// A ticket together with the sender's signature over its hash. This is what
/// the sender hands to the receiver, and what the receiver later redeems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTicket {
    pub ticket: Ticket,
    pub signature: Signature,
}

impl SignedTicket {
    /// Sign a ticket. The signer must control the ticket's sender account.
    pub fn sign<S: TicketSigner + ?Sized>(
        ticket: Ticket,
        signer: &S,
    ) -> Result<SignedTicket, Error> {
        if signer.address() != ticket.sender {
            return Err(Error::InvalidTicket(
                "signer does not control the sender account",
            ));
        }
        let signature = signer.sign_hash(&ticket.hash());
        Ok(SignedTicket { ticket, signature })
    }

    pub fn hash(&self) -> B256 {
        self.ticket.hash()
    }

    /// Check that the signature over the ticket hash recovers the sender.
    /// Receivers should do this before accepting a ticket as payment.
    pub fn verify_signature(&self) -> Result<(), Error> {
        signing::verify(&self.hash(), &self.signature, self.ticket.sender)
    }
}

/// Compute the value which decides a ticket's outcome:
///
/// ```not_rust
/// uint256(keccak256(signature || sender_random || receiver_random || ticket_hash))
/// ```
pub fn outcome_value(
    ticket_hash: &B256,
    signature: &Signature,
    sender_random: &RandomValue,
    receiver_random: &RandomValue,
) -> U256 {
    let mut preimage = [0u8; SIGNATURE_SIZE + 2 * RANDOM_VALUE_SIZE + 32];
    let (sig_part, rest) = preimage.split_at_mut(SIGNATURE_SIZE);
    let (sender_part, rest) = rest.split_at_mut(RANDOM_VALUE_SIZE);
    let (receiver_part, hash_part) = rest.split_at_mut(RANDOM_VALUE_SIZE);
    sig_part.copy_from_slice(signature.as_bytes());
    sender_part.copy_from_slice(sender_random);
    receiver_part.copy_from_slice(receiver_random);
    hash_part.copy_from_slice(ticket_hash.as_slice());

    U256::from_be_bytes(keccak256(preimage).0)
}

/// Returns true if an outcome value wins under the given win probability.
///
/// Ties lose, except at [`ALWAYS_WIN`] which wins unconditionally.
pub fn is_winning(outcome: U256, win_prob: U256) -> bool {
    win_prob == ALWAYS_WIN || outcome < win_prob
}

/// Verify both parties' revealed random values against the commitments in
/// the ticket, then decide whether the ticket wins.
///
/// This does not check the signature, expiry, or replay status; the ledger
/// does those before calling this.
pub fn evaluate(
    signed: &SignedTicket,
    sender_random: &RandomValue,
    receiver_random: &RandomValue,
) -> Result<bool, Error> {
    let ticket = &signed.ticket;
    commitment::verify_reveal(Party::Sender, sender_random, &ticket.sender_commit)?;
    commitment::verify_reveal(Party::Receiver, receiver_random, &ticket.receiver_commit)?;

    let outcome = outcome_value(
        &signed.hash(),
        &signed.signature,
        sender_random,
        receiver_random,
    );
    Ok(is_winning(outcome, ticket.win_prob))
}

/// The expected value of a ticket: `face_value * win_prob / 2^256`,
/// rounded down.
pub fn expected_payout(face_value: U256, win_prob: U256) -> U256 {
    if win_prob == ALWAYS_WIN {
        return face_value;
    }
    let product: U512 = face_value.widening_mul(win_prob);
    (product >> 256usize).to::<U256>()
}

/// The win probability which makes a ticket of `face_value` worth
/// `expected_value` on average, saturating at [`ALWAYS_WIN`].
pub fn win_prob_for_expected_value(expected_value: U256, face_value: U256) -> U256 {
    if face_value.is_zero() || expected_value >= face_value {
        return ALWAYS_WIN;
    }
    // expected_value < face_value, so the quotient fits in 256 bits.
    let quotient = (U512::from(expected_value) << 256usize) / U512::from(face_value);
    quotient.to::<U256>()
}
