use alloy_primitives::{Address, B256, U256};

use crate::{
    commitment::{Commitment, RandomValue},
    config::TicketDefaults,
    deposit::DepositInfo,
    errors::Error,
    ledger::{Ledger, RedemptionOutcome},
    outcome::SignedTicket,
    signing::TicketSigner,
    stake::StakeInfo,
    ticket::{Ticket, TicketBuilder},
};

use std::sync::atomic::{AtomicU32, Ordering};

/// The result of asking the ledger to redeem a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    /// This submission redeemed the ticket.
    Redeemed(RedemptionOutcome),

    /// The ticket had already been redeemed, probably by an earlier
    /// delivery of the same submission.
    AlreadyRedeemed,
}

/// A thin wrapper pairing a ticket signer with a ledger.
///
/// The client acts for the signer's account in every ledger operation. It
/// holds no state besides a nonce counter, which is atomic so that tickets
/// can be built and signed from many threads at once.
#[derive(Debug)]
pub struct Client<L, S> {
    ledger: L,
    signer: S,
    defaults: TicketDefaults,
    next_nonce: AtomicU32,
}

impl<L: Ledger, S: TicketSigner> Client<L, S> {
    pub fn new(ledger: L, signer: S) -> Client<L, S> {
        Client::with_defaults(ledger, signer, TicketDefaults::default())
    }

    pub fn with_defaults(ledger: L, signer: S, defaults: TicketDefaults) -> Client<L, S> {
        Client {
            ledger,
            signer,
            defaults,
            next_nonce: AtomicU32::new(0),
        }
    }

    /// The account this client acts for.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Start a new ticket from this client to `receiver`, pre-filled with
    /// the configured defaults, the sender's commitment, and a fresh nonce.
    ///
    /// `receiver_commit` must come from the receiver; the sender must never
    /// see the value behind it.
    pub fn ticket_builder(
        &self,
        receiver: Address,
        sender_commit: B256,
        receiver_commit: B256,
    ) -> TicketBuilder {
        let nonce = self.next_nonce.fetch_add(1, Ordering::Relaxed);
        TicketBuilder::with_defaults(
            self.address(),
            receiver,
            &self.defaults,
            self.ledger.block_number(),
        )
        .sender_commit(sender_commit)
        .receiver_commit(receiver_commit)
        .sender_nonce(nonce)
    }

    /// Build and sign a ticket paying `receiver` with the default
    /// face value and win probability.
    pub fn create_ticket(
        &self,
        receiver: Address,
        sender_commitment: &Commitment,
        receiver_commit: B256,
    ) -> Result<SignedTicket, Error> {
        let ticket = self
            .ticket_builder(receiver, sender_commitment.hash(), receiver_commit)
            .build()?;
        self.sign_ticket(ticket)
    }

    pub fn sign_ticket(&self, ticket: Ticket) -> Result<SignedTicket, Error> {
        let signed = SignedTicket::sign(ticket, &self.signer)?;
        tracing::debug!(
            ticket_hash = %signed.hash(),
            receiver = %signed.ticket.receiver,
            nonce = signed.ticket.sender_nonce,
            "signed ticket"
        );
        Ok(signed)
    }

    /// Check a ticket received from a sender before accepting it as payment:
    /// it must be addressed to us, carry our commitment, and be validly
    /// signed by its sender.
    pub fn accept_ticket(
        &self,
        signed: &SignedTicket,
        receiver_commitment: &Commitment,
    ) -> Result<(), Error> {
        signed.ticket.validate()?;
        if signed.ticket.receiver != self.address() {
            return Err(Error::InvalidTicket("ticket is addressed to another receiver"));
        }
        if signed.ticket.receiver_commit != receiver_commitment.hash() {
            return Err(Error::InvalidTicket(
                "ticket does not carry the receiver's commitment",
            ));
        }
        signed.ticket.check_expiry(self.ledger.block_number())?;
        signed.verify_signature()
    }

    /// Submit a ticket for redemption. A ticket which was already redeemed
    /// is reported as [`Redemption::AlreadyRedeemed`] rather than an error,
    /// so retransmissions are harmless.
    pub fn redeem(
        &self,
        signed: &SignedTicket,
        sender_random: &RandomValue,
        receiver_random: &RandomValue,
    ) -> Result<Redemption, Error> {
        match self
            .ledger
            .submit_redemption(signed, sender_random, receiver_random)
        {
            Ok(outcome) => Ok(Redemption::Redeemed(outcome)),
            Err(e) if e.is_benign() => {
                tracing::debug!(ticket_hash = %signed.hash(), "ticket was already redeemed");
                Ok(Redemption::AlreadyRedeemed)
            }
            Err(e) => Err(e),
        }
    }

    pub fn deposit(&self) -> DepositInfo {
        self.ledger.query_deposit(self.address())
    }

    pub fn stake(&self, stakee: Address) -> StakeInfo {
        self.ledger.query_stake(self.address(), stakee)
    }

    /// Stake actively locked on this client's account by all of its stakers.
    pub fn staked_on_me(&self) -> U256 {
        self.ledger.total_stake(self.address())
    }

    pub fn deposit_escrow(&self, amount: U256) -> Result<(), Error> {
        self.ledger
            .deposit_escrow(self.address(), amount, self.address())
    }

    pub fn deposit_penalty(&self, amount: U256) -> Result<(), Error> {
        self.ledger
            .deposit_penalty(self.address(), amount, self.address())
    }

    pub fn unlock_deposits(&self) -> Result<u64, Error> {
        self.ledger.request_unlock_deposit(self.address())
    }

    pub fn lock_deposits(&self) -> Result<(), Error> {
        self.ledger.lock_deposit(self.address())
    }

    pub fn withdraw(&self) -> Result<U256, Error> {
        self.ledger.withdraw_deposit(self.address())
    }

    pub fn withdraw_to(&self, to: Address) -> Result<U256, Error> {
        self.ledger.withdraw_deposit_to(self.address(), to)
    }

    pub fn add_stake(&self, amount: U256, stakee: Address) -> Result<(), Error> {
        self.ledger.add_stake(self.address(), amount, stakee)
    }

    pub fn unlock_stake(&self, amount: U256, stakee: Address) -> Result<u64, Error> {
        self.ledger
            .request_unlock_stake(self.address(), amount, stakee)
    }

    pub fn cancel_unlocking(&self, amount: U256, stakee: Address) -> Result<(), Error> {
        self.ledger
            .cancel_unlock_stake(self.address(), amount, stakee)
    }

    pub fn withdraw_stake(&self, stakee: Address) -> Result<U256, Error> {
        self.ledger.withdraw_stake(self.address(), stakee)
    }
}
