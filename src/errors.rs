use alloy_primitives::U256;

use std::fmt;

/// Identifies which side of a ticket a commitment or random value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Party {
    Sender,
    Receiver,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Party::Sender => f.write_str("sender"),
            Party::Receiver => f.write_str("receiver"),
        }
    }
}

/// Every way a ticketing or ledger operation can fail.
///
/// None of these are retried internally. [`Error::TicketAlreadyRedeemed`] is
/// the only variant which callers should normally treat as benign, since it
/// is the expected result of resubmitting a ticket which already went through.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("ticket expired at block {expiration_block}, current block is {current_block}")]
    TicketExpired {
        expiration_block: u64,
        current_block: u64,
    },

    #[error("ticket already redeemed")]
    TicketAlreadyRedeemed,

    #[error("commitment mismatch: hash of {0} random value does not match its commitment")]
    CommitmentMismatch(Party),

    #[error("insufficient escrow: ticket face value {face_value} exceeds escrow {escrow}")]
    InsufficientEscrow { face_value: U256, escrow: U256 },

    #[error("unlock period not complete: deposits unlock at block {unlock_at}")]
    UnlockPeriodNotComplete { unlock_at: u64 },

    #[error("no amount to unlock")]
    NothingToUnlock,

    #[error("stake not yet unlocked: stake unlocks at block {unlock_at}")]
    StakeNotYetUnlocked { unlock_at: u64 },

    #[error("invalid ticket: {0}")]
    InvalidTicket(&'static str),

    #[error("deposits not unlocked")]
    DepositsNotUnlocked,

    #[error("unlocking already in process")]
    UnlockingInProcess,

    #[error("deposits are not unlocking, cannot lock")]
    NotUnlocking,

    #[error("insufficient stake: requested {requested}, available {available}")]
    InsufficientStake { requested: U256, available: U256 },

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: U256, available: U256 },

    #[error("amount cannot be zero")]
    ZeroAmount,

    #[error("account cannot be the zero address")]
    ZeroAddress,

    #[error("invalid secret key hex: {0}")]
    InvalidKeyHex(#[from] hex::FromHexError),

    #[error("invalid secret key: {0}")]
    InvalidKey(secp256k1::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

// `hex::FromHexError` only derives `PartialEq`, but its equality is total.
impl Eq for Error {}

impl Error {
    /// Returns true if the error is an expected outcome under at-least-once
    /// delivery, rather than a hard failure requiring a new ticket or
    /// corrected state.
    pub fn is_benign(&self) -> bool {
        matches!(self, Error::TicketAlreadyRedeemed)
    }
}

impl From<secp256k1::Error> for Error {
    fn from(_: secp256k1::Error) -> Self {
        Error::InvalidSignature
    }
}
