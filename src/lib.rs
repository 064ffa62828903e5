//! Probabilistic micropayment tickets.
//!
//! A sender deposits escrow on a [`Ledger`] and pays a receiver with signed
//! lottery tickets instead of individual transfers. Each ticket carries a
//! face value and a win probability. Both parties commit to secret random
//! values up front, and once both values are revealed anyone can evaluate
//! whether the ticket won. Winning tickets are redeemed against the
//! sender's escrow for their full face value, so over many tickets the
//! receiver is paid `face_value * win_prob / 2^256` per ticket in
//! expectation, while the ledger only settles the winners.

mod errors;
mod serialization;

pub mod client;
pub mod commitment;
pub mod config;
pub mod consts;
pub mod deposit;
pub mod ledger;
pub mod memory;
pub mod outcome;
pub mod signing;
pub mod stake;
pub mod ticket;

pub use client::{Client, Redemption};
pub use commitment::{Commitment, RandomValue};
pub use config::{LedgerParams, TicketDefaults, TicketingConfig};
pub use deposit::{DepositInfo, DepositState};
pub use errors::{Error, Party};
pub use ledger::{Ledger, RedemptionOutcome};
pub use memory::MemoryLedger;
pub use outcome::SignedTicket;
pub use signing::{Signature, SigningKey, TicketSigner};
pub use stake::{StakeInfo, StakeState, Unlocking};
pub use ticket::{Ticket, TicketBuilder};

pub use alloy_primitives;
pub use secp256k1;
