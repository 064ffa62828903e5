//! This module contains the commit-reveal scheme used to fix each party's
//! ticket randomness before either random value is revealed.
//!
//! Each party generates a 32 byte random value and publishes only its
//! keccak256 hash. The hashes are embedded in the ticket, and the ticket
//! signature binds the sender to both of them, so neither side can pick its
//! random value after seeing the other's.

use alloy_primitives::{keccak256, B256};
use serde::{Deserialize, Serialize};

use crate::{consts::RANDOM_VALUE_SIZE, errors::Party, serialization, Error};

/// A handy type-alias for a party's secret ticket randomness.
///
/// The value is interpreted as a big-endian `uint256` by the ledger, so
/// hashing the raw bytes is identical to hashing the integer.
pub type RandomValue = [u8; RANDOM_VALUE_SIZE];

/// Generate a random [`RandomValue`] from a secure RNG.
pub fn random_value<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> RandomValue {
    let mut value = [0u8; RANDOM_VALUE_SIZE];
    rng.fill_bytes(&mut value);
    value
}

/// Parse a random value from a hex string, with or without a `0x` prefix.
pub fn random_value_from_hex(s: &str) -> Result<RandomValue, hex::FromHexError> {
    let mut value = [0u8; RANDOM_VALUE_SIZE];
    hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut value)?;
    Ok(value)
}

/// Compute the commitment hash of a random value.
pub fn commit(value: &RandomValue) -> B256 {
    keccak256(value)
}

/// Returns true if `value` is the preimage of `commitment`.
pub fn is_valid_reveal(value: &RandomValue, commitment: &B256) -> bool {
    &commit(value) == commitment
}

/// Check a revealed random value against the commitment a party published
/// in a ticket.
pub fn verify_reveal(party: Party, value: &RandomValue, commitment: &B256) -> Result<(), Error> {
    if is_valid_reveal(value, commitment) {
        Ok(())
    } else {
        Err(Error::CommitmentMismatch(party))
    }
}

/// A secret random value together with its public commitment hash.
///
/// The generating party keeps this until redemption time. Only
/// [`Commitment::hash`] should be shared before then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    #[serde(with = "serialization::byte_array")]
    value: RandomValue,
    hash: B256,
}

impl Commitment {
    /// Generate a fresh commitment from a secure RNG.
    pub fn random<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> Commitment {
        Commitment::from_value(random_value(rng))
    }

    /// Build a commitment around a known random value.
    pub fn from_value(value: RandomValue) -> Commitment {
        Commitment {
            hash: commit(&value),
            value,
        }
    }

    /// The secret value, to be revealed only at redemption.
    pub fn value(&self) -> &RandomValue {
        &self.value
    }

    /// The public commitment hash, embedded in tickets.
    pub fn hash(&self) -> B256 {
        self.hash
    }
}
