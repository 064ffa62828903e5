//! Ticketing configuration with TOML file support.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{
    consts::{DEFAULT_DEPOSIT_UNLOCK_DURATION, DEFAULT_STAKE_UNLOCK_DURATION},
    errors::Error,
};

use std::path::Path;

/// Configuration shared by ticket senders, receivers, and the reference ledger.
///
/// Can be loaded from a TOML file via [`TicketingConfig::from_toml_file`] or
/// built programmatically.
///
/// ```toml
/// [ledger]
/// deposit_unlock_duration = 10
/// stake_unlock_duration = 10
///
/// [tickets]
/// face_value = "1000"
/// win_prob = "0x8000000000000000000000000000000000000000000000000000000000000000"
/// ticket_lifetime = 20
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketingConfig {
    #[serde(default)]
    pub ledger: LedgerParams,

    #[serde(default)]
    pub tickets: TicketDefaults,
}

/// Unlock delays enforced by the ledger, in blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerParams {
    #[serde(default = "default_deposit_unlock_duration")]
    pub deposit_unlock_duration: u64,

    #[serde(default = "default_stake_unlock_duration")]
    pub stake_unlock_duration: u64,
}

/// Values used for new tickets unless the sender overrides them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDefaults {
    #[serde(default = "default_face_value")]
    pub face_value: U256,

    #[serde(default = "default_win_prob")]
    pub win_prob: U256,

    /// How many blocks a new ticket stays redeemable. Zero means tickets
    /// never expire.
    #[serde(default = "default_ticket_lifetime")]
    pub ticket_lifetime: u64,
}

fn default_deposit_unlock_duration() -> u64 {
    DEFAULT_DEPOSIT_UNLOCK_DURATION
}

fn default_stake_unlock_duration() -> u64 {
    DEFAULT_STAKE_UNLOCK_DURATION
}

fn default_face_value() -> U256 {
    U256::from(1u64)
}

fn default_win_prob() -> U256 {
    U256::MAX
}

fn default_ticket_lifetime() -> u64 {
    0
}

impl Default for LedgerParams {
    fn default() -> Self {
        LedgerParams {
            deposit_unlock_duration: default_deposit_unlock_duration(),
            stake_unlock_duration: default_stake_unlock_duration(),
        }
    }
}

impl Default for TicketDefaults {
    fn default() -> Self {
        TicketDefaults {
            face_value: default_face_value(),
            win_prob: default_win_prob(),
            ticket_lifetime: default_ticket_lifetime(),
        }
    }
}

impl TicketingConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let config: TicketingConfig =
            toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.ledger.deposit_unlock_duration == 0 {
            return Err(Error::Config(
                "deposit_unlock_duration cannot be zero".to_string(),
            ));
        }
        if self.ledger.stake_unlock_duration == 0 {
            return Err(Error::Config(
                "stake_unlock_duration cannot be zero".to_string(),
            ));
        }
        if self.tickets.face_value.is_zero() {
            return Err(Error::Config("face_value cannot be zero".to_string()));
        }
        Ok(())
    }
}
