//! Stake held by a staker on behalf of a stakee, and its
//! stake/unlock/cancel/withdraw state machine.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Stake which is being released, and the block at which it can be
/// withdrawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unlocking {
    pub amount: U256,
    pub unlock_at: u64,
}

/// A staker's position with one stakee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeInfo {
    /// Stake which is actively locked.
    pub amount: U256,

    /// Stake in the process of being released.
    pub unlocking: Unlocking,
}

/// Where the unlocking portion of a stake is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StakeState {
    /// Nothing is being released.
    Staked,

    /// Some stake is being released, but not yet withdrawable.
    Unlocking { unlock_at: u64 },

    /// The released stake can be withdrawn.
    Withdrawable,
}

impl StakeInfo {
    pub fn state(&self, current_block: u64) -> StakeState {
        if self.unlocking.amount.is_zero() {
            StakeState::Staked
        } else if current_block < self.unlocking.unlock_at {
            StakeState::Unlocking {
                unlock_at: self.unlocking.unlock_at,
            }
        } else {
            StakeState::Withdrawable
        }
    }

    pub fn add(&mut self, amount: U256) -> Result<(), Error> {
        if amount.is_zero() {
            return Err(Error::ZeroAmount);
        }
        self.amount = self.amount.saturating_add(amount);
        Ok(())
    }

    /// Move `amount` of active stake into the unlocking record. Every unlock
    /// request restarts the unlock period for the whole unlocking amount.
    pub fn unlock(
        &mut self,
        amount: U256,
        current_block: u64,
        unlock_duration: u64,
    ) -> Result<u64, Error> {
        if self.amount.is_zero() {
            return Err(Error::NothingToUnlock);
        }
        if amount.is_zero() {
            return Err(Error::ZeroAmount);
        }
        if amount > self.amount {
            return Err(Error::InsufficientStake {
                requested: amount,
                available: self.amount,
            });
        }

        self.amount -= amount;
        self.unlocking.amount = self.unlocking.amount.saturating_add(amount);
        self.unlocking.unlock_at = current_block.saturating_add(unlock_duration);
        Ok(self.unlocking.unlock_at)
    }

    /// Return `amount` of unlocking stake to the active stake.
    pub fn cancel_unlocking(&mut self, amount: U256) -> Result<(), Error> {
        if self.unlocking.amount.is_zero() {
            return Err(Error::NothingToUnlock);
        }
        if amount.is_zero() {
            return Err(Error::ZeroAmount);
        }
        if amount > self.unlocking.amount {
            return Err(Error::InsufficientStake {
                requested: amount,
                available: self.unlocking.amount,
            });
        }

        self.unlocking.amount -= amount;
        self.amount = self.amount.saturating_add(amount);
        if self.unlocking.amount.is_zero() {
            self.unlocking = Unlocking::default();
        }
        Ok(())
    }

    /// Release the matured unlocking stake, returning the amount to pay out.
    pub fn withdraw(&mut self, current_block: u64) -> Result<U256, Error> {
        match self.state(current_block) {
            StakeState::Staked => Err(Error::NothingToUnlock),
            StakeState::Unlocking { unlock_at } => Err(Error::StakeNotYetUnlocked { unlock_at }),
            StakeState::Withdrawable => {
                let amount = self.unlocking.amount;
                self.unlocking = Unlocking::default();
                Ok(amount)
            }
        }
    }
}
