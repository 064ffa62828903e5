//! The escrow and penalty deposit backing a sender's tickets, and the
//! lock/unlock state machine governing its withdrawal.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// An account's ticketing deposit, as recorded by the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositInfo {
    /// Funds which pay out winning tickets.
    pub escrow: U256,

    /// Funds held against sender misbehaviour.
    pub penalty: U256,

    /// The block at which an in-progress unlock matures. Zero while locked.
    pub unlock_at: u64,
}

/// Where a deposit is in its lock/unlock lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepositState {
    /// The default state. Funds back tickets and cannot be withdrawn.
    Locked,

    /// An unlock was requested but has not matured yet. Funds still back
    /// tickets, so receivers holding unredeemed tickets have until
    /// `unlock_at` to redeem them.
    Unlocking { unlock_at: u64 },

    /// The unlock period has passed; the deposit can be withdrawn.
    Withdrawable,
}

impl DepositInfo {
    /// The sum of escrow and penalty.
    pub fn total(&self) -> U256 {
        self.escrow.saturating_add(self.penalty)
    }

    pub fn state(&self, current_block: u64) -> DepositState {
        match self.unlock_at {
            0 => DepositState::Locked,
            unlock_at if current_block < unlock_at => DepositState::Unlocking { unlock_at },
            _ => DepositState::Withdrawable,
        }
    }

    /// Add funds to escrow. Depositing returns an unlocking deposit to the
    /// locked state.
    pub fn add_escrow(&mut self, amount: U256) -> Result<(), Error> {
        if amount.is_zero() {
            return Err(Error::ZeroAmount);
        }
        self.escrow = self.escrow.saturating_add(amount);
        self.unlock_at = 0;
        Ok(())
    }

    /// Add funds to the penalty deposit. Like [`DepositInfo::add_escrow`],
    /// this relocks the deposit.
    pub fn add_penalty(&mut self, amount: U256) -> Result<(), Error> {
        if amount.is_zero() {
            return Err(Error::ZeroAmount);
        }
        self.penalty = self.penalty.saturating_add(amount);
        self.unlock_at = 0;
        Ok(())
    }

    /// Begin unlocking, returning the block at which the deposit becomes
    /// withdrawable.
    pub fn unlock(&mut self, current_block: u64, unlock_duration: u64) -> Result<u64, Error> {
        if self.total().is_zero() {
            return Err(Error::NothingToUnlock);
        }
        if self.unlock_at != 0 {
            return Err(Error::UnlockingInProcess);
        }
        // Zero means locked, so an unlock can never mature at block zero.
        self.unlock_at = current_block.saturating_add(unlock_duration).max(1);
        Ok(self.unlock_at)
    }

    /// Cancel an in-progress unlock.
    pub fn lock(&mut self) -> Result<(), Error> {
        if self.unlock_at == 0 {
            return Err(Error::NotUnlocking);
        }
        self.unlock_at = 0;
        Ok(())
    }

    /// Empty the deposit, returning the total amount to pay out.
    pub fn withdraw(&mut self, current_block: u64) -> Result<U256, Error> {
        match self.state(current_block) {
            DepositState::Locked => Err(Error::DepositsNotUnlocked),
            DepositState::Unlocking { unlock_at } => {
                Err(Error::UnlockPeriodNotComplete { unlock_at })
            }
            DepositState::Withdrawable => {
                let amount = self.total();
                *self = DepositInfo::default();
                Ok(amount)
            }
        }
    }

    /// Pay out a winning ticket's face value from escrow.
    pub fn spend_escrow(&mut self, face_value: U256) -> Result<(), Error> {
        if face_value > self.escrow {
            return Err(Error::InsufficientEscrow {
                face_value,
                escrow: self.escrow,
            });
        }
        self.escrow -= face_value;
        Ok(())
    }
}
