use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    commitment::RandomValue, deposit::DepositInfo, errors::Error, outcome::SignedTicket,
    stake::StakeInfo,
};

use std::sync::Arc;

/// The result of a successful redemption. Either way the ticket is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedemptionOutcome {
    /// The ticket won, and `amount` moved from sender escrow to the receiver.
    Won { amount: U256 },

    /// The ticket lost. No value moved.
    Lost,
}

impl RedemptionOutcome {
    pub fn is_win(&self) -> bool {
        matches!(self, RedemptionOutcome::Won { .. })
    }
}

/// The authoritative, externally sequenced record of deposits, stakes, and
/// redeemed tickets.
///
/// Every method is a single atomic state transition. Callers submit intents;
/// they never mutate balances directly. Any submission may be rejected
/// because it lost a race against another submission, for instance the same
/// ticket redeemed twice from two processes. That rejection is a normal
/// outcome, not a fault.
///
/// `caller` arguments identify the account on whose behalf an operation runs,
/// the way a transaction's signer would on-chain.
pub trait Ledger {
    /// The current block height.
    fn block_number(&self) -> u64;

    /// Returns true if the ticket hash is in the replay guard.
    fn is_redeemed(&self, ticket_hash: &B256) -> bool;

    /// Submit a signed ticket and both revealed random values for redemption.
    fn submit_redemption(
        &self,
        signed: &SignedTicket,
        sender_random: &RandomValue,
        receiver_random: &RandomValue,
    ) -> Result<RedemptionOutcome, Error>;

    fn query_deposit(&self, account: Address) -> DepositInfo;

    fn query_stake(&self, staker: Address, stakee: Address) -> StakeInfo;

    /// Stake actively locked on `stakee` across all of its stakers. Stake
    /// which is unlocking does not count.
    fn total_stake(&self, stakee: Address) -> U256;

    /// Stake actively locked across every stakee.
    fn total_stake_all(&self) -> U256;

    /// Accounts holding a stake position on `stakee`, in the order they
    /// first staked.
    fn stakers(&self, stakee: Address) -> Vec<Address>;

    /// How many stakees have at least one stake position.
    fn stakee_count(&self) -> usize;

    /// Move `amount` from the caller's balance into `account`'s escrow.
    fn deposit_escrow(&self, caller: Address, amount: U256, account: Address)
        -> Result<(), Error>;

    /// Move `amount` from the caller's balance into `account`'s penalty deposit.
    fn deposit_penalty(
        &self,
        caller: Address,
        amount: U256,
        account: Address,
    ) -> Result<(), Error>;

    /// Begin unlocking the account's deposit, returning the block at which it
    /// becomes withdrawable.
    fn request_unlock_deposit(&self, account: Address) -> Result<u64, Error>;

    /// Cancel an in-progress deposit unlock.
    fn lock_deposit(&self, account: Address) -> Result<(), Error>;

    /// Withdraw a fully unlocked deposit to the account's own balance.
    fn withdraw_deposit(&self, account: Address) -> Result<U256, Error> {
        self.withdraw_deposit_to(account, account)
    }

    /// Withdraw a fully unlocked deposit to another account's balance.
    fn withdraw_deposit_to(&self, account: Address, to: Address) -> Result<U256, Error>;

    fn add_stake(&self, staker: Address, amount: U256, stakee: Address) -> Result<(), Error>;

    /// Begin releasing `amount` of stake, returning the block at which the
    /// whole unlocking amount becomes withdrawable.
    fn request_unlock_stake(
        &self,
        staker: Address,
        amount: U256,
        stakee: Address,
    ) -> Result<u64, Error>;

    fn cancel_unlock_stake(
        &self,
        staker: Address,
        amount: U256,
        stakee: Address,
    ) -> Result<(), Error>;

    fn withdraw_stake(&self, staker: Address, stakee: Address) -> Result<U256, Error>;
}

macro_rules! forward_ledger {
    ($($wrapper:ty),*) => {$(
        impl<L: Ledger + ?Sized> Ledger for $wrapper {
            fn block_number(&self) -> u64 {
                (**self).block_number()
            }
            fn is_redeemed(&self, ticket_hash: &B256) -> bool {
                (**self).is_redeemed(ticket_hash)
            }
            fn submit_redemption(
                &self,
                signed: &SignedTicket,
                sender_random: &RandomValue,
                receiver_random: &RandomValue,
            ) -> Result<RedemptionOutcome, Error> {
                (**self).submit_redemption(signed, sender_random, receiver_random)
            }
            fn query_deposit(&self, account: Address) -> DepositInfo {
                (**self).query_deposit(account)
            }
            fn query_stake(&self, staker: Address, stakee: Address) -> StakeInfo {
                (**self).query_stake(staker, stakee)
            }
            fn total_stake(&self, stakee: Address) -> U256 {
                (**self).total_stake(stakee)
            }
            fn total_stake_all(&self) -> U256 {
                (**self).total_stake_all()
            }
            fn stakers(&self, stakee: Address) -> Vec<Address> {
                (**self).stakers(stakee)
            }
            fn stakee_count(&self) -> usize {
                (**self).stakee_count()
            }
            fn deposit_escrow(&self, caller: Address, amount: U256, account: Address) -> Result<(), Error> {
                (**self).deposit_escrow(caller, amount, account)
            }
            fn deposit_penalty(&self, caller: Address, amount: U256, account: Address) -> Result<(), Error> {
                (**self).deposit_penalty(caller, amount, account)
            }
            fn request_unlock_deposit(&self, account: Address) -> Result<u64, Error> {
                (**self).request_unlock_deposit(account)
            }
            fn lock_deposit(&self, account: Address) -> Result<(), Error> {
                (**self).lock_deposit(account)
            }
            fn withdraw_deposit_to(&self, account: Address, to: Address) -> Result<U256, Error> {
                (**self).withdraw_deposit_to(account, to)
            }
            fn add_stake(&self, staker: Address, amount: U256, stakee: Address) -> Result<(), Error> {
                (**self).add_stake(staker, amount, stakee)
            }
            fn request_unlock_stake(&self, staker: Address, amount: U256, stakee: Address) -> Result<u64, Error> {
                (**self).request_unlock_stake(staker, amount, stakee)
            }
            fn cancel_unlock_stake(&self, staker: Address, amount: U256, stakee: Address) -> Result<(), Error> {
                (**self).cancel_unlock_stake(staker, amount, stakee)
            }
            fn withdraw_stake(&self, staker: Address, stakee: Address) -> Result<U256, Error> {
                (**self).withdraw_stake(staker, stakee)
            }
        }
    )*};
}

forward_ledger!(&L, Arc<L>);
