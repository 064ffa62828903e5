//! An in-process reference ledger.
//!
//! [`MemoryLedger`] implements the ledger semantics the ticketing protocol
//! relies on: token balances, deposits with delayed unlocking, stakes, and a
//! permanent replay guard of redeemed ticket hashes. All state sits behind a
//! single mutex, so the ledger totally orders every operation the way a
//! blockchain would. It is meant for tests, simulations and demos.

use alloy_primitives::{Address, B256, U256};

use crate::{
    commitment::RandomValue,
    config::LedgerParams,
    deposit::DepositInfo,
    errors::Error,
    ledger::{Ledger, RedemptionOutcome},
    outcome::{self, SignedTicket},
    signing,
    stake::StakeInfo,
};

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

#[derive(Debug, Default)]
struct LedgerState {
    block_number: u64,
    balances: HashMap<Address, U256>,
    deposits: HashMap<Address, DepositInfo>,
    stakes: HashMap<(Address, Address), StakeInfo>,
    /// Stakers with a live position on each stakee, in the order they
    /// first staked.
    stakers: HashMap<Address, Vec<Address>>,
    /// Actively locked stake per stakee. Unlocking stake is not counted.
    stakee_totals: HashMap<Address, U256>,
    total_stake: U256,
    used_tickets: HashSet<B256>,
}

impl LedgerState {
    fn debit(&mut self, account: Address, amount: U256) -> Result<(), Error> {
        let available = self.balances.get(&account).copied().unwrap_or_default();
        if amount > available {
            return Err(Error::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        self.balances.insert(account, available - amount);
        Ok(())
    }

    fn credit(&mut self, account: Address, amount: U256) {
        let balance = self.balances.entry(account).or_default();
        *balance = balance.saturating_add(amount);
    }

    fn stake_mut(&mut self, staker: Address, stakee: Address) -> Result<&mut StakeInfo, Error> {
        self.stakes
            .get_mut(&(staker, stakee))
            .ok_or(Error::NothingToUnlock)
    }

    fn raise_stake_total(&mut self, stakee: Address, amount: U256) {
        let total = self.stakee_totals.entry(stakee).or_default();
        *total = total.saturating_add(amount);
        self.total_stake = self.total_stake.saturating_add(amount);
    }

    fn lower_stake_total(&mut self, stakee: Address, amount: U256) {
        if let Some(total) = self.stakee_totals.get_mut(&stakee) {
            *total = total.saturating_sub(amount);
            if total.is_zero() {
                self.stakee_totals.remove(&stakee);
            }
        }
        self.total_stake = self.total_stake.saturating_sub(amount);
    }

    /// Forget a stake position once nothing is staked or unlocking.
    fn prune_stake(&mut self, staker: Address, stakee: Address) {
        let empty = self
            .stakes
            .get(&(staker, stakee))
            .is_some_and(|stake| *stake == StakeInfo::default());
        if !empty {
            return;
        }
        self.stakes.remove(&(staker, stakee));
        if let Some(stakers) = self.stakers.get_mut(&stakee) {
            stakers.retain(|s| *s != staker);
            if stakers.is_empty() {
                self.stakers.remove(&stakee);
            }
        }
    }

    /// Run every redemption check, in order, returning whether the ticket
    /// wins. Replays are rejected before expiry, and expiry before any of
    /// the revealed randomness is looked at.
    fn check_redemption(
        &self,
        signed: &SignedTicket,
        ticket_hash: &B256,
        sender_random: &RandomValue,
        receiver_random: &RandomValue,
    ) -> Result<bool, Error> {
        let ticket = &signed.ticket;
        ticket.validate()?;
        if self.used_tickets.contains(ticket_hash) {
            return Err(Error::TicketAlreadyRedeemed);
        }
        ticket.check_expiry(self.block_number)?;

        let wins = outcome::evaluate(signed, sender_random, receiver_random)?;
        signing::verify(ticket_hash, &signed.signature, ticket.sender)?;

        let escrow = self
            .deposits
            .get(&ticket.sender)
            .map(|deposit| deposit.escrow)
            .unwrap_or_default();
        if ticket.face_value > escrow {
            return Err(Error::InsufficientEscrow {
                face_value: ticket.face_value,
                escrow,
            });
        }
        Ok(wins)
    }
}

/// See the [module documentation](self).
#[derive(Debug)]
pub struct MemoryLedger {
    params: LedgerParams,
    state: Mutex<LedgerState>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        MemoryLedger::new(LedgerParams::default())
    }
}

impl MemoryLedger {
    pub fn new(params: LedgerParams) -> MemoryLedger {
        MemoryLedger {
            params,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        // No method leaves the state half-updated across a panic, so a
        // poisoned lock is still safe to use.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mine `n` empty blocks.
    pub fn advance_blocks(&self, n: u64) -> u64 {
        let mut state = self.state();
        state.block_number = state.block_number.saturating_add(n);
        state.block_number
    }

    /// Create `amount` of new tokens in `account`'s balance.
    pub fn mint(&self, account: Address, amount: U256) {
        self.state().credit(account, amount);
    }

    /// The account's spendable token balance, outside of any deposit or stake.
    pub fn balance_of(&self, account: Address) -> U256 {
        self.state()
            .balances
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    fn deposit_with(
        &self,
        caller: Address,
        amount: U256,
        account: Address,
        add: impl FnOnce(&mut DepositInfo, U256) -> Result<(), Error>,
    ) -> Result<DepositInfo, Error> {
        if account.is_zero() {
            return Err(Error::ZeroAddress);
        }
        if amount.is_zero() {
            return Err(Error::ZeroAmount);
        }

        let mut state = self.state();
        let mut deposit = state.deposits.get(&account).copied().unwrap_or_default();
        add(&mut deposit, amount)?;
        state.debit(caller, amount)?;
        state.deposits.insert(account, deposit);
        Ok(deposit)
    }
}

impl Ledger for MemoryLedger {
    fn block_number(&self) -> u64 {
        self.state().block_number
    }

    fn is_redeemed(&self, ticket_hash: &B256) -> bool {
        self.state().used_tickets.contains(ticket_hash)
    }

    fn submit_redemption(
        &self,
        signed: &SignedTicket,
        sender_random: &RandomValue,
        receiver_random: &RandomValue,
    ) -> Result<RedemptionOutcome, Error> {
        let ticket = &signed.ticket;
        let ticket_hash = signed.hash();
        let mut state = self.state();

        let checked =
            state.check_redemption(signed, &ticket_hash, sender_random, receiver_random);
        let wins = match checked {
            Ok(wins) => wins,
            Err(e) => {
                tracing::warn!(
                    ticket_hash = %ticket_hash,
                    sender = %ticket.sender,
                    receiver = %ticket.receiver,
                    error = %e,
                    "ticket redemption rejected"
                );
                return Err(e);
            }
        };

        if !wins {
            state.used_tickets.insert(ticket_hash);
            tracing::info!(ticket_hash = %ticket_hash, "redeemed losing ticket");
            return Ok(RedemptionOutcome::Lost);
        }

        // A missing deposit passed the escrow check only for a zero face value.
        if let Some(deposit) = state.deposits.get_mut(&ticket.sender) {
            deposit.spend_escrow(ticket.face_value)?;
        }
        state.credit(ticket.receiver, ticket.face_value);
        state.used_tickets.insert(ticket_hash);

        tracing::info!(
            ticket_hash = %ticket_hash,
            sender = %ticket.sender,
            receiver = %ticket.receiver,
            face_value = %ticket.face_value,
            "redeemed winning ticket"
        );
        Ok(RedemptionOutcome::Won {
            amount: ticket.face_value,
        })
    }

    fn query_deposit(&self, account: Address) -> DepositInfo {
        self.state()
            .deposits
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    fn total_stake(&self, stakee: Address) -> U256 {
        self.state()
            .stakee_totals
            .get(&stakee)
            .copied()
            .unwrap_or_default()
    }

    fn total_stake_all(&self) -> U256 {
        self.state().total_stake
    }

    fn stakers(&self, stakee: Address) -> Vec<Address> {
        self.state()
            .stakers
            .get(&stakee)
            .cloned()
            .unwrap_or_default()
    }

    fn stakee_count(&self) -> usize {
        self.state().stakers.len()
    }

    fn query_stake(&self, staker: Address, stakee: Address) -> StakeInfo {
        self.state()
            .stakes
            .get(&(staker, stakee))
            .copied()
            .unwrap_or_default()
    }

    fn deposit_escrow(
        &self,
        caller: Address,
        amount: U256,
        account: Address,
    ) -> Result<(), Error> {
        let deposit = self.deposit_with(caller, amount, account, DepositInfo::add_escrow)?;
        tracing::debug!(%account, %amount, escrow = %deposit.escrow, "escrow deposited");
        Ok(())
    }

    fn deposit_penalty(
        &self,
        caller: Address,
        amount: U256,
        account: Address,
    ) -> Result<(), Error> {
        let deposit = self.deposit_with(caller, amount, account, DepositInfo::add_penalty)?;
        tracing::debug!(%account, %amount, penalty = %deposit.penalty, "penalty deposited");
        Ok(())
    }

    fn request_unlock_deposit(&self, account: Address) -> Result<u64, Error> {
        let mut state = self.state();
        let current_block = state.block_number;
        let unlock_at = state
            .deposits
            .get_mut(&account)
            .ok_or(Error::NothingToUnlock)?
            .unlock(current_block, self.params.deposit_unlock_duration)?;
        tracing::debug!(%account, unlock_at, "deposit unlocking");
        Ok(unlock_at)
    }

    fn lock_deposit(&self, account: Address) -> Result<(), Error> {
        self.state()
            .deposits
            .get_mut(&account)
            .ok_or(Error::NotUnlocking)?
            .lock()?;
        tracing::debug!(%account, "deposit relocked");
        Ok(())
    }

    fn withdraw_deposit_to(&self, account: Address, to: Address) -> Result<U256, Error> {
        if to.is_zero() {
            return Err(Error::ZeroAddress);
        }
        let mut state = self.state();
        let current_block = state.block_number;
        let amount = state
            .deposits
            .get_mut(&account)
            .ok_or(Error::DepositsNotUnlocked)?
            .withdraw(current_block)?;
        state.deposits.remove(&account);
        state.credit(to, amount);
        tracing::debug!(%account, %to, %amount, "deposit withdrawn");
        Ok(amount)
    }

    fn add_stake(&self, staker: Address, amount: U256, stakee: Address) -> Result<(), Error> {
        if stakee.is_zero() {
            return Err(Error::ZeroAddress);
        }
        if amount.is_zero() {
            return Err(Error::ZeroAmount);
        }
        let mut state = self.state();
        let existing = state.stakes.get(&(staker, stakee)).copied();
        let mut stake = existing.unwrap_or_default();
        stake.add(amount)?;
        state.debit(staker, amount)?;
        if existing.is_none() {
            state.stakers.entry(stakee).or_default().push(staker);
        }
        state.stakes.insert((staker, stakee), stake);
        state.raise_stake_total(stakee, amount);
        tracing::debug!(%staker, %stakee, %amount, "stake added");
        Ok(())
    }

    fn request_unlock_stake(
        &self,
        staker: Address,
        amount: U256,
        stakee: Address,
    ) -> Result<u64, Error> {
        let mut state = self.state();
        let current_block = state.block_number;
        let unlock_at = state.stake_mut(staker, stakee)?.unlock(
            amount,
            current_block,
            self.params.stake_unlock_duration,
        )?;
        state.lower_stake_total(stakee, amount);
        tracing::debug!(%staker, %stakee, %amount, unlock_at, "stake unlocking");
        Ok(unlock_at)
    }

    fn cancel_unlock_stake(
        &self,
        staker: Address,
        amount: U256,
        stakee: Address,
    ) -> Result<(), Error> {
        let mut state = self.state();
        state.stake_mut(staker, stakee)?.cancel_unlocking(amount)?;
        state.raise_stake_total(stakee, amount);
        tracing::debug!(%staker, %stakee, %amount, "stake unlocking cancelled");
        Ok(())
    }

    fn withdraw_stake(&self, staker: Address, stakee: Address) -> Result<U256, Error> {
        let mut state = self.state();
        let current_block = state.block_number;
        let amount = state.stake_mut(staker, stakee)?.withdraw(current_block)?;
        state.prune_stake(staker, stakee);
        state.credit(staker, amount);
        tracing::debug!(%staker, %stakee, %amount, "stake withdrawn");
        Ok(amount)
    }
}
