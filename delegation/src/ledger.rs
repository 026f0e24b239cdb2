//! The delegation ledger engine.
//!
//! The ledger is the owner of its validator's stake proxy: delegators call
//! the ledger, the ledger forwards funds through the proxy into the
//! registry, and the registry's reward notifications come back through the
//! proxy as [`DelegationLedger::reward_cb`].

use crate::error::DelegationError;
use crate::reward_split::reward_share;
use crate::withdrawal::{PendingWithdrawal, WithdrawalQueue};
use palisade_registry::{Registry, StakeProxy};
use palisade_types::{AccountId, Amount, Epoch, StakingParams};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One delegation entry. A delegator may hold several; entries are never
/// merged, and `stake_amount` / `from_epoch` are fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatedStake {
    pub delegator: AccountId,
    pub stake_amount: Amount,
    pub from_epoch: Epoch,
    pub accrued_reward: Amount,
}

/// The result of a withdrawal request: paid out immediately, or queued
/// behind the validator's locked funds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WithdrawOutcome {
    Paid { amount: Amount },
    Queued { amount: Amount, unlock_epoch: Epoch },
}

impl WithdrawOutcome {
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid { .. })
    }
}

impl fmt::Display for WithdrawOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paid { amount } => write!(f, "paid {amount}"),
            Self::Queued { unlock_epoch, .. } => write!(f, "wait until {unlock_epoch}"),
        }
    }
}

/// Per-validator delegation ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DelegationLedger {
    /// The ledger's own identity — it is the registered owner of `proxy`.
    pub address: AccountId,
    /// The bound stake proxy's identity (reference, not ownership).
    proxy: AccountId,
    delegations: Vec<DelegatedStake>,
    queue: WithdrawalQueue,
    params: StakingParams,
}

impl DelegationLedger {
    pub fn new(address: AccountId, proxy: AccountId, params: StakingParams) -> Self {
        let queue = WithdrawalQueue::new(params.max_withdrawal_queue_len);
        Self {
            address,
            proxy,
            delegations: Vec::new(),
            queue,
            params,
        }
    }

    /// The smallest delegation this ledger accepts, derived from the
    /// registry's validator minimum.
    pub fn minimum_stake_amount(&self, proxy: &StakeProxy, registry: &Registry) -> Amount {
        proxy.validator_min_stake(registry) / 100
            * self.params.min_delegation_threshold_pct as Amount
    }

    // ── Delegator-facing operations ──────────────────────────────────────

    /// Accept `value` from `caller` as a new delegation entry and forward
    /// it to the validator's stake.
    pub fn delegate_stake(
        &mut self,
        caller: &AccountId,
        value: Amount,
        proxy: &StakeProxy,
        registry: &mut Registry,
    ) -> Result<(), DelegationError> {
        debug_assert_eq!(proxy.address, self.proxy);
        if caller == &self.address {
            return Err(DelegationError::SelfDelegation);
        }
        let minimum = self.minimum_stake_amount(proxy, registry);
        if value < minimum {
            return Err(DelegationError::BelowMinimumDelegation {
                needed: minimum,
                got: value,
            });
        }
        if self.delegations.len() >= self.params.max_delegators {
            return Err(DelegationError::TooManyDelegators(self.params.max_delegators));
        }

        proxy.stake(&self.address, value, registry)?;
        self.delegations.push(DelegatedStake {
            delegator: caller.clone(),
            stake_amount: value,
            from_epoch: registry.current_epoch(),
            accrued_reward: 0,
        });
        Ok(())
    }

    /// Split a reward among the delegations that have been staked for at
    /// least `min_delegation_duration` epochs. Accepted only from the
    /// bound proxy.
    ///
    /// Shares are floored; the remainder stays with the validator's
    /// balance and is not redistributed.
    pub fn reward_cb(
        &mut self,
        caller: &AccountId,
        _epoch: Epoch,
        amount: Amount,
        _restaked: bool,
        registry: &Registry,
    ) -> Result<(), DelegationError> {
        if caller != &self.proxy {
            return Err(DelegationError::NotProxy(caller.clone()));
        }
        let now = registry.current_epoch();
        let total_eligible = self.total_eligible_stake_at(now);
        if total_eligible == 0 {
            return Ok(());
        }

        // Compute every share before touching state so a failure cannot
        // leave a partial split behind.
        let mut updates = Vec::new();
        for (i, delegation) in self.delegations.iter().enumerate() {
            if !self.is_eligible(delegation, now) {
                continue;
            }
            let share = reward_share(amount, delegation.stake_amount, total_eligible);
            let new_reward = delegation
                .accrued_reward
                .checked_add(share)
                .ok_or(DelegationError::Overflow)?;
            updates.push((i, new_reward));
        }
        for (i, new_reward) in updates {
            self.delegations[i].accrued_reward = new_reward;
        }
        Ok(())
    }

    /// Pay out (or queue) the caller's accrued rewards, zeroing them.
    pub fn request_withdraw_rewards(
        &mut self,
        caller: &AccountId,
        proxy: &StakeProxy,
        registry: &mut Registry,
    ) -> Result<WithdrawOutcome, DelegationError> {
        debug_assert_eq!(proxy.address, self.proxy);
        if !self.delegations.iter().any(|d| &d.delegator == caller) {
            return Err(DelegationError::NoDelegations(caller.clone()));
        }
        let mut total: Amount = 0;
        for delegation in self.delegations.iter().filter(|d| &d.delegator == caller) {
            total = total
                .checked_add(delegation.accrued_reward)
                .ok_or(DelegationError::Overflow)?;
        }
        if total == 0 {
            return Err(DelegationError::NothingToWithdraw);
        }
        for delegation in self
            .delegations
            .iter_mut()
            .filter(|d| &d.delegator == caller)
        {
            delegation.accrued_reward = 0;
        }
        self.withdraw_or_queue(caller, total, proxy, registry)
    }

    /// Remove all of the caller's delegations and pay out (or queue)
    /// principal plus any remaining rewards.
    pub fn request_unstake_delegated_stakes(
        &mut self,
        caller: &AccountId,
        proxy: &StakeProxy,
        registry: &mut Registry,
    ) -> Result<WithdrawOutcome, DelegationError> {
        debug_assert_eq!(proxy.address, self.proxy);
        if !self.delegations.iter().any(|d| &d.delegator == caller) {
            return Err(DelegationError::NoDelegations(caller.clone()));
        }
        let mut total: Amount = 0;
        for delegation in self.delegations.iter().filter(|d| &d.delegator == caller) {
            total = total
                .checked_add(delegation.stake_amount)
                .and_then(|t| t.checked_add(delegation.accrued_reward))
                .ok_or(DelegationError::Overflow)?;
        }
        self.delegations.retain(|d| &d.delegator != caller);
        self.withdraw_or_queue(caller, total, proxy, registry)
    }

    /// Collect every matured pending withdrawal for the caller. Returns
    /// the amount for the environment to transfer.
    pub fn withdraw(
        &mut self,
        caller: &AccountId,
        proxy: &StakeProxy,
        registry: &mut Registry,
    ) -> Result<Amount, DelegationError> {
        debug_assert_eq!(proxy.address, self.proxy);
        let now = registry.current_epoch();
        let total = self.queue.matured_total(caller, now);
        if total == 0 {
            return Err(DelegationError::NoMaturedWithdrawals);
        }
        proxy.withdraw(&self.address, total, registry)?;
        let taken = self.queue.take_matured(caller, now);
        debug_assert_eq!(taken, total);
        Ok(total)
    }

    // ── Read-only queries ────────────────────────────────────────────────

    /// Sum of all delegated principal.
    pub fn total_delegated_stake(&self) -> Amount {
        self.delegations
            .iter()
            .fold(0, |acc: Amount, d| acc.saturating_add(d.stake_amount))
    }

    /// Sum of the principal currently eligible for reward shares.
    pub fn total_eligible_stake(&self, registry: &Registry) -> Amount {
        self.total_eligible_stake_at(registry.current_epoch())
    }

    /// The caller's accrued rewards across all their entries.
    pub fn accrued_rewards(&self, delegator: &AccountId) -> Amount {
        self.delegations
            .iter()
            .filter(|d| &d.delegator == delegator)
            .fold(0, |acc: Amount, d| acc.saturating_add(d.accrued_reward))
    }

    /// Every delegation entry, in creation order.
    pub fn delegations(&self) -> &[DelegatedStake] {
        &self.delegations
    }

    /// The delegator's entries, in creation order.
    pub fn delegations_by(&self, delegator: &AccountId) -> Vec<&DelegatedStake> {
        self.delegations
            .iter()
            .filter(|d| &d.delegator == delegator)
            .collect()
    }

    /// The validator's active stake as the registry sees it.
    pub fn staking_power(&self, registry: &Registry) -> Result<Amount, DelegationError> {
        Ok(registry.staking_power(&self.address)?)
    }

    /// The delegator's pending withdrawals, oldest first.
    pub fn pending_withdrawals(&self, delegator: &AccountId) -> Vec<PendingWithdrawal> {
        self.queue.pending(delegator)
    }

    /// Sum of every queued withdrawal amount.
    pub fn total_queued_withdrawals(&self) -> Amount {
        self.queue.total_queued()
    }

    /// The bound proxy's identity.
    pub fn proxy(&self) -> &AccountId {
        &self.proxy
    }

    // ── Internal ─────────────────────────────────────────────────────────

    /// Pay immediately when the validator's free balance covers `amount`;
    /// otherwise free the stake and queue the payout behind the unlock
    /// delay.
    fn withdraw_or_queue(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        proxy: &StakeProxy,
        registry: &mut Registry,
    ) -> Result<WithdrawOutcome, DelegationError> {
        let available = proxy.available_balance(registry)?;
        if available >= amount {
            proxy.withdraw(&self.address, amount, registry)?;
            return Ok(WithdrawOutcome::Paid { amount });
        }

        self.queue.ensure_capacity(caller)?;
        let delta = i128::try_from(amount).map_err(|_| DelegationError::Overflow)?;
        proxy.adjust_stake(&self.address, -delta, registry)?;
        let unlock_epoch = registry
            .current_epoch()
            .plus(self.params.withdrawal_delay_epochs);
        self.queue.enqueue(caller.clone(), amount, unlock_epoch)?;
        Ok(WithdrawOutcome::Queued {
            amount,
            unlock_epoch,
        })
    }

    fn is_eligible(&self, delegation: &DelegatedStake, now: Epoch) -> bool {
        delegation
            .from_epoch
            .matured(self.params.min_delegation_duration, now)
    }

    fn total_eligible_stake_at(&self, now: Epoch) -> Amount {
        self.delegations
            .iter()
            .filter(|d| self.is_eligible(d, now))
            .fold(0, |acc: Amount, d| acc.saturating_add(d.stake_amount))
    }
}
