//! The validator registry engine.
//!
//! Owns the validator map, the owner and sign-key uniqueness indexes, and
//! the global epoch counter. Reward distribution is two-phase so the
//! execution environment can route reward callbacks between the credit pass
//! and the epoch advance: [`Registry::add_rewards`] validates and credits,
//! returning one [`RewardEvent`] per reward pair; [`Registry::complete_distribution`]
//! then unlocks stale snapshots and moves the counter.

use crate::error::RegistryError;
use crate::validator::Validator;
use palisade_types::{AccountId, Amount, Epoch};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A reward credited to a validator, to be relayed to its proxy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardEvent {
    /// The proxy address the validator is keyed by.
    pub validator: AccountId,
    pub epoch: Epoch,
    pub amount: Amount,
    pub restaked: bool,
}

/// The validator registry.
///
/// Validators are keyed by their proxy address — the identity the proxy
/// presents when forwarding calls. `owners` and `sign_keys` enforce the
/// uniqueness invariants and serve reverse lookups.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registry {
    validators: HashMap<AccountId, Validator>,
    owners: HashMap<AccountId, AccountId>,
    sign_keys: HashMap<AccountId, AccountId>,
    validator_min_stake: Amount,
    current_epoch: Epoch,
}

impl Registry {
    pub fn new(validator_min_stake: Amount) -> Self {
        Self {
            validators: HashMap::new(),
            owners: HashMap::new(),
            sign_keys: HashMap::new(),
            validator_min_stake,
            // The first block is part of epoch 1.
            current_epoch: Epoch::GENESIS,
        }
    }

    // ── Registration ─────────────────────────────────────────────────────

    /// Register a new validator keyed by `proxy_addr`, staking `value`.
    pub fn register_validator(
        &mut self,
        proxy_addr: AccountId,
        owner: AccountId,
        sign_key: AccountId,
        restake: bool,
        value: Amount,
    ) -> Result<(), RegistryError> {
        if value < self.validator_min_stake {
            return Err(RegistryError::BelowValidatorMinStake {
                needed: self.validator_min_stake,
                got: value,
            });
        }
        if self.owners.contains_key(&owner) {
            return Err(RegistryError::OwnerAlreadyRegistered(owner));
        }
        if self.sign_keys.contains_key(&sign_key) {
            return Err(RegistryError::SignKeyAlreadyRegistered(sign_key));
        }

        let mut validator = Validator::new(owner.clone(), sign_key.clone(), restake);
        validator.stake(value)?;
        self.owners.insert(owner, proxy_addr.clone());
        self.sign_keys.insert(sign_key, proxy_addr.clone());
        self.validators.insert(proxy_addr, validator);
        Ok(())
    }

    // ── Proxy-facing API ─────────────────────────────────────────────────

    /// Credit `value` to the caller's withdrawable balance.
    pub fn deposit(&mut self, caller: &AccountId, value: Amount) -> Result<(), RegistryError> {
        if value == 0 {
            return Err(RegistryError::NonPositiveAmount);
        }
        self.validator_mut(caller)?.deposit(value)
    }

    /// Credit `value` to the caller's balance and active stake.
    pub fn stake(&mut self, caller: &AccountId, value: Amount) -> Result<(), RegistryError> {
        if value == 0 {
            return Err(RegistryError::NonPositiveAmount);
        }
        self.validator_mut(caller)?.stake(value)
    }

    /// Move `delta` into or out of the caller's active stake.
    pub fn adjust_stake(&mut self, caller: &AccountId, delta: i128) -> Result<(), RegistryError> {
        self.validator_mut(caller)?.adjust_stake(delta)
    }

    /// Withdraw `amount` from the caller's unlocked balance. Returns the
    /// amount so the environment can execute the outbound transfer.
    pub fn withdraw(&mut self, caller: &AccountId, amount: Amount) -> Result<Amount, RegistryError> {
        let validator = self.validator_mut(caller)?;
        let available = validator.available_balance();
        if available < amount {
            return Err(RegistryError::WithdrawalTooLarge {
                requested: amount,
                available,
            });
        }
        validator.withdraw(amount)?;
        Ok(amount)
    }

    pub fn set_restake(&mut self, caller: &AccountId, restake: bool) -> Result<(), RegistryError> {
        self.validator_mut(caller)?.restake = restake;
        Ok(())
    }

    pub fn restake(&self, caller: &AccountId) -> Result<bool, RegistryError> {
        Ok(self.validator(caller)?.restake)
    }

    pub fn staked_amount(&self, caller: &AccountId, epoch: Epoch) -> Result<Amount, RegistryError> {
        Ok(self.validator(caller)?.staked_at(epoch))
    }

    pub fn available_balance(&self, validator: &AccountId) -> Result<Amount, RegistryError> {
        Ok(self.validator(validator)?.available_balance())
    }

    pub fn total_balance(&self, validator: &AccountId) -> Result<Amount, RegistryError> {
        Ok(self.validator(validator)?.total_balance)
    }

    // ── Protocol-driver API ──────────────────────────────────────────────

    /// Snapshot the stake of every validator at or above the minimum for
    /// `epoch`, then return the resulting validator set.
    pub fn lock_stake(&mut self, epoch: Epoch) -> Vec<(AccountId, Amount)> {
        for validator in self.validators.values_mut() {
            if validator.current_stake >= self.validator_min_stake {
                validator.lock_at(epoch);
            }
        }
        self.sorted_validators()
    }

    /// Credit the rewards for `epoch` and return one event per pair for the
    /// environment to relay to the validators' proxies.
    ///
    /// `value` is the amount attached to the call; the pair total must match
    /// it exactly. Every sign key is resolved before any credit is applied.
    pub fn add_rewards(
        &mut self,
        epoch: Epoch,
        rewards: &[(AccountId, Amount)],
        value: Amount,
    ) -> Result<Vec<RewardEvent>, RegistryError> {
        self.check_distribution_epoch(epoch)?;

        let mut declared: Amount = 0;
        for (_, amount) in rewards {
            declared = declared.checked_add(*amount).ok_or(RegistryError::Overflow)?;
        }
        if declared != value {
            return Err(RegistryError::RewardTotalMismatch {
                declared,
                attached: value,
            });
        }

        let mut targets = Vec::with_capacity(rewards.len());
        for (sign_key, amount) in rewards {
            let proxy_addr = self
                .sign_keys
                .get(sign_key)
                .ok_or_else(|| RegistryError::UnknownSignKey(sign_key.clone()))?
                .clone();
            targets.push((proxy_addr, *amount));
        }

        let mut events = Vec::with_capacity(targets.len());
        for (proxy_addr, amount) in targets {
            let validator = self.validator_mut(&proxy_addr)?;
            let restaked = validator.restake;
            if restaked {
                validator.stake(amount)?;
            } else {
                validator.deposit(amount)?;
            }
            events.push(RewardEvent {
                validator: proxy_addr,
                epoch,
                amount,
                restaked,
            });
        }
        Ok(events)
    }

    /// Finish the distribution for `epoch`: drop the snapshots no epoch
    /// still needs and advance the counter.
    ///
    /// At the end of epoch X we distribute rewards for X - 1; thus the
    /// counter is (soon) X + 1, i.e. X - 1 + 2.
    pub fn complete_distribution(&mut self, epoch: Epoch) -> Result<(), RegistryError> {
        self.check_distribution_epoch(epoch)?;
        for validator in self.validators.values_mut() {
            validator.unlock_through(epoch);
        }
        self.current_epoch = epoch.plus(2);
        Ok(())
    }

    /// Validators with stake at or above the minimum, ordered by stake
    /// descending with ties broken by ascending sign key.
    ///
    /// The tie-break must stay deterministic: the external protocol derives
    /// the validator set from this ordering.
    pub fn sorted_validators(&self) -> Vec<(AccountId, Amount)> {
        let mut set: Vec<(AccountId, Amount)> = self
            .validators
            .values()
            .filter(|v| v.current_stake >= self.validator_min_stake)
            .map(|v| (v.sign_key.clone(), v.current_stake))
            .collect();
        set.sort_by(|(a_key, a_stake), (b_key, b_stake)| {
            b_stake.cmp(a_stake).then_with(|| a_key.cmp(b_key))
        });
        set
    }

    // ── Lookup API ───────────────────────────────────────────────────────

    /// The active stake of the validator registered by `owner`.
    pub fn staking_power(&self, owner: &AccountId) -> Result<Amount, RegistryError> {
        Ok(self.validator_by_owner(owner)?.current_stake)
    }

    /// The full validator record registered by `owner`.
    pub fn validator_state(&self, owner: &AccountId) -> Result<&Validator, RegistryError> {
        self.validator_by_owner(owner)
    }

    /// The proxy address of the validator registered by `owner`.
    pub fn proxy_address(&self, owner: &AccountId) -> Result<&AccountId, RegistryError> {
        self.owners
            .get(owner)
            .ok_or_else(|| RegistryError::UnknownOwner(owner.clone()))
    }

    pub fn current_epoch(&self) -> Epoch {
        self.current_epoch
    }

    pub fn validator_min_stake(&self) -> Amount {
        self.validator_min_stake
    }

    // ── Testing / debugging ──────────────────────────────────────────────

    /// Move the counter to `epoch`. Administrative calls may only advance
    /// it; the monotonicity invariant holds even here.
    pub fn debug_set_epoch(&mut self, epoch: Epoch) -> Result<Epoch, RegistryError> {
        if epoch < self.current_epoch {
            return Err(RegistryError::EpochRegression {
                distributed: epoch,
                current: self.current_epoch,
            });
        }
        self.current_epoch = epoch;
        Ok(self.current_epoch)
    }

    /// Advance the counter by `delta` epochs.
    pub fn debug_adjust_epoch_by(&mut self, delta: u64) -> Epoch {
        self.current_epoch = self.current_epoch.plus(delta);
        self.current_epoch
    }

    // ── Internal ─────────────────────────────────────────────────────────

    fn check_distribution_epoch(&self, epoch: Epoch) -> Result<(), RegistryError> {
        if epoch.plus(2) < self.current_epoch {
            return Err(RegistryError::EpochRegression {
                distributed: epoch,
                current: self.current_epoch,
            });
        }
        Ok(())
    }

    fn validator(&self, addr: &AccountId) -> Result<&Validator, RegistryError> {
        self.validators
            .get(addr)
            .ok_or_else(|| RegistryError::NotRegistered(addr.clone()))
    }

    fn validator_mut(&mut self, addr: &AccountId) -> Result<&mut Validator, RegistryError> {
        self.validators
            .get_mut(addr)
            .ok_or_else(|| RegistryError::NotRegistered(addr.clone()))
    }

    fn validator_by_owner(&self, owner: &AccountId) -> Result<&Validator, RegistryError> {
        let addr = self
            .owners
            .get(owner)
            .ok_or_else(|| RegistryError::UnknownOwner(owner.clone()))?;
        self.validator(addr)
    }
}
