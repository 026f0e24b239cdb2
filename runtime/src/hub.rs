//! The staking hub — the arena every component lives in.
//!
//! Every public operation here is one atomic transition: the hub clones its
//! state, runs the operation (including any nested cross-component calls),
//! and on any error restores the clone wholesale. Callers observe either
//! full success or no state change at all.

use crate::error::HubError;
use palisade_delegation::{DelegationLedger, PendingWithdrawal, WithdrawOutcome};
use palisade_registry::{Registry, StakeProxy};
use palisade_types::{AccountId, Amount, Epoch, StakingParams};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// An executed outbound transfer, in call order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub to: AccountId,
    pub amount: Amount,
}

/// The component arena plus the environment primitives.
///
/// Proxies and ledgers are addressed by the `AccountId` handles returned at
/// registration; the registry is a singleton with its own identity so the
/// proxies can authenticate its reward notifications.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakingHub {
    protocol_owner: AccountId,
    registry_address: AccountId,
    params: StakingParams,
    registry: Registry,
    proxies: HashMap<AccountId, StakeProxy>,
    ledgers: HashMap<AccountId, DelegationLedger>,
    next_account: u64,
    transfers: Vec<Transfer>,
}

impl StakingHub {
    pub fn new(protocol_owner: AccountId, params: StakingParams) -> Self {
        let registry = Registry::new(params.validator_min_stake);
        Self {
            protocol_owner,
            registry_address: AccountId::new("pal_registry"),
            params,
            registry,
            proxies: HashMap::new(),
            ledgers: HashMap::new(),
            next_account: 0,
            transfers: Vec::new(),
        }
    }

    // ── Registration ─────────────────────────────────────────────────────

    /// Register a validator operated directly by `owner`. Returns the
    /// handle of the freshly created stake proxy.
    pub fn register_validator(
        &mut self,
        owner: AccountId,
        sign_key: AccountId,
        restake: bool,
        value: Amount,
    ) -> Result<AccountId, HubError> {
        self.transactional(|hub| {
            let proxy_addr = hub.allocate_address("proxy");
            hub.registry.register_validator(
                proxy_addr.clone(),
                owner.clone(),
                sign_key.clone(),
                restake,
                value,
            )?;
            let proxy = StakeProxy::new(
                proxy_addr.clone(),
                hub.registry_address.clone(),
                owner.clone(),
                sign_key.clone(),
            );
            hub.proxies.insert(proxy_addr.clone(), proxy);
            info!(validator = %proxy_addr, %owner, stake = value, "registered validator");
            Ok(proxy_addr)
        })
    }

    /// Register a validator that accepts pooled stake. The new delegation
    /// ledger owns the proxy and is wired up as its reward callback.
    /// Returns the ledger's handle.
    pub fn register_delegated_validator(
        &mut self,
        sign_key: AccountId,
        restake: bool,
        value: Amount,
    ) -> Result<AccountId, HubError> {
        self.transactional(|hub| {
            let ledger_addr = hub.allocate_address("ledger");
            let proxy_addr = hub.allocate_address("proxy");
            hub.registry.register_validator(
                proxy_addr.clone(),
                ledger_addr.clone(),
                sign_key.clone(),
                restake,
                value,
            )?;
            let mut proxy = StakeProxy::new(
                proxy_addr.clone(),
                hub.registry_address.clone(),
                ledger_addr.clone(),
                sign_key.clone(),
            );
            proxy.register_reward_callback(&ledger_addr, ledger_addr.clone())?;
            hub.proxies.insert(proxy_addr.clone(), proxy);
            let ledger = DelegationLedger::new(
                ledger_addr.clone(),
                proxy_addr.clone(),
                hub.params.clone(),
            );
            hub.ledgers.insert(ledger_addr.clone(), ledger);
            info!(ledger = %ledger_addr, validator = %proxy_addr, stake = value,
                  "registered delegated validator");
            Ok(ledger_addr)
        })
    }

    // ── Proxy surface ────────────────────────────────────────────────────

    pub fn deposit(
        &mut self,
        caller: &AccountId,
        proxy_addr: &AccountId,
        value: Amount,
    ) -> Result<(), HubError> {
        self.transactional(|hub| {
            let proxy = hub
                .proxies
                .get(proxy_addr)
                .ok_or_else(|| HubError::UnknownProxy(proxy_addr.clone()))?;
            proxy.deposit(caller, value, &mut hub.registry)?;
            Ok(())
        })
    }

    pub fn stake(
        &mut self,
        caller: &AccountId,
        proxy_addr: &AccountId,
        value: Amount,
    ) -> Result<(), HubError> {
        self.transactional(|hub| {
            let proxy = hub
                .proxies
                .get(proxy_addr)
                .ok_or_else(|| HubError::UnknownProxy(proxy_addr.clone()))?;
            proxy.stake(caller, value, &mut hub.registry)?;
            Ok(())
        })
    }

    pub fn adjust_stake(
        &mut self,
        caller: &AccountId,
        proxy_addr: &AccountId,
        delta: i128,
    ) -> Result<(), HubError> {
        self.transactional(|hub| {
            let proxy = hub
                .proxies
                .get(proxy_addr)
                .ok_or_else(|| HubError::UnknownProxy(proxy_addr.clone()))?;
            proxy.adjust_stake(caller, delta, &mut hub.registry)?;
            Ok(())
        })
    }

    /// Withdraw from the validator's unlocked balance; the amount is
    /// transferred to the caller.
    pub fn withdraw(
        &mut self,
        caller: &AccountId,
        proxy_addr: &AccountId,
        amount: Amount,
    ) -> Result<(), HubError> {
        self.transactional(|hub| {
            let proxy = hub
                .proxies
                .get(proxy_addr)
                .ok_or_else(|| HubError::UnknownProxy(proxy_addr.clone()))?;
            let paid = proxy.withdraw(caller, amount, &mut hub.registry)?;
            hub.send(caller.clone(), paid);
            Ok(())
        })
    }

    pub fn set_restake(
        &mut self,
        caller: &AccountId,
        proxy_addr: &AccountId,
        restake: bool,
    ) -> Result<(), HubError> {
        self.transactional(|hub| {
            let proxy = hub
                .proxies
                .get(proxy_addr)
                .ok_or_else(|| HubError::UnknownProxy(proxy_addr.clone()))?;
            proxy.set_restake(caller, restake, &mut hub.registry)?;
            Ok(())
        })
    }

    pub fn register_reward_callback(
        &mut self,
        caller: &AccountId,
        proxy_addr: &AccountId,
        target: AccountId,
    ) -> Result<(), HubError> {
        self.transactional(|hub| {
            let proxy = hub
                .proxies
                .get_mut(proxy_addr)
                .ok_or_else(|| HubError::UnknownProxy(proxy_addr.clone()))?;
            proxy.register_reward_callback(caller, target)?;
            Ok(())
        })
    }

    // ── Protocol-driver surface ──────────────────────────────────────────

    /// Snapshot every qualifying validator's stake for `epoch` and return
    /// the validator set. Restricted to the protocol owner.
    pub fn lock_stake(
        &mut self,
        caller: &AccountId,
        epoch: Epoch,
    ) -> Result<Vec<(AccountId, Amount)>, HubError> {
        if caller != &self.protocol_owner {
            return Err(HubError::NotProtocolCaller(caller.clone()));
        }
        Ok(self.registry.lock_stake(epoch))
    }

    /// Distribute the rewards for `epoch`. `value` is the total attached to
    /// the call and must equal the pair total. Each credited validator's
    /// proxy relays the notification to its callback target, then the
    /// counter advances to `epoch + 2`.
    pub fn add_rewards(
        &mut self,
        epoch: Epoch,
        rewards: Vec<(AccountId, Amount)>,
        value: Amount,
    ) -> Result<(), HubError> {
        self.transactional(|hub| {
            let events = hub.registry.add_rewards(epoch, &rewards, value)?;
            for event in events {
                let proxy = hub
                    .proxies
                    .get(&event.validator)
                    .ok_or_else(|| HubError::UnknownProxy(event.validator.clone()))?;
                let relay = proxy.rewards(
                    &hub.registry_address,
                    event.epoch,
                    event.amount,
                    event.restaked,
                )?;
                // No registered callback: the notification is dropped.
                let Some(relay) = relay else { continue };
                let ledger = hub
                    .ledgers
                    .get_mut(&relay.target)
                    .ok_or_else(|| HubError::UnknownLedger(relay.target.clone()))?;
                ledger.reward_cb(
                    &event.validator,
                    relay.epoch,
                    relay.amount,
                    relay.restaked,
                    &hub.registry,
                )?;
            }
            hub.registry.complete_distribution(epoch)?;
            info!(%epoch, total = value, pairs = rewards.len(), "distributed rewards");
            Ok(())
        })
    }

    pub fn sorted_validators(&self) -> Vec<(AccountId, Amount)> {
        self.registry.sorted_validators()
    }

    pub fn current_epoch(&self) -> Epoch {
        self.registry.current_epoch()
    }

    pub fn staking_power(&self, owner: &AccountId) -> Result<Amount, HubError> {
        Ok(self.registry.staking_power(owner)?)
    }

    pub fn validator_min_stake(&self) -> Amount {
        self.registry.validator_min_stake()
    }

    pub fn debug_set_epoch(&mut self, epoch: Epoch) -> Result<Epoch, HubError> {
        Ok(self.registry.debug_set_epoch(epoch)?)
    }

    // ── Delegation surface ───────────────────────────────────────────────

    /// Delegate `value` to the validator behind `ledger_addr`.
    pub fn delegate_stake(
        &mut self,
        caller: &AccountId,
        ledger_addr: &AccountId,
        value: Amount,
    ) -> Result<(), HubError> {
        self.transactional(|hub| {
            let ledger = hub
                .ledgers
                .get_mut(ledger_addr)
                .ok_or_else(|| HubError::UnknownLedger(ledger_addr.clone()))?;
            let proxy = hub
                .proxies
                .get(ledger.proxy())
                .ok_or_else(|| HubError::UnknownProxy(ledger.proxy().clone()))?;
            ledger.delegate_stake(caller, value, proxy, &mut hub.registry)?;
            debug!(ledger = %ledger_addr, delegator = %caller, amount = value, "stake delegated");
            Ok(())
        })
    }

    /// Pay out or queue the caller's accrued rewards.
    pub fn request_withdraw_rewards(
        &mut self,
        caller: &AccountId,
        ledger_addr: &AccountId,
    ) -> Result<WithdrawOutcome, HubError> {
        self.transactional(|hub| {
            let ledger = hub
                .ledgers
                .get_mut(ledger_addr)
                .ok_or_else(|| HubError::UnknownLedger(ledger_addr.clone()))?;
            let proxy = hub
                .proxies
                .get(ledger.proxy())
                .ok_or_else(|| HubError::UnknownProxy(ledger.proxy().clone()))?;
            let outcome = ledger.request_withdraw_rewards(caller, proxy, &mut hub.registry)?;
            if let WithdrawOutcome::Paid { amount } = &outcome {
                hub.send(caller.clone(), *amount);
            }
            Ok(outcome)
        })
    }

    /// Remove the caller's delegations and pay out or queue principal plus
    /// remaining rewards.
    pub fn request_unstake_delegated_stakes(
        &mut self,
        caller: &AccountId,
        ledger_addr: &AccountId,
    ) -> Result<WithdrawOutcome, HubError> {
        self.transactional(|hub| {
            let ledger = hub
                .ledgers
                .get_mut(ledger_addr)
                .ok_or_else(|| HubError::UnknownLedger(ledger_addr.clone()))?;
            let proxy = hub
                .proxies
                .get(ledger.proxy())
                .ok_or_else(|| HubError::UnknownProxy(ledger.proxy().clone()))?;
            let outcome =
                ledger.request_unstake_delegated_stakes(caller, proxy, &mut hub.registry)?;
            if let WithdrawOutcome::Paid { amount } = &outcome {
                hub.send(caller.clone(), *amount);
            }
            Ok(outcome)
        })
    }

    /// Collect the caller's matured pending withdrawals.
    pub fn withdraw_matured(
        &mut self,
        caller: &AccountId,
        ledger_addr: &AccountId,
    ) -> Result<Amount, HubError> {
        self.transactional(|hub| {
            let ledger = hub
                .ledgers
                .get_mut(ledger_addr)
                .ok_or_else(|| HubError::UnknownLedger(ledger_addr.clone()))?;
            let proxy = hub
                .proxies
                .get(ledger.proxy())
                .ok_or_else(|| HubError::UnknownProxy(ledger.proxy().clone()))?;
            let amount = ledger.withdraw(caller, proxy, &mut hub.registry)?;
            hub.send(caller.clone(), amount);
            Ok(amount)
        })
    }

    // ── Read-only surface ────────────────────────────────────────────────

    pub fn ledger(&self, ledger_addr: &AccountId) -> Result<&DelegationLedger, HubError> {
        self.ledgers
            .get(ledger_addr)
            .ok_or_else(|| HubError::UnknownLedger(ledger_addr.clone()))
    }

    pub fn total_eligible_stake(&self, ledger_addr: &AccountId) -> Result<Amount, HubError> {
        Ok(self.ledger(ledger_addr)?.total_eligible_stake(&self.registry))
    }

    pub fn minimum_stake_amount(&self, ledger_addr: &AccountId) -> Result<Amount, HubError> {
        let ledger = self.ledger(ledger_addr)?;
        let proxy = self
            .proxies
            .get(ledger.proxy())
            .ok_or_else(|| HubError::UnknownProxy(ledger.proxy().clone()))?;
        Ok(ledger.minimum_stake_amount(proxy, &self.registry))
    }

    pub fn pending_withdrawals(
        &self,
        ledger_addr: &AccountId,
        delegator: &AccountId,
    ) -> Result<Vec<PendingWithdrawal>, HubError> {
        Ok(self.ledger(ledger_addr)?.pending_withdrawals(delegator))
    }

    pub fn proxy_state(&self, proxy_addr: &AccountId) -> Result<&StakeProxy, HubError> {
        self.proxy(proxy_addr)
    }

    pub fn available_balance(&self, proxy_addr: &AccountId) -> Result<Amount, HubError> {
        let proxy = self.proxy(proxy_addr)?;
        Ok(proxy.available_balance(&self.registry)?)
    }

    pub fn total_balance(&self, proxy_addr: &AccountId) -> Result<Amount, HubError> {
        let proxy = self.proxy(proxy_addr)?;
        Ok(proxy.total_balance(&self.registry)?)
    }

    pub fn staked_amount(&self, proxy_addr: &AccountId, epoch: Epoch) -> Result<Amount, HubError> {
        let proxy = self.proxy(proxy_addr)?;
        Ok(proxy.staked_amount(epoch, &self.registry)?)
    }

    pub fn restake(&self, proxy_addr: &AccountId) -> Result<bool, HubError> {
        let proxy = self.proxy(proxy_addr)?;
        Ok(proxy.restake(&self.registry)?)
    }

    /// Every outbound transfer executed so far, in call order.
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Serialize the full arena for persistence.
    pub fn save_state(&self) -> Result<Vec<u8>, HubError> {
        bincode::serialize(self).map_err(|e| HubError::Serialization(e.to_string()))
    }

    /// Restore an arena from serialized bytes.
    pub fn load_state(data: &[u8]) -> Result<Self, HubError> {
        bincode::deserialize(data).map_err(|e| HubError::Serialization(e.to_string()))
    }

    // ── Internal ─────────────────────────────────────────────────────────

    /// Run `f` as one atomic transition: on any error the pre-call state is
    /// restored wholesale, nested cross-component mutations included.
    fn transactional<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, HubError>,
    ) -> Result<T, HubError> {
        let snapshot = self.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                *self = snapshot;
                Err(e)
            }
        }
    }

    /// The value-transfer primitive. Only reached on the success path of a
    /// transactional operation; a rolled-back operation leaves no trace.
    fn send(&mut self, to: AccountId, amount: Amount) {
        debug!(%to, amount, "outbound transfer");
        self.transfers.push(Transfer { to, amount });
    }

    fn proxy(&self, addr: &AccountId) -> Result<&StakeProxy, HubError> {
        self.proxies
            .get(addr)
            .ok_or_else(|| HubError::UnknownProxy(addr.clone()))
    }

    fn allocate_address(&mut self, tag: &str) -> AccountId {
        self.next_account += 1;
        AccountId::new(format!("pal_{}_{:06}", tag, self.next_account))
    }
}
