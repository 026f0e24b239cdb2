//! The per-validator stake proxy.
//!
//! A thin authorization and forwarding layer: only the validator's declared
//! owner may move funds, and every call is forwarded verbatim to the
//! registry under the proxy's own address. Rewards arriving from the
//! registry are relayed to the registered callback target; a proxy with no
//! target drops them silently — that is the documented no-op, not an error.

use crate::error::ProxyError;
use crate::registry::Registry;
use palisade_types::{AccountId, Amount, Epoch};
use serde::{Deserialize, Serialize};

/// A relayed reward notification, addressed to the callback target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardRelay {
    pub target: AccountId,
    pub epoch: Epoch,
    pub amount: Amount,
    pub restaked: bool,
}

/// One stake proxy per validator.
///
/// Holds reference identities only: the registry it forwards to and the
/// optional callback target. The validator record itself lives in the
/// registry, keyed by this proxy's address.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakeProxy {
    pub address: AccountId,
    pub owner: AccountId,
    pub sign_key: AccountId,
    registry: AccountId,
    reward_callback: Option<AccountId>,
}

impl StakeProxy {
    pub fn new(
        address: AccountId,
        registry: AccountId,
        owner: AccountId,
        sign_key: AccountId,
    ) -> Self {
        Self {
            address,
            owner,
            sign_key,
            registry,
            reward_callback: None,
        }
    }

    // ── Owner-gated forwarding ───────────────────────────────────────────

    pub fn deposit(
        &self,
        caller: &AccountId,
        value: Amount,
        registry: &mut Registry,
    ) -> Result<(), ProxyError> {
        self.assert_owner(caller)?;
        registry.deposit(&self.address, value)?;
        Ok(())
    }

    pub fn stake(
        &self,
        caller: &AccountId,
        value: Amount,
        registry: &mut Registry,
    ) -> Result<(), ProxyError> {
        self.assert_owner(caller)?;
        registry.stake(&self.address, value)?;
        Ok(())
    }

    pub fn adjust_stake(
        &self,
        caller: &AccountId,
        delta: i128,
        registry: &mut Registry,
    ) -> Result<(), ProxyError> {
        self.assert_owner(caller)?;
        registry.adjust_stake(&self.address, delta)?;
        Ok(())
    }

    /// Withdraw from the validator's unlocked balance. Returns the amount
    /// for the environment to transfer to the caller.
    pub fn withdraw(
        &self,
        caller: &AccountId,
        amount: Amount,
        registry: &mut Registry,
    ) -> Result<Amount, ProxyError> {
        self.assert_owner(caller)?;
        Ok(registry.withdraw(&self.address, amount)?)
    }

    pub fn set_restake(
        &self,
        caller: &AccountId,
        restake: bool,
        registry: &mut Registry,
    ) -> Result<(), ProxyError> {
        self.assert_owner(caller)?;
        registry.set_restake(&self.address, restake)?;
        Ok(())
    }

    /// Register the reward callback target. At most one is held; a second
    /// registration replaces the first.
    pub fn register_reward_callback(
        &mut self,
        caller: &AccountId,
        target: AccountId,
    ) -> Result<(), ProxyError> {
        self.assert_owner(caller)?;
        self.reward_callback = Some(target);
        Ok(())
    }

    pub fn has_reward_callback(&self) -> bool {
        self.reward_callback.is_some()
    }

    // ── Registry-gated relay ─────────────────────────────────────────────

    /// Accept a reward notification from the registry and produce the relay
    /// for the callback target, if one is registered.
    pub fn rewards(
        &self,
        caller: &AccountId,
        epoch: Epoch,
        amount: Amount,
        restaked: bool,
    ) -> Result<Option<RewardRelay>, ProxyError> {
        if caller != &self.registry {
            return Err(ProxyError::NotRegistry(caller.clone()));
        }
        Ok(self.reward_callback.as_ref().map(|target| RewardRelay {
            target: target.clone(),
            epoch,
            amount,
            restaked,
        }))
    }

    // ── Pass-through queries ─────────────────────────────────────────────

    pub fn restake(&self, registry: &Registry) -> Result<bool, ProxyError> {
        Ok(registry.restake(&self.address)?)
    }

    pub fn staked_amount(&self, epoch: Epoch, registry: &Registry) -> Result<Amount, ProxyError> {
        Ok(registry.staked_amount(&self.address, epoch)?)
    }

    pub fn available_balance(&self, registry: &Registry) -> Result<Amount, ProxyError> {
        Ok(registry.available_balance(&self.address)?)
    }

    pub fn total_balance(&self, registry: &Registry) -> Result<Amount, ProxyError> {
        Ok(registry.total_balance(&self.address)?)
    }

    pub fn current_epoch(&self, registry: &Registry) -> Epoch {
        registry.current_epoch()
    }

    pub fn validator_min_stake(&self, registry: &Registry) -> Amount {
        registry.validator_min_stake()
    }

    fn assert_owner(&self, caller: &AccountId) -> Result<(), ProxyError> {
        if caller != &self.owner {
            return Err(ProxyError::NotOwner(caller.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(name: &str) -> AccountId {
        AccountId::new(format!("pal_{name}"))
    }

    fn setup() -> (Registry, StakeProxy) {
        let mut registry = Registry::new(100);
        let proxy = StakeProxy::new(
            addr("proxy"),
            addr("registry"),
            addr("owner"),
            addr("sign"),
        );
        registry
            .register_validator(
                proxy.address.clone(),
                proxy.owner.clone(),
                proxy.sign_key.clone(),
                false,
                100,
            )
            .unwrap();
        (registry, proxy)
    }

    #[test]
    fn only_owner_may_move_funds() {
        let (mut registry, proxy) = setup();
        let stranger = addr("stranger");
        assert!(matches!(
            proxy.deposit(&stranger, 10, &mut registry),
            Err(ProxyError::NotOwner(_))
        ));
        assert!(matches!(
            proxy.withdraw(&stranger, 10, &mut registry),
            Err(ProxyError::NotOwner(_))
        ));
        proxy.deposit(&addr("owner"), 10, &mut registry).unwrap();
        assert_eq!(proxy.total_balance(&registry).unwrap(), 110);
    }

    #[test]
    fn rewards_only_accepted_from_registry() {
        let (_registry, mut proxy) = setup();
        proxy
            .register_reward_callback(&addr("owner"), addr("ledger"))
            .unwrap();

        assert!(matches!(
            proxy.rewards(&addr("owner"), Epoch::new(1), 10, false),
            Err(ProxyError::NotRegistry(_))
        ));

        let relay = proxy
            .rewards(&addr("registry"), Epoch::new(1), 10, false)
            .unwrap()
            .unwrap();
        assert_eq!(relay.target, addr("ledger"));
        assert_eq!(relay.amount, 10);
    }

    #[test]
    fn rewards_without_callback_are_dropped_silently() {
        let (_registry, proxy) = setup();
        assert!(!proxy.has_reward_callback());
        let relay = proxy
            .rewards(&addr("registry"), Epoch::new(1), 10, true)
            .unwrap();
        assert!(relay.is_none());
    }

    #[test]
    fn callback_registration_is_owner_gated() {
        let (_registry, mut proxy) = setup();
        assert!(matches!(
            proxy.register_reward_callback(&addr("stranger"), addr("ledger")),
            Err(ProxyError::NotOwner(_))
        ));
    }
}
