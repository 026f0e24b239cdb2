//! The per-validator balance record and its transitions.

use crate::error::RegistryError;
use palisade_types::{AccountId, Amount, Epoch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A registered validator.
///
/// Invariant: `total_balance >= current_stake` at all times. `staked_by_epoch`
/// holds the stake snapshots taken at epoch boundaries; the largest snapshot
/// still pending is the locked portion of the balance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Validator {
    pub owner: AccountId,
    pub sign_key: AccountId,
    pub total_balance: Amount,
    pub current_stake: Amount,
    /// Stake snapshots keyed by the epoch they were locked for.
    pub staked_by_epoch: BTreeMap<Epoch, Amount>,
    /// Whether rewards are restaked (credited to the active stake) or only
    /// deposited to the withdrawable balance.
    pub restake: bool,
}

impl Validator {
    pub fn new(owner: AccountId, sign_key: AccountId, restake: bool) -> Self {
        Self {
            owner,
            sign_key,
            total_balance: 0,
            current_stake: 0,
            staked_by_epoch: BTreeMap::new(),
            restake,
        }
    }

    /// Credit `amount` to the withdrawable balance only.
    pub fn deposit(&mut self, amount: Amount) -> Result<(), RegistryError> {
        self.total_balance = self
            .total_balance
            .checked_add(amount)
            .ok_or(RegistryError::Overflow)?;
        Ok(())
    }

    /// Credit `amount` to both the balance and the active stake.
    pub fn stake(&mut self, amount: Amount) -> Result<(), RegistryError> {
        self.total_balance = self
            .total_balance
            .checked_add(amount)
            .ok_or(RegistryError::Overflow)?;
        self.current_stake = self
            .current_stake
            .checked_add(amount)
            .ok_or(RegistryError::Overflow)?;
        Ok(())
    }

    /// Remove `amount` from the withdrawable balance.
    ///
    /// The caller is responsible for the availability check; this only
    /// guards the balance itself.
    pub fn withdraw(&mut self, amount: Amount) -> Result<(), RegistryError> {
        self.total_balance = self.total_balance.checked_sub(amount).ok_or(
            RegistryError::WithdrawalTooLarge {
                requested: amount,
                available: self.total_balance,
            },
        )?;
        Ok(())
    }

    /// Move `delta` into or out of the active stake without touching the
    /// balance. The result must stay within `[0, total_balance]`.
    pub fn adjust_stake(&mut self, delta: i128) -> Result<(), RegistryError> {
        let new_stake = self
            .current_stake
            .checked_add_signed(delta)
            .ok_or(RegistryError::NegativeStake)?;
        if new_stake > self.total_balance {
            return Err(RegistryError::StakeExceedsBalance {
                stake: new_stake,
                balance: self.total_balance,
            });
        }
        self.current_stake = new_stake;
        Ok(())
    }

    /// The largest stake snapshot still pending — the locked portion of the
    /// balance. Zero when no epoch is pending.
    pub fn locked_stake(&self) -> Amount {
        self.staked_by_epoch.values().copied().max().unwrap_or(0)
    }

    /// Balance not locked by any pending epoch snapshot.
    pub fn available_balance(&self) -> Amount {
        self.total_balance.saturating_sub(self.locked_stake())
    }

    /// The stake snapshot taken for `epoch`, or zero if none was taken.
    pub fn staked_at(&self, epoch: Epoch) -> Amount {
        self.staked_by_epoch.get(&epoch).copied().unwrap_or(0)
    }

    /// Snapshot the current stake for `epoch`.
    pub fn lock_at(&mut self, epoch: Epoch) {
        self.staked_by_epoch.insert(epoch, self.current_stake);
    }

    /// Drop every snapshot taken for `epoch` or earlier.
    pub fn unlock_through(&mut self, epoch: Epoch) {
        self.staked_by_epoch.retain(|e, _| *e > epoch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator::new(
            AccountId::new("pal_owner"),
            AccountId::new("pal_sign"),
            false,
        )
    }

    #[test]
    fn stake_credits_both_balances() {
        let mut v = validator();
        v.stake(100).unwrap();
        assert_eq!(v.total_balance, 100);
        assert_eq!(v.current_stake, 100);
    }

    #[test]
    fn deposit_credits_balance_only() {
        let mut v = validator();
        v.deposit(100).unwrap();
        assert_eq!(v.total_balance, 100);
        assert_eq!(v.current_stake, 0);
    }

    #[test]
    fn adjust_stake_bounds() {
        let mut v = validator();
        v.stake(100).unwrap();
        v.deposit(50).unwrap();

        v.adjust_stake(50).unwrap();
        assert_eq!(v.current_stake, 150);

        assert!(matches!(
            v.adjust_stake(1),
            Err(RegistryError::StakeExceedsBalance { .. })
        ));
        assert!(matches!(
            v.adjust_stake(-151),
            Err(RegistryError::NegativeStake)
        ));

        v.adjust_stake(-150).unwrap();
        assert_eq!(v.current_stake, 0);
        assert_eq!(v.total_balance, 150);
    }

    #[test]
    fn locked_stake_is_max_pending_snapshot() {
        let mut v = validator();
        v.stake(100).unwrap();
        v.lock_at(Epoch::new(1));
        v.adjust_stake(-40).unwrap();
        v.lock_at(Epoch::new(2));

        assert_eq!(v.staked_at(Epoch::new(1)), 100);
        assert_eq!(v.staked_at(Epoch::new(2)), 60);
        assert_eq!(v.locked_stake(), 100);
        assert_eq!(v.available_balance(), 0);

        v.unlock_through(Epoch::new(1));
        assert_eq!(v.locked_stake(), 60);
        assert_eq!(v.available_balance(), 40);

        v.unlock_through(Epoch::new(2));
        assert_eq!(v.locked_stake(), 0);
        assert_eq!(v.available_balance(), 100);
    }
}
