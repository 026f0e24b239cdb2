//! Bounded, epoch-delayed withdrawal queues.

use crate::error::DelegationError;
use palisade_types::{AccountId, Amount, Epoch};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// A queued payout awaiting its unlock epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingWithdrawal {
    pub amount: Amount,
    pub unlock_epoch: Epoch,
}

/// Per-delegator withdrawal queues with a shared length bound.
///
/// `total_queued` is updated incrementally on every mutation and always
/// equals the sum of all queued amounts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WithdrawalQueue {
    queues: HashMap<AccountId, VecDeque<PendingWithdrawal>>,
    total_queued: Amount,
    max_len: usize,
}

impl WithdrawalQueue {
    pub fn new(max_len: usize) -> Self {
        Self {
            queues: HashMap::new(),
            total_queued: 0,
            max_len,
        }
    }

    /// Whether `delegator` has room for one more entry.
    pub fn ensure_capacity(&self, delegator: &AccountId) -> Result<(), DelegationError> {
        let len = self.queues.get(delegator).map_or(0, VecDeque::len);
        if len >= self.max_len {
            return Err(DelegationError::WithdrawalQueueFull {
                len,
                max: self.max_len,
            });
        }
        Ok(())
    }

    /// Append a pending withdrawal for `delegator`.
    pub fn enqueue(
        &mut self,
        delegator: AccountId,
        amount: Amount,
        unlock_epoch: Epoch,
    ) -> Result<(), DelegationError> {
        self.ensure_capacity(&delegator)?;
        self.total_queued = self
            .total_queued
            .checked_add(amount)
            .ok_or(DelegationError::Overflow)?;
        self.queues
            .entry(delegator)
            .or_default()
            .push_back(PendingWithdrawal {
                amount,
                unlock_epoch,
            });
        Ok(())
    }

    /// Sum of the delegator's entries whose unlock epoch has passed.
    pub fn matured_total(&self, delegator: &AccountId, now: Epoch) -> Amount {
        self.queues
            .get(delegator)
            .map(|q| {
                q.iter()
                    .filter(|p| p.unlock_epoch <= now)
                    .fold(0, |acc: Amount, p| acc.saturating_add(p.amount))
            })
            .unwrap_or(0)
    }

    /// Remove every matured entry for `delegator` and return their sum.
    /// A call with nothing matured removes nothing and returns zero.
    pub fn take_matured(&mut self, delegator: &AccountId, now: Epoch) -> Amount {
        let Some(queue) = self.queues.get_mut(delegator) else {
            return 0;
        };
        let mut taken: Amount = 0;
        queue.retain(|p| {
            if p.unlock_epoch <= now {
                taken = taken.saturating_add(p.amount);
                false
            } else {
                true
            }
        });
        if queue.is_empty() {
            self.queues.remove(delegator);
        }
        self.total_queued = self.total_queued.saturating_sub(taken);
        taken
    }

    /// The delegator's queue, oldest first.
    pub fn pending(&self, delegator: &AccountId) -> Vec<PendingWithdrawal> {
        self.queues
            .get(delegator)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn total_queued(&self) -> Amount {
        self.total_queued
    }
}
