//! Epoch counter type used throughout the staking core.
//!
//! Epochs are discrete, monotonically non-decreasing time units. They
//! gate delegation eligibility and schedule reward distribution; the
//! registry owns the authoritative counter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A protocol epoch number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(u64);

impl Epoch {
    /// The first block is part of epoch 1.
    pub const GENESIS: Self = Self(1);

    pub fn new(n: u64) -> Self {
        Self(n)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The epoch `n` steps ahead of this one.
    pub fn plus(&self, n: u64) -> Self {
        Self(self.0.saturating_add(n))
    }

    /// Whether a delegation started at this epoch has aged at least
    /// `duration` epochs by `now`.
    pub fn matured(&self, duration: u64, now: Epoch) -> bool {
        now.0 >= self.0.saturating_add(duration)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maturity_is_inclusive() {
        let start = Epoch::new(1);
        assert!(!start.matured(5, Epoch::new(5)));
        assert!(start.matured(5, Epoch::new(6)));
        assert!(start.matured(5, Epoch::new(7)));
    }

    #[test]
    fn plus_saturates() {
        assert_eq!(Epoch::new(u64::MAX).plus(2), Epoch::new(u64::MAX));
        assert_eq!(Epoch::new(3).plus(2), Epoch::new(5));
    }
}
