use proptest::prelude::*;

use palisade_types::{Epoch, StakingParams};

proptest! {
    /// Once a delegation is mature it stays mature as epochs advance.
    #[test]
    fn maturity_is_monotonic_in_now(
        start in 0u64..1_000_000,
        duration in 0u64..1_000,
        now in 0u64..2_000_000,
    ) {
        let from = Epoch::new(start);
        if from.matured(duration, Epoch::new(now)) {
            prop_assert!(from.matured(duration, Epoch::new(now + 1)));
        }
    }

    /// The minimum delegation amount never exceeds the validator minimum.
    #[test]
    fn minimum_delegation_within_validator_min(
        min_stake in 100u128..u64::MAX as u128,
        pct in 0u8..=100,
    ) {
        let params = StakingParams {
            validator_min_stake: min_stake,
            min_delegation_threshold_pct: pct,
            ..StakingParams::network_defaults()
        };
        prop_assert!(params.minimum_delegation_amount() <= params.validator_min_stake);
    }
}
