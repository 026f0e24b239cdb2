//! Proportional reward split.
//!
//! Pure computation, no ledger state: each eligible delegation receives
//! `floor(amount × stake / total_eligible)`. The product is taken in 256
//! bits so nothing is rounded before the single floor division — never
//! floating point, so every node computes the same shares.
//!
//! The floor means the distributed total can fall short of `amount` by up
//! to `eligible_count − 1` raw units; that remainder is not tracked or
//! redistributed.

use palisade_types::Amount;
use primitive_types::U256;

/// One delegation's share of `amount`, weighted by its stake.
///
/// Requires `stake <= total_eligible` (the stake is a summand of the
/// total); the share then never exceeds `amount`.
pub fn reward_share(amount: Amount, stake: Amount, total_eligible: Amount) -> Amount {
    if amount == 0 || stake == 0 || total_eligible == 0 {
        return 0;
    }
    debug_assert!(stake <= total_eligible);
    let share = U256::from(amount) * U256::from(stake) / U256::from(total_eligible);
    // share <= amount because stake <= total_eligible, so this cannot overflow.
    share.as_u128()
}

/// Split `amount` across `stakes`, returning one share per entry.
pub fn split(amount: Amount, stakes: &[Amount]) -> Vec<Amount> {
    let total: Amount = stakes.iter().fold(0, |acc, s| acc.saturating_add(*s));
    stakes
        .iter()
        .map(|stake| reward_share(amount, *stake, total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_delegation_takes_everything() {
        assert_eq!(reward_share(1000, 100, 100), 1000);
    }

    #[test]
    fn equal_stakes_split_evenly() {
        assert_eq!(split(1000, &[100, 100]), vec![500, 500]);
    }

    #[test]
    fn shares_are_proportional() {
        assert_eq!(split(1000, &[300, 100]), vec![750, 250]);
    }

    #[test]
    fn floor_rounds_down() {
        // 1000 * 1 / 3 = 333.33… → 333
        assert_eq!(split(1000, &[1, 1, 1]), vec![333, 333, 333]);
    }

    #[test]
    fn remainder_is_bounded_by_entry_count() {
        let shares = split(1000, &[7, 11, 13]);
        let distributed: Amount = shares.iter().sum();
        assert!(distributed <= 1000);
        assert!(1000 - distributed < 3);
    }

    #[test]
    fn zero_total_yields_zero_shares() {
        assert_eq!(reward_share(1000, 0, 0), 0);
        assert_eq!(split(1000, &[]), Vec::<Amount>::new());
    }

    #[test]
    fn large_values_do_not_truncate_before_the_floor() {
        // amount * stake overflows u128; the U256 product must not.
        let amount = u128::MAX / 2;
        let stake = u128::MAX / 3;
        let total = u128::MAX / 2;
        let share = reward_share(amount, stake, total);
        // stake / total = 2/3 of amount, up to flooring.
        let expected = (U256::from(amount) * U256::from(stake) / U256::from(total)).as_u128();
        assert_eq!(share, expected);
        assert!(share <= amount);
    }
}
