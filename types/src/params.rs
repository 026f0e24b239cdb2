//! Staking parameters — every value the registry and delegation ledgers
//! consult when validating an operation.

use crate::amount::{Amount, STK_UNIT};
use serde::{Deserialize, Serialize};

/// All staking parameters, with the network defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakingParams {
    // ── Validator registry ───────────────────────────────────────────────
    /// Minimum stake (raw units) to register a validator and to remain in
    /// the validator set returned by `sorted_validators`.
    pub validator_min_stake: Amount,

    // ── Delegation ───────────────────────────────────────────────────────
    /// Minimum number of epochs a delegation must have existed before it is
    /// eligible for reward shares.
    pub min_delegation_duration: u64,

    /// Maximum number of delegation entries per ledger.
    pub max_delegators: usize,

    /// Minimum delegation amount as a percentage of `validator_min_stake`.
    pub min_delegation_threshold_pct: u8,

    // ── Withdrawal queue ─────────────────────────────────────────────────
    /// Epochs a queued withdrawal waits before it unlocks.
    ///
    /// Note: this is deliberately NOT derived from `min_delegation_duration`;
    /// the two are independent knobs (4 vs 5 on the default network).
    pub withdrawal_delay_epochs: u64,

    /// Maximum queued withdrawals per delegator.
    pub max_withdrawal_queue_len: usize,
}

impl StakingParams {
    /// Palisade network defaults.
    pub fn network_defaults() -> Self {
        Self {
            validator_min_stake: 10 * STK_UNIT,

            min_delegation_duration: 5,
            max_delegators: 30,
            min_delegation_threshold_pct: 1,

            withdrawal_delay_epochs: 4,
            max_withdrawal_queue_len: 10,
        }
    }

    /// The smallest delegation a ledger accepts.
    pub fn minimum_delegation_amount(&self) -> Amount {
        self.validator_min_stake / 100 * self.min_delegation_threshold_pct as Amount
    }
}

impl Default for StakingParams {
    fn default() -> Self {
        Self::network_defaults()
    }
}
