//! Per-validator delegation ledger.
//!
//! One [`DelegationLedger`] per validator that accepts pooled stake. The
//! ledger owns the delegation list and the withdrawal queues, receives the
//! reward callback from the validator's stake proxy, splits rewards
//! proportionally among delegations that have been staked long enough, and
//! queues withdrawals the validator cannot cover immediately.

pub mod error;
pub mod ledger;
pub mod reward_split;
pub mod withdrawal;

pub use error::DelegationError;
pub use ledger::{DelegatedStake, DelegationLedger, WithdrawOutcome};
pub use reward_split::reward_share;
pub use withdrawal::{PendingWithdrawal, WithdrawalQueue};
