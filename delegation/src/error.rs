//! Delegation ledger errors.

use palisade_registry::{ProxyError, RegistryError};
use palisade_types::{AccountId, Amount, PalisadeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DelegationError {
    #[error("only the bound stake proxy may deliver rewards, not {0}")]
    NotProxy(AccountId),

    #[error("cannot delegate stake to own stake")]
    SelfDelegation,

    #[error("delegated funds do not suffice required minimum: need {needed}, got {got}")]
    BelowMinimumDelegation { needed: Amount, got: Amount },

    #[error("allowed amount of delegators per ledger exceeded ({0})")]
    TooManyDelegators(usize),

    #[error("no delegated stakes found for {0}")]
    NoDelegations(AccountId),

    #[error("no accrued rewards to withdraw")]
    NothingToWithdraw,

    #[error("no pending withdrawal has reached its unlock epoch")]
    NoMaturedWithdrawals,

    #[error("withdrawal queue is full: {len} of {max} entries used")]
    WithdrawalQueueFull { len: usize, max: usize },

    #[error("arithmetic overflow in delegation computation")]
    Overflow,

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<DelegationError> for PalisadeError {
    fn from(e: DelegationError) -> Self {
        match e {
            DelegationError::Proxy(inner) => inner.into(),
            DelegationError::Registry(inner) => inner.into(),
            e @ DelegationError::NotProxy(_) => PalisadeError::Unauthorized(e.to_string()),
            e @ DelegationError::Overflow => PalisadeError::Invariant(e.to_string()),
            e => PalisadeError::Precondition(e.to_string()),
        }
    }
}
