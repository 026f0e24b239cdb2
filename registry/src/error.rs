//! Registry and proxy errors.

use palisade_types::{AccountId, Amount, Epoch, PalisadeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a new validator must stake the minimum amount: need {needed}, got {got}")]
    BelowValidatorMinStake { needed: Amount, got: Amount },

    #[error("owner {0} is already registered")]
    OwnerAlreadyRegistered(AccountId),

    #[error("sign key {0} is already registered")]
    SignKeyAlreadyRegistered(AccountId),

    #[error("{0} is not a registered validator")]
    NotRegistered(AccountId),

    #[error("{0} is not a registered validator owner")]
    UnknownOwner(AccountId),

    #[error("{0} is not a registered sign key")]
    UnknownSignKey(AccountId),

    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("too large withdrawal: requested {requested}, available {available}")]
    WithdrawalTooLarge { requested: Amount, available: Amount },

    #[error("too large stake: {stake} exceeds total balance {balance}")]
    StakeExceedsBalance { stake: Amount, balance: Amount },

    #[error("too small stake: adjustment would take current stake below zero")]
    NegativeStake,

    #[error("incorrect total reward given: declared {declared}, attached {attached}")]
    RewardTotalMismatch { declared: Amount, attached: Amount },

    #[error("distribution for {distributed} would move the counter backwards from {current}")]
    EpochRegression { distributed: Epoch, current: Epoch },

    #[error("arithmetic overflow in balance computation")]
    Overflow,
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("only the validator owner is allowed, not {0}")]
    NotOwner(AccountId),

    #[error("only the registry may deliver rewards, not {0}")]
    NotRegistry(AccountId),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

// Flattening into the shared taxonomy: arithmetic and balance invariants
// are invariant violations, everything else here is a failed precondition.
impl From<RegistryError> for PalisadeError {
    fn from(e: RegistryError) -> Self {
        match e {
            e @ (RegistryError::Overflow
            | RegistryError::StakeExceedsBalance { .. }
            | RegistryError::NegativeStake
            | RegistryError::EpochRegression { .. }) => PalisadeError::Invariant(e.to_string()),
            e => PalisadeError::Precondition(e.to_string()),
        }
    }
}

impl From<ProxyError> for PalisadeError {
    fn from(e: ProxyError) -> Self {
        match e {
            ProxyError::Registry(inner) => inner.into(),
            e => PalisadeError::Unauthorized(e.to_string()),
        }
    }
}
