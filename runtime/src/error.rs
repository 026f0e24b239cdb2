//! Hub-level errors — the flattened surface the environment reports.

use palisade_delegation::DelegationError;
use palisade_registry::{ProxyError, RegistryError};
use palisade_types::{AccountId, PalisadeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("{0} is not a known stake proxy")]
    UnknownProxy(AccountId),

    #[error("{0} is not a known delegation ledger")]
    UnknownLedger(AccountId),

    #[error("must be called by the protocol, not {0}")]
    NotProtocolCaller(AccountId),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error(transparent)]
    Delegation(#[from] DelegationError),
}

/// The flattened taxonomy the execution environment reports to callers:
/// authorization failure, precondition violation, or invariant violation.
impl From<HubError> for PalisadeError {
    fn from(e: HubError) -> Self {
        match e {
            HubError::Registry(inner) => inner.into(),
            HubError::Proxy(inner) => inner.into(),
            HubError::Delegation(inner) => inner.into(),
            e @ HubError::NotProtocolCaller(_) => PalisadeError::Unauthorized(e.to_string()),
            e @ (HubError::UnknownProxy(_) | HubError::UnknownLedger(_)) => {
                PalisadeError::Precondition(e.to_string())
            }
            HubError::Config(m) => PalisadeError::Other(m),
            HubError::Serialization(m) => PalisadeError::Serialization(m),
        }
    }
}
