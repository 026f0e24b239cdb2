//! Top-level error vocabulary shared across crates.

use thiserror::Error;

/// Common error type for the Palisade staking core.
///
/// The component crates define their own precise error enums; this type
/// exists for callers that need a single flattened vocabulary (e.g. when
/// surfacing an aborted operation to the execution environment).
#[derive(Debug, Error)]
pub enum PalisadeError {
    #[error("caller is not authorized: {0}")]
    Unauthorized(String),

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}
