//! Validator registry and per-validator stake proxies.
//!
//! The [`Registry`] owns every [`Validator`] record, the per-epoch locked
//! stake snapshots, and the global epoch counter. A [`StakeProxy`] is the
//! validator-facing surface: it authorizes the validator's owner, forwards
//! balance operations to the registry verbatim, and relays reward
//! notifications to a registered callback target.

pub mod error;
pub mod proxy;
pub mod registry;
pub mod validator;

pub use error::{ProxyError, RegistryError};
pub use proxy::{RewardRelay, StakeProxy};
pub use registry::{Registry, RewardEvent};
pub use validator::Validator;
