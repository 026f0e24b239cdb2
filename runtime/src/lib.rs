//! Execution environment for the Palisade staking core.
//!
//! The registry, the stake proxies, and the delegation ledgers call each
//! other but never own each other; this crate holds them in a single
//! arena — the [`StakingHub`] — addressed by stable `AccountId` handles.
//! The hub supplies what the core expects from its environment: a caller
//! identity on every operation, the value attached to payable calls, the
//! outbound transfer primitive, and strictly serialized, all-or-nothing
//! call semantics.

pub mod config;
pub mod error;
pub mod hub;
pub mod logging;

pub use config::HubConfig;
pub use error::HubError;
pub use hub::{StakingHub, Transfer};
pub use logging::{init_logging, LogFormat};
