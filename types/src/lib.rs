//! Fundamental types for the Palisade staking core.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: account identities, amounts, epochs, staking parameters,
//! and the common error vocabulary.

pub mod account;
pub mod amount;
pub mod epoch;
pub mod error;
pub mod params;

pub use account::AccountId;
pub use amount::{Amount, STK_UNIT};
pub use epoch::Epoch;
pub use error::PalisadeError;
pub use params::StakingParams;
