//! Token amounts.
//!
//! Amounts are raw `u128` units to avoid floating-point errors. The
//! smallest unit is 1 raw; `STK_UNIT` is the canonical display unit.

/// A token amount in raw units.
pub type Amount = u128;

/// One whole STK expressed in raw units (10^18, aetto-style subdivision).
pub const STK_UNIT: Amount = 1_000_000_000_000_000_000;
