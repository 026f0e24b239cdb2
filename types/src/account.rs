//! Account identity type with `pal_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Palisade account identity, always prefixed with `pal_`.
///
/// Identities are opaque comparable tokens: the core only ever compares
/// them for equality and ordering, it never inspects their structure.
/// Validators, proxies, ledgers, and delegators are all addressed this way.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// The standard prefix for all Palisade identities.
    pub const PREFIX: &'static str = "pal_";

    /// Create a new account identity from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `pal_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "identity must start with pal_");
        Self(s)
    }

    /// Return the raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this identity is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
