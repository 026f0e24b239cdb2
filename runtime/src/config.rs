//! Hub configuration with TOML file support.

use serde::{Deserialize, Serialize};

use palisade_types::StakingParams;

use crate::HubError;

/// Configuration for a staking hub.
///
/// Can be loaded from a TOML file via [`HubConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Amount-valued parameters
/// (`validator_min_stake`) are not TOML-configurable — they come from
/// genesis, like the rest of [`StakingParams`] when a field is omitted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HubConfig {
    /// Identity of the protocol driver allowed to lock stake.
    #[serde(default = "default_protocol_owner")]
    pub protocol_owner: String,

    /// Epochs a delegation must age before it earns reward shares.
    #[serde(default = "default_min_delegation_duration")]
    pub min_delegation_duration: u64,

    /// Maximum delegation entries per ledger.
    #[serde(default = "default_max_delegators")]
    pub max_delegators: usize,

    /// Minimum delegation as a percentage of the validator minimum.
    #[serde(default = "default_min_delegation_threshold_pct")]
    pub min_delegation_threshold_pct: u8,

    /// Epochs a queued withdrawal waits before unlocking.
    #[serde(default = "default_withdrawal_delay_epochs")]
    pub withdrawal_delay_epochs: u64,

    /// Maximum queued withdrawals per delegator.
    #[serde(default = "default_max_withdrawal_queue_len")]
    pub max_withdrawal_queue_len: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_protocol_owner() -> String {
    "pal_protocol".to_string()
}

fn default_min_delegation_duration() -> u64 {
    StakingParams::network_defaults().min_delegation_duration
}

fn default_max_delegators() -> usize {
    StakingParams::network_defaults().max_delegators
}

fn default_min_delegation_threshold_pct() -> u8 {
    StakingParams::network_defaults().min_delegation_threshold_pct
}

fn default_withdrawal_delay_epochs() -> u64 {
    StakingParams::network_defaults().withdrawal_delay_epochs
}

fn default_max_withdrawal_queue_len() -> usize {
    StakingParams::network_defaults().max_withdrawal_queue_len
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HubConfig {
    fn default() -> Self {
        // All fields defaulted — round-trips through an empty TOML document.
        toml::from_str("").expect("empty config is always valid")
    }
}

impl HubConfig {
    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, HubError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| HubError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, HubError> {
        toml::from_str(s).map_err(|e| HubError::Config(e.to_string()))
    }

    /// Serialize this configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("HubConfig is always serializable to TOML")
    }

    /// The staking parameters this configuration describes, with the
    /// genesis defaults for everything not TOML-configurable.
    pub fn staking_params(&self) -> StakingParams {
        StakingParams {
            min_delegation_duration: self.min_delegation_duration,
            max_delegators: self.max_delegators,
            min_delegation_threshold_pct: self.min_delegation_threshold_pct,
            withdrawal_delay_epochs: self.withdrawal_delay_epochs,
            max_withdrawal_queue_len: self.max_withdrawal_queue_len,
            ..StakingParams::network_defaults()
        }
    }
}
