//! Service configuration with TOML file support.

use agegate_types::ServiceParams;
use agegate_verification::redirect::ProviderSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Invalid(String),
}

/// Access settings for the external bank statement feed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BankFeedSettings {
    pub base_url: String,
    pub token: String,
}

/// Configuration for the agegate service.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Absent sections fall back to
/// their defaults; a missing `identity_provider` or `bank_feed` section
/// puts that side of the service into demo mode.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address to bind the HTTP server to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// HTTP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL of this service, embedded in pairing links.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Seconds between scheduled reconciliation sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Tunable engine parameters.
    #[serde(default)]
    pub params: ServiceParams,

    /// Identity provider endpoints; demo mode when absent.
    #[serde(default)]
    pub identity_provider: Option<ProviderSettings>,

    /// Bank statement feed access; demo mode when absent.
    #[serde(default)]
    pub bank_feed: Option<BankFeedSettings>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8430
}

fn default_public_base_url() -> String {
    "http://localhost:8430".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("ServiceConfig is always serializable to TOML")
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            public_base_url: default_public_base_url(),
            sweep_interval_secs: default_sweep_interval_secs(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            params: ServiceParams::default(),
            identity_provider: None,
            bank_feed: None,
        }
    }
}
