use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Upstream aggregator API (first stage of the fallback chain).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Whether the API stage is attempted at all.
    /// When disabled the chain starts at the bundled snapshot.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Model list endpoint. Must return `{ "data": [...] }`.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Transport timeout for the list request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with the request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional API key, sent as a bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            api_key: None,
        }
    }
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled {
            let url = self.api_url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "upstream.api_url must be an http(s) URL, got '{}'",
                    self.api_url
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "upstream.timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_api_url() -> String {
    "https://openrouter.ai/api/v1/models".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("llm-registry/{}", env!("CARGO_PKG_VERSION"))
}

/// Bundled snapshot (second stage of the fallback chain).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct SnapshotConfig {
    /// Read the snapshot from this file instead of the copy embedded at build time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Periodic background refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct RefreshConfig {
    #[serde(default)]
    pub enabled: bool,

    /// How often the worker checks the registry for staleness.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval_secs(),
        }
    }
}

impl RefreshConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "refresh.interval_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

// Default: hourly
fn default_interval_secs() -> u64 {
    3600
}
