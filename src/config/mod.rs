//! Configuration for the model registry.
//!
//! The registry is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax. Every section is
//! optional; an empty file yields a working configuration that fetches from
//! the public upstream and falls back to the bundled snapshot.
//!
//! # Example
//!
//! ```toml
//! [upstream]
//! api_url = "https://openrouter.ai/api/v1/models"
//! api_key = "${OPENROUTER_API_KEY}"
//!
//! [cache]
//! type = "file"
//! path = "/var/cache/llm-registry"
//!
//! [refresh]
//! enabled = true
//! interval_secs = 900
//! ```

mod cache;
mod observability;
mod upstream;

use std::path::Path;

pub use cache::*;
pub use observability::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
pub use upstream::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Live upstream API.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Bundled snapshot override.
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Persistence for the assembled registry.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Background refresh worker.
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl RegistryConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: RegistryConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.upstream.validate()?;
        self.cache.validate()?;
        self.refresh.validate()?;

        if !self.upstream.enabled && self.snapshot.path.is_none() {
            tracing::debug!("Upstream API disabled; registry will load from the embedded snapshot");
        }

        Ok(())
    }

    /// Generate the JSON schema for the configuration file.
    #[cfg(feature = "json-schema")]
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RegistryConfig)
    }

    /// Generate the JSON schema as a pretty-printed JSON string.
    #[cfg(feature = "json-schema")]
    pub fn json_schema_string() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::json_schema())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

/// Expand `${VAR_NAME}` references. Text from the first `#` on a line is a
/// comment and is copied through untouched.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(input.len());

    for (i, line) in input.split('\n').enumerate() {
        if i > 0 {
            result.push('\n');
        }
        let (code, comment) = line.split_at(line.find('#').unwrap_or(line.len()));

        let mut last_end = 0;
        for cap in ENV_VAR_PATTERN.captures_iter(code) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let value = std::env::var(name.as_str())
                .map_err(|_| ConfigError::EnvVarNotFound(name.as_str().to_string()))?;
            result.push_str(&code[last_end..whole.start()]);
            result.push_str(&value);
            last_end = whole.end();
        }
        result.push_str(&code[last_end..]);
        result.push_str(comment);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RegistryConfig::from_str("").unwrap();

        assert!(config.upstream.enabled);
        assert_eq!(config.upstream.api_url, "https://openrouter.ai/api/v1/models");
        assert_eq!(config.upstream.timeout_secs, 30);
        assert!(config.upstream.api_key.is_none());
        assert!(config.snapshot.path.is_none());
        assert!(config.cache.is_none());
        assert!(!config.refresh.enabled);
        assert_eq!(config.refresh.interval_secs, 3600);
        assert_eq!(config.observability.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_full_config() {
        let config = RegistryConfig::from_str(
            r#"
            [upstream]
            api_url = "http://localhost:9999/models"
            timeout_secs = 5
            user_agent = "test-agent"
            api_key = "sk-or-xxx"

            [snapshot]
            path = "/tmp/models.json"

            [cache]
            type = "file"
            path = "/tmp/registry-cache"

            [refresh]
            enabled = true
            interval_secs = 60

            [observability.logging]
            level = "debug"
            format = "json"
            filter = "llm_registry=trace"
        "#,
        )
        .unwrap();

        assert_eq!(config.upstream.api_url, "http://localhost:9999/models");
        assert_eq!(config.upstream.timeout_secs, 5);
        assert_eq!(config.upstream.user_agent, "test-agent");
        assert_eq!(config.upstream.api_key.as_deref(), Some("sk-or-xxx"));
        assert_eq!(
            config.snapshot.path.as_deref(),
            Some(Path::new("/tmp/models.json"))
        );
        assert!(matches!(
            &config.cache,
            CacheConfig::File(FileCacheConfig { path }) if path == Path::new("/tmp/registry-cache")
        ));
        assert!(config.refresh.enabled);
        assert_eq!(config.refresh.interval_secs, 60);
        assert_eq!(config.observability.logging.level, LogLevel::Debug);
        assert_eq!(config.observability.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_memory_cache_defaults() {
        let config = RegistryConfig::from_str(
            r#"
            [cache]
            type = "memory"
        "#,
        )
        .unwrap();

        match config.cache {
            CacheConfig::Memory(memory) => assert_eq!(memory.max_entries, 16),
            other => panic!("expected memory cache, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = RegistryConfig::from_str(
            r#"
            [upstream]
            api_uri = "https://example.com"
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = RegistryConfig::from_str(
            r#"
            [refresh]
            interval_secs = 0
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_non_http_api_url_rejected() {
        let result = RegistryConfig::from_str(
            r#"
            [upstream]
            api_url = "ftp://example.com/models"
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));

        // Not checked when the stage is disabled
        let config = RegistryConfig::from_str(
            r#"
            [upstream]
            enabled = false
            api_url = ""
        "#,
        )
        .unwrap();
        assert!(!config.upstream.enabled);
    }

    #[test]
    fn test_env_var_expansion() {
        temp_env::with_var("TEST_REGISTRY_API_KEY", Some("sk-secret"), || {
            let result = expand_env_vars("key = \"${TEST_REGISTRY_API_KEY}\"").unwrap();
            assert_eq!(result, "key = \"sk-secret\"");
        });
    }

    #[test]
    fn test_env_var_in_config() {
        temp_env::with_var("TEST_REGISTRY_KEY_IN_CONFIG", Some("sk-from-env"), || {
            let config = RegistryConfig::from_str(
                r#"
                [upstream]
                api_key = "${TEST_REGISTRY_KEY_IN_CONFIG}"
            "#,
            )
            .unwrap();
            assert_eq!(config.upstream.api_key.as_deref(), Some("sk-from-env"));
        });
    }

    #[test]
    fn test_env_var_missing() {
        temp_env::with_var_unset("TEST_REGISTRY_MISSING_VAR", || {
            let result = expand_env_vars("key = \"${TEST_REGISTRY_MISSING_VAR}\"");
            assert!(matches!(
                result,
                Err(ConfigError::EnvVarNotFound(name)) if name == "TEST_REGISTRY_MISSING_VAR"
            ));
        });
    }

    #[test]
    fn test_env_var_in_comment_ignored() {
        let result = expand_env_vars("# api_key = \"${NONEXISTENT_VAR}\"").unwrap();
        assert_eq!(result, "# api_key = \"${NONEXISTENT_VAR}\"");
    }

    #[test]
    fn test_env_var_after_comment_ignored() {
        let result = expand_env_vars("key = \"value\" # ${NONEXISTENT_VAR}").unwrap();
        assert_eq!(result, "key = \"value\" # ${NONEXISTENT_VAR}");
    }

    #[test]
    fn test_env_vars_expanded_per_line() {
        temp_env::with_vars(
            [
                ("TEST_REGISTRY_HOST", Some("models.internal")),
                ("TEST_REGISTRY_PORT", Some("8443")),
            ],
            || {
                let result = expand_env_vars(
                    "url = \"https://${TEST_REGISTRY_HOST}:${TEST_REGISTRY_PORT}\" # ${UNSET_IN_COMMENT}\n\nhost = \"${TEST_REGISTRY_HOST}\"\n",
                )
                .unwrap();
                assert_eq!(
                    result,
                    "url = \"https://models.internal:8443\" # ${UNSET_IN_COMMENT}\n\nhost = \"models.internal\"\n"
                );
            },
        );
    }

    #[test]
    fn test_trailing_newline_preserved() {
        assert_eq!(expand_env_vars("a = 1\n").unwrap(), "a = 1\n");
        assert_eq!(expand_env_vars("a = 1").unwrap(), "a = 1");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");
        std::fs::write(&path, "[refresh]\nenabled = true\n").unwrap();

        let config = RegistryConfig::from_file(&path).unwrap();
        assert!(config.refresh.enabled);

        let missing = RegistryConfig::from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_, _))));
    }

    #[cfg(feature = "json-schema")]
    #[test]
    fn test_json_schema_generation() {
        let schema = RegistryConfig::json_schema_string().unwrap();
        assert!(schema.contains("upstream"));
        assert!(schema.contains("refresh"));
    }
}
