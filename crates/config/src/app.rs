//! App-level settings
//!
//! Loaded at startup from YAML files and environment variables. These cover
//! the pieces the voice session needs from its surroundings: where the
//! credential backend lives, where user preferences are stored, and how the
//! process logs.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Credential backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// User preference storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.endpoint.is_empty() {
            return Err(ConfigError::invalid(
                "backend.endpoint",
                "endpoint must not be empty",
            ));
        }
        if self.backend.request_timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "backend.request_timeout_seconds",
                "timeout must be at least 1 second",
            ));
        }
        if self.storage.path.is_empty() {
            return Err(ConfigError::invalid(
                "storage.path",
                "settings path must not be empty",
            ));
        }
        Ok(())
    }
}

/// Where the ephemeral-credential endpoint lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the worker backend that issues ephemeral keys
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Timeout for the one-shot credential call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8787".to_string()
}
fn default_request_timeout() -> u64 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Where user preferences are persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON settings document
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_path() -> String {
    "roots-settings.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment.
///
/// Priority (highest to lowest):
/// 1. Environment variables (`ROOTS_` prefix, `__` separator)
/// 2. `config/{env}.yaml` (if env specified)
/// 3. `config/default.yaml`
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("ROOTS")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.backend.endpoint, "http://127.0.0.1:8787");
        assert_eq!(settings.observability.log_level, "info");
    }

    #[test]
    fn test_validation_rejects_empty_endpoint() {
        let mut settings = Settings::default();
        settings.backend.endpoint.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut settings = Settings::default();
        settings.backend.request_timeout_seconds = 0;
        assert!(settings.validate().is_err());
    }
}
