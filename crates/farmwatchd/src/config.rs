//! Environment configuration
//!
//! All configuration is read from `FARMWATCH_*` environment variables:
//!
//! ### Device
//! - `FARMWATCH_API_BASE_URL`: Base URL of the device API
//! - `FARMWATCH_STREAM_URL`: Direct stream URL (used in mock mode)
//! - `FARMWATCH_BG_URL`: Background image URL
//! - `FARMWATCH_USE_MOCK`: `true` to answer from bundled data
//!
//! ### State Store
//! - `FARMWATCH_STATE_STORE_TYPE`: `file` or `memory`
//! - `FARMWATCH_STATE_DIR`: Directory holding the record files
//!
//! ### Polling
//! - `FARMWATCH_STATUS_POLL_SECS`, `FARMWATCH_CAMERA_POLL_SECS`,
//!   `FARMWATCH_ALERT_REFRESH_SECS`
//!
//! ### Logging
//! - `FARMWATCH_LOG_LEVEL`: trace, debug, info, warn or error
//!
//! Values set here only seed the settings record; once the user changes a
//! setting, the persisted value wins.

use anyhow::{Context, Result};
use farmwatch_core::config::{DEFAULT_API_BASE_URL, DEFAULT_BG_URL};
use farmwatch_core::model::Settings;
use farmwatch_core::{ClientConfig, EngineConfig, StateStoreConfig};
use std::env;
use tracing::Level;

const DEFAULT_STATE_DIR: &str = "./.farmwatch";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub stream_url: String,
    pub bg_url: String,
    pub use_mock: bool,
    pub state_store_type: String,
    pub state_dir: String,
    pub status_poll_secs: u64,
    pub camera_poll_secs: u64,
    pub alert_refresh_secs: u64,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let engine = EngineConfig::default();
        let secs = |name: &str, default: u64| -> Result<u64> {
            match lookup(name) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a whole number of seconds, got '{}'", name, raw)),
                None => Ok(default),
            }
        };

        Ok(Self {
            api_base_url: lookup("FARMWATCH_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            stream_url: lookup("FARMWATCH_STREAM_URL").unwrap_or_default(),
            bg_url: lookup("FARMWATCH_BG_URL").unwrap_or_else(|| DEFAULT_BG_URL.to_string()),
            use_mock: lookup("FARMWATCH_USE_MOCK")
                .map(|raw| raw.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(true),
            state_store_type: lookup("FARMWATCH_STATE_STORE_TYPE")
                .unwrap_or_else(|| "file".to_string()),
            state_dir: lookup("FARMWATCH_STATE_DIR")
                .unwrap_or_else(|| DEFAULT_STATE_DIR.to_string()),
            status_poll_secs: secs("FARMWATCH_STATUS_POLL_SECS", engine.status_poll_secs)?,
            camera_poll_secs: secs("FARMWATCH_CAMERA_POLL_SECS", engine.camera_poll_secs)?,
            alert_refresh_secs: secs("FARMWATCH_ALERT_REFRESH_SECS", engine.alert_refresh_secs)?,
            log_level: lookup("FARMWATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// URLs are not checked; a bad URL shows up as a transport failure the
    /// same way an unreachable device does.
    pub fn validate(&self) -> Result<()> {
        match self.state_store_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "FARMWATCH_STATE_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.state_store_type
            ),
        }

        if self.state_store_type == "file" && self.state_dir.trim().is_empty() {
            anyhow::bail!(
                "FARMWATCH_STATE_DIR cannot be empty when FARMWATCH_STATE_STORE_TYPE=file"
            );
        }

        for (name, value) in [
            ("FARMWATCH_STATUS_POLL_SECS", self.status_poll_secs),
            ("FARMWATCH_CAMERA_POLL_SECS", self.camera_poll_secs),
            ("FARMWATCH_ALERT_REFRESH_SECS", self.alert_refresh_secs),
        ] {
            if !(1..=3600).contains(&value) {
                anyhow::bail!("{} must be between 1 and 3600 seconds. Got: {}", name, value);
            }
        }

        self.level()?;
        Ok(())
    }

    /// Tracing level named by `FARMWATCH_LOG_LEVEL`
    pub fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "FARMWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Core configuration seeded from the environment
    pub fn client_config(&self) -> ClientConfig {
        let state_store = match self.state_store_type.as_str() {
            "memory" => StateStoreConfig::Memory,
            _ => StateStoreConfig::File {
                dir: self.state_dir.clone(),
            },
        };

        ClientConfig {
            defaults: Settings {
                api_base_url: self.api_base_url.clone(),
                stream_url: self.stream_url.clone(),
                bg_url: self.bg_url.clone(),
                mock: self.use_mock,
            },
            state_store,
            engine: EngineConfig {
                status_poll_secs: self.status_poll_secs,
                camera_poll_secs: self.camera_poll_secs,
                alert_refresh_secs: self.alert_refresh_secs,
                ..EngineConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.stream_url, "");
        assert!(config.use_mock);
        assert_eq!(config.state_store_type, "file");
        assert_eq!(config.state_dir, DEFAULT_STATE_DIR);
        assert_eq!(config.status_poll_secs, 3);
        assert_eq!(config.camera_poll_secs, 5);
        assert_eq!(config.alert_refresh_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_use_mock_is_case_insensitive_true() {
        assert!(config_with(&[("FARMWATCH_USE_MOCK", "TRUE")]).unwrap().use_mock);
        assert!(!config_with(&[("FARMWATCH_USE_MOCK", "false")]).unwrap().use_mock);
        assert!(!config_with(&[("FARMWATCH_USE_MOCK", "yes")]).unwrap().use_mock);
    }

    #[test]
    fn test_non_numeric_interval_is_error() {
        let err = config_with(&[("FARMWATCH_STATUS_POLL_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("FARMWATCH_STATUS_POLL_SECS"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = config_with(&[("FARMWATCH_STATE_STORE_TYPE", "redis")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_with(&[("FARMWATCH_CAMERA_POLL_SECS", "0")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_with(&[("FARMWATCH_LOG_LEVEL", "loud")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_with(&[("FARMWATCH_STATE_DIR", "  ")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_with(&[
            ("FARMWATCH_STATE_STORE_TYPE", "memory"),
            ("FARMWATCH_STATE_DIR", ""),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_config_carries_environment() {
        let config = config_with(&[
            ("FARMWATCH_API_BASE_URL", "http://10.0.0.2:8000"),
            ("FARMWATCH_USE_MOCK", "false"),
            ("FARMWATCH_STATE_STORE_TYPE", "memory"),
            ("FARMWATCH_ALERT_REFRESH_SECS", "30"),
        ])
        .unwrap();

        let client = config.client_config();
        assert_eq!(client.defaults.api_base_url, "http://10.0.0.2:8000");
        assert!(!client.defaults.mock);
        assert!(matches!(client.state_store, StateStoreConfig::Memory));
        assert_eq!(client.engine.alert_refresh_secs, 30);
        assert!(client.validate().is_ok());
    }
}
