//! Configuration types for the Farmwatch client
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::Settings;

/// Default API base URL when none is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Default background image URL
pub const DEFAULT_BG_URL: &str = "https://images.unsplash.com/photo-1469474968028-56623f02e42e?q=80&w=1600&auto=format&fit=crop";

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Settings used when nothing has been persisted yet
    #[serde(default)]
    pub defaults: Settings,

    /// State store configuration
    #[serde(default)]
    pub state_store: StateStoreConfig,

    /// Polling and channel settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ClientConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            defaults: Settings::default(),
            state_store: StateStoreConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    ///
    /// URLs are deliberately not checked: a malformed URL is accepted and
    /// surfaces later as a transport failure.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.state_store.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            stream_url: String::new(),
            bg_url: DEFAULT_BG_URL.to_string(),
            mock: true,
        }
    }
}

/// State store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// One JSON file per record inside `dir`
    File {
        /// Directory holding the record files
        dir: String,
    },

    /// In-memory state store (not persistent)
    #[default]
    Memory,
}

impl StateStoreConfig {
    /// Validate the state store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StateStoreConfig::File { dir } if dir.is_empty() => Err(crate::Error::config(
                "File state store directory cannot be empty",
            )),
            _ => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &'static str {
        match self {
            StateStoreConfig::File { .. } => "file",
            StateStoreConfig::Memory => "memory",
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between system status polls (in seconds)
    #[serde(default = "default_status_poll_secs")]
    pub status_poll_secs: u64,

    /// Interval between camera status polls (in seconds)
    #[serde(default = "default_camera_poll_secs")]
    pub camera_poll_secs: u64,

    /// Interval between alert log refreshes (in seconds)
    #[serde(default = "default_alert_refresh_secs")]
    pub alert_refresh_secs: u64,

    /// Timeout applied to every device request (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.status_poll_secs == 0 {
            return Err(crate::Error::config("Status poll interval must be > 0"));
        }
        if self.camera_poll_secs == 0 {
            return Err(crate::Error::config("Camera poll interval must be > 0"));
        }
        if self.alert_refresh_secs == 0 {
            return Err(crate::Error::config("Alert refresh interval must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_secs)
    }

    pub fn camera_poll_interval(&self) -> Duration {
        Duration::from_secs(self.camera_poll_secs)
    }

    pub fn alert_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.alert_refresh_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            status_poll_secs: default_status_poll_secs(),
            camera_poll_secs: default_camera_poll_secs(),
            alert_refresh_secs: default_alert_refresh_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_status_poll_secs() -> u64 {
    3
}

fn default_camera_poll_secs() -> u64 {
    5
}

fn default_alert_refresh_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_event_channel_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.defaults.mock);
        assert_eq!(config.defaults.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.engine.status_poll_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = ClientConfig::default();
        config.engine.alert_refresh_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_state_dir_rejected() {
        let config = ClientConfig {
            state_store: StateStoreConfig::File { dir: String::new() },
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_config_partial_deserialize() {
        let engine: EngineConfig = serde_json::from_str(r#"{"status_poll_secs": 7}"#).unwrap();
        assert_eq!(engine.status_poll_secs, 7);
        assert_eq!(engine.alert_refresh_secs, 10);
    }

    #[test]
    fn test_request_timeout_follows_secs() {
        let engine: EngineConfig =
            serde_json::from_str(r#"{"request_timeout_secs": 4}"#).unwrap();
        assert_eq!(engine.request_timeout(), Duration::from_secs(4));
    }
}
