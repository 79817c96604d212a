//! Data model shared by the stores, transports and views
//!
//! Wire types mirror the device's JSON exactly (snake_case for device
//! payloads, camelCase for the persisted settings record).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::cmp::Reverse;
use std::fmt;
use tracing::warn;

/// User-editable client settings
///
/// Persisted under the `settings` key. Defaults live in [`crate::config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Base URL of the device API (may be empty)
    pub api_base_url: String,
    /// Direct stream URL used when the API cannot serve the feed
    pub stream_url: String,
    /// Background image URL (opaque to the core)
    pub bg_url: String,
    /// Substitute synthetic data for every device call
    pub mock: bool,
}

impl Settings {
    /// Apply a partial update, leaving unset keys untouched
    pub fn merge(&mut self, patch: SettingsPatch) {
        if let Some(api_base_url) = patch.api_base_url {
            self.api_base_url = api_base_url;
        }
        if let Some(stream_url) = patch.stream_url {
            self.stream_url = stream_url;
        }
        if let Some(bg_url) = patch.bg_url {
            self.bg_url = bg_url;
        }
        if let Some(mock) = patch.mock {
            self.mock = mock;
        }
    }
}

/// Partial settings update
///
/// Also used to read persisted records, so a record written by an older
/// client with fewer keys still loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock: Option<bool>,
}

impl SettingsPatch {
    pub fn api_base_url(mut self, value: impl Into<String>) -> Self {
        self.api_base_url = Some(value.into());
        self
    }

    pub fn stream_url(mut self, value: impl Into<String>) -> Self {
        self.stream_url = Some(value.into());
        self
    }

    pub fn bg_url(mut self, value: impl Into<String>) -> Self {
        self.bg_url = Some(value.into());
        self
    }

    pub fn mock(mut self, value: bool) -> Self {
        self.mock = Some(value);
        self
    }

    /// True when the patch would change nothing
    pub fn is_empty(&self) -> bool {
        self.api_base_url.is_none()
            && self.stream_url.is_none()
            && self.bg_url.is_none()
            && self.mock.is_none()
    }
}

impl From<Settings> for SettingsPatch {
    fn from(settings: Settings) -> Self {
        Self {
            api_base_url: Some(settings.api_base_url),
            stream_url: Some(settings.stream_url),
            bg_url: Some(settings.bg_url),
            mock: Some(settings.mock),
        }
    }
}

/// Locally cached belief about whether the system is armed
///
/// Persisted under the `system` key. Never authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemIntent {
    pub enabled: bool,
}

impl Default for SystemIntent {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Tri-state switch reported by the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceState {
    On,
    Off,
    #[default]
    #[serde(other)]
    Unknown,
}

impl DeviceState {
    pub fn is_on(self) -> bool {
        self == DeviceState::On
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceState::On => f.write_str("ON"),
            DeviceState::Off => f.write_str("OFF"),
            DeviceState::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// Authoritative system status (`GET /api/system/status`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub status: DeviceState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_display: Option<String>,
    #[serde(default)]
    pub siren_state: DeviceState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_connected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SystemStatus {
    /// Stand-in used when the device could not be reached
    pub fn unknown() -> Self {
        Self {
            status: DeviceState::Unknown,
            siren_state: DeviceState::Unknown,
            message: Some("Failed to fetch status".to_string()),
            ..Self::default()
        }
    }

    /// Fixed status served in mock mode
    pub fn mock_active() -> Self {
        Self {
            status: DeviceState::On,
            siren_state: DeviceState::Off,
            message: Some("System is active.".to_string()),
            ..Self::default()
        }
    }

    pub fn is_on(&self) -> bool {
        self.status.is_on()
    }
}

/// Camera connection state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraState {
    Streaming,
    #[default]
    #[serde(other)]
    Disconnected,
}

/// Camera status (`GET /camera/status`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraStatus {
    #[serde(default)]
    pub status: CameraState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_active: Option<bool>,
}

impl CameraStatus {
    /// Stand-in used when the device could not be reached
    pub fn disconnected() -> Self {
        Self {
            status: CameraState::Disconnected,
            url: Some(String::new()),
            system_active: Some(false),
        }
    }

    /// Fixed status served in mock mode
    pub fn mock_streaming() -> Self {
        Self {
            status: CameraState::Streaming,
            url: Some("http://192.168.43.77/".to_string()),
            system_active: Some(true),
        }
    }
}

/// Requested siren position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SirenAction {
    On,
    Off,
}

impl SirenAction {
    /// Action that moves the siren away from `currently_on`
    pub fn toggling(currently_on: bool) -> Self {
        if currently_on {
            SirenAction::Off
        } else {
            SirenAction::On
        }
    }

    pub fn as_state(self) -> DeviceState {
        match self {
            SirenAction::On => DeviceState::On,
            SirenAction::Off => DeviceState::Off,
        }
    }
}

impl fmt::Display for SirenAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_state().fmt(f)
    }
}

/// Device reply to `POST /api/system/siren/toggle`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SirenToggleResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siren_state: Option<DeviceState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SirenToggleResponse {
    /// Deterministic reply served in mock mode
    pub fn mock_success(action: SirenAction) -> Self {
        Self {
            success: true,
            siren_state: Some(action.as_state()),
            message: Some(format!("Siren turned {action}")),
        }
    }
}

/// What a detection was classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionKind {
    Human,
    AnimalOrOther,
}

impl fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionKind::Human => f.write_str("Human"),
            DetectionKind::AnimalOrOther => f.write_str("Animal/Other"),
        }
    }
}

/// Stable identity of an alert within a rendered list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlertKey {
    Id(String),
    Timestamp(String),
    Position(usize),
}

/// One entry of the detection log (`GET /alerts`)
///
/// Every field is optional; the device has shipped several shapes of this
/// record over time. A field of the wrong JSON type reads as absent (or, for
/// labels, as its number rendered as text) instead of failing the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_label", skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_label", skip_serializing_if = "Option::is_none")]
    pub detection_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_label", skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, deserialize_with = "lenient_label", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub siren: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub notified: Option<bool>,
    #[serde(default, deserialize_with = "lenient_label", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_label", skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

impl Alert {
    /// Decode one element of an alert list
    ///
    /// An element that is not a record at all becomes an empty alert, so it
    /// still shows up (with the usual fallbacks) and never costs the rest of
    /// the list.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Malformed alert record, showing it with defaults: {}", e);
            Self::default()
        })
    }

    /// Parsed timestamp, or the epoch when missing or unparsable
    pub fn effective_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// `id`, then `timestamp`, then the position in the list
    pub fn key(&self, position: usize) -> AlertKey {
        if let Some(id) = non_empty(self.id.as_deref()) {
            return AlertKey::Id(id.to_string());
        }
        if let Some(timestamp) = non_empty(self.timestamp.as_deref()) {
            return AlertKey::Timestamp(timestamp.to_string());
        }
        AlertKey::Position(position)
    }

    pub fn detection_type(&self) -> &str {
        non_empty(self.alert_type.as_deref())
            .or_else(|| non_empty(self.detection_type.as_deref()))
            .unwrap_or("Unknown")
    }

    pub fn kind(&self) -> DetectionKind {
        if self.detection_type().eq_ignore_ascii_case("human") {
            DetectionKind::Human
        } else {
            DetectionKind::AnimalOrOther
        }
    }

    pub fn device(&self) -> &str {
        non_empty(self.device.as_deref())
            .or_else(|| non_empty(self.device_id.as_deref()))
            .unwrap_or("Unknown Device")
    }

    /// Human-readable time, `"Unknown time"` when it cannot be parsed
    pub fn display_time(&self) -> String {
        self.timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .map(|ts| ts.format("%d/%m/%Y, %H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown time".to_string())
    }
}

/// Sort newest first by effective timestamp, keeping fetch order for ties
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by_cached_key(|alert| Reverse(alert.effective_timestamp()));
}

/// Parse an ISO-8601 timestamp
///
/// Accepts RFC 3339, naive date-times (read as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Alert ids arrive as strings or integers
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Only strings are timestamps; anything else sorts as the epoch
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

fn lenient_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Some(flag),
        _ => None,
    })
}
