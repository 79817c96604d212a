use async_trait::async_trait;
use farmwatch_core::model::{Alert, CameraStatus, SirenAction, SirenToggleResponse, SystemStatus};
use farmwatch_core::stores::SettingsStore;
use farmwatch_core::traits::DeviceTransport;
use farmwatch_core::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Timeout applied to every device request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct SystemRequest {
    enabled: bool,
}

#[derive(Serialize)]
struct SirenRequest {
    action: SirenAction,
}

/// HTTP transport bound to the configured API base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    settings: SettingsStore,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the default 10 s timeout
    pub fn new(settings: SettingsStore) -> Self {
        Self::with_timeout(settings, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(settings: SettingsStore, timeout: Duration) -> Self {
        Self {
            settings,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Absolute URL for `path` under the current API base URL
    fn url(&self, path: &str) -> Result<String> {
        let base = self.settings.get().api_base_url;
        let base = base.trim_end_matches('/');
        if base.is_empty() {
            return Err(Error::transport("API base URL is not configured"));
        }
        Ok(format!("{base}{path}"))
    }

    async fn send(&self, request: reqwest::RequestBuilder, path: &str) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Device answered {} for {}", status, path);
            return Err(Error::http_status(status.as_u16()));
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.get(self.url(path)?);
        let response = self.send(request, path).await?;
        response
            .json()
            .await
            .map_err(|e| Error::transport(format!("Failed to parse response from {}: {}", path, e)))
    }
}

#[async_trait]
impl DeviceTransport for HttpTransport {
    async fn fetch_alerts(&self) -> Result<Vec<Alert>> {
        // The device answers `null` when it has nothing to report. Records
        // are decoded one by one so a malformed entry cannot sink the list.
        let records: Option<Vec<serde_json::Value>> = self.get_json("/alerts").await?;
        let alerts: Vec<Alert> = records
            .unwrap_or_default()
            .into_iter()
            .map(Alert::from_value)
            .collect();
        tracing::debug!("Fetched {} alerts", alerts.len());
        Ok(alerts)
    }

    async fn system_status(&self) -> Result<SystemStatus> {
        self.get_json("/api/system/status").await
    }

    async fn set_system_enabled(&self, enabled: bool) -> Result<()> {
        let path = "/system";
        let request = self
            .client
            .post(self.url(path)?)
            .json(&SystemRequest { enabled });
        self.send(request, path).await?;
        Ok(())
    }

    async fn toggle_siren(&self, action: SirenAction) -> Result<SirenToggleResponse> {
        let path = "/api/system/siren/toggle";
        let request = self
            .client
            .post(self.url(path)?)
            .json(&SirenRequest { action });
        let response = self.send(request, path).await?;
        response
            .json()
            .await
            .map_err(|e| Error::transport(format!("Failed to parse siren reply: {}", e)))
    }

    async fn camera_status(&self) -> Result<CameraStatus> {
        self.get_json("/camera/status").await
    }

    async fn clear_events(&self) -> Result<()> {
        let path = "/api/events/clear";
        let request = self.client.delete(self.url(path)?);
        self.send(request, path).await?;
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "http"
    }
}
