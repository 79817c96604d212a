//! Synthetic device used when the `mock` setting is on
//!
//! Makes no network calls. Every answer is fixed, so a client can be
//! demonstrated without hardware.

use async_trait::async_trait;
use tracing::debug;

use crate::Error;
use crate::model::{Alert, CameraStatus, SirenAction, SirenToggleResponse, SystemStatus};
use crate::traits::DeviceTransport;

/// Alert log bundled into the crate
const MOCK_ALERTS: &str = include_str!("../../mock/alerts.json");

/// Mock device transport
#[derive(Debug, Clone, Copy, Default)]
pub struct MockTransport;

impl MockTransport {
    pub fn new() -> Self {
        Self
    }

    /// Parse the bundled alert log
    pub fn bundled_alerts() -> Result<Vec<Alert>, Error> {
        let records: Vec<serde_json::Value> = serde_json::from_str(MOCK_ALERTS)?;
        Ok(records.into_iter().map(Alert::from_value).collect())
    }
}

#[async_trait]
impl DeviceTransport for MockTransport {
    async fn fetch_alerts(&self) -> Result<Vec<Alert>, Error> {
        Self::bundled_alerts()
    }

    async fn system_status(&self) -> Result<SystemStatus, Error> {
        Ok(SystemStatus::mock_active())
    }

    async fn set_system_enabled(&self, enabled: bool) -> Result<(), Error> {
        debug!("Mock transport: system enabled = {}", enabled);
        Ok(())
    }

    async fn toggle_siren(&self, action: SirenAction) -> Result<SirenToggleResponse, Error> {
        Ok(SirenToggleResponse::mock_success(action))
    }

    async fn camera_status(&self) -> Result<CameraStatus, Error> {
        Ok(CameraStatus::mock_streaming())
    }

    async fn clear_events(&self) -> Result<(), Error> {
        debug!("Mock transport: clearing events");
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceState;

    #[test]
    fn test_bundled_alerts_parse() {
        let alerts = MockTransport::bundled_alerts().unwrap();
        assert!(!alerts.is_empty());
        assert!(alerts.iter().all(|a| a.id.is_some() && a.timestamp.is_some()));
    }

    #[tokio::test]
    async fn test_siren_reply_echoes_action() {
        let reply = MockTransport.toggle_siren(SirenAction::On).await.unwrap();
        assert!(reply.success);
        assert_eq!(reply.siren_state, Some(DeviceState::On));
        assert_eq!(reply.message.as_deref(), Some("Siren turned ON"));
    }
}
