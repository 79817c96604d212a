//! Routes each device call to the live or mock transport
//!
//! The `mock` setting is read on every call, so flipping it takes effect on
//! the next poll without rebuilding anything above this layer.

use async_trait::async_trait;
use std::sync::Arc;

use super::MockTransport;
use crate::Error;
use crate::model::{Alert, CameraStatus, SirenAction, SirenToggleResponse, SystemStatus};
use crate::stores::SettingsStore;
use crate::traits::DeviceTransport;

/// Mode-aware transport
#[derive(Clone)]
pub struct ModeRouter {
    settings: SettingsStore,
    live: Arc<dyn DeviceTransport>,
    mock: Arc<dyn DeviceTransport>,
}

impl ModeRouter {
    /// Route between `live` and the built-in [`MockTransport`]
    pub fn new(settings: SettingsStore, live: Arc<dyn DeviceTransport>) -> Self {
        Self::with_mock(settings, live, Arc::new(MockTransport::new()))
    }

    /// Route between `live` and a custom mock
    pub fn with_mock(
        settings: SettingsStore,
        live: Arc<dyn DeviceTransport>,
        mock: Arc<dyn DeviceTransport>,
    ) -> Self {
        Self {
            settings,
            live,
            mock,
        }
    }

    fn active(&self) -> &dyn DeviceTransport {
        if self.settings.get().mock {
            self.mock.as_ref()
        } else {
            self.live.as_ref()
        }
    }
}

#[async_trait]
impl DeviceTransport for ModeRouter {
    async fn fetch_alerts(&self) -> Result<Vec<Alert>, Error> {
        self.active().fetch_alerts().await
    }

    async fn system_status(&self) -> Result<SystemStatus, Error> {
        self.active().system_status().await
    }

    async fn set_system_enabled(&self, enabled: bool) -> Result<(), Error> {
        self.active().set_system_enabled(enabled).await
    }

    async fn toggle_siren(&self, action: SirenAction) -> Result<SirenToggleResponse, Error> {
        self.active().toggle_siren(action).await
    }

    async fn camera_status(&self) -> Result<CameraStatus, Error> {
        self.active().camera_status().await
    }

    async fn clear_events(&self) -> Result<(), Error> {
        self.active().clear_events().await
    }

    fn transport_name(&self) -> &'static str {
        self.active().transport_name()
    }
}

impl std::fmt::Debug for ModeRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeRouter")
            .field("live", &self.live.transport_name())
            .field("mock", &self.mock.transport_name())
            .finish()
    }
}
