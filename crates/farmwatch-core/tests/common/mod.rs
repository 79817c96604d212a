//! Test doubles and common utilities for client contract tests
//!
//! The doubles count every call so tests can assert on network traffic
//! without a real device.

#![allow(dead_code)]

use async_trait::async_trait;
use farmwatch_core::error::{Error, Result};
use farmwatch_core::model::{
    Alert, CameraStatus, DeviceState, Settings, SirenAction, SirenToggleResponse, SystemStatus,
};
use farmwatch_core::traits::{DeviceTransport, FeedConnector, FeedProgress};
use farmwatch_core::{EventSink, IntentCache, MemoryStateStore, SettingsStore};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// One scripted reply to `fetch_alerts`
#[derive(Debug, Clone)]
pub struct AlertReply {
    pub delay: Duration,
    pub result: std::result::Result<Vec<Alert>, String>,
}

impl AlertReply {
    pub fn ok(alerts: Vec<Alert>) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(alerts),
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(message.to_string()),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A device transport whose answers are set by the test
///
/// Clones share counters and scripted answers.
#[derive(Clone)]
pub struct ScriptedTransport {
    status_calls: Arc<AtomicUsize>,
    set_system_calls: Arc<AtomicUsize>,
    siren_calls: Arc<AtomicUsize>,
    camera_calls: Arc<AtomicUsize>,
    alert_calls: Arc<AtomicUsize>,
    clear_calls: Arc<AtomicUsize>,
    status: Arc<Mutex<std::result::Result<SystemStatus, String>>>,
    set_system_result: Arc<Mutex<std::result::Result<(), String>>>,
    siren_reply: Arc<Mutex<std::result::Result<SirenToggleResponse, String>>>,
    camera: Arc<Mutex<std::result::Result<CameraStatus, String>>>,
    clear_result: Arc<Mutex<std::result::Result<(), String>>>,
    alert_script: Arc<Mutex<VecDeque<AlertReply>>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            status_calls: Arc::new(AtomicUsize::new(0)),
            set_system_calls: Arc::new(AtomicUsize::new(0)),
            siren_calls: Arc::new(AtomicUsize::new(0)),
            camera_calls: Arc::new(AtomicUsize::new(0)),
            alert_calls: Arc::new(AtomicUsize::new(0)),
            clear_calls: Arc::new(AtomicUsize::new(0)),
            status: Arc::new(Mutex::new(Ok(status_with(DeviceState::On)))),
            set_system_result: Arc::new(Mutex::new(Ok(()))),
            siren_reply: Arc::new(Mutex::new(Err("siren not scripted".to_string()))),
            camera: Arc::new(Mutex::new(Ok(CameraStatus::mock_streaming()))),
            clear_result: Arc::new(Mutex::new(Ok(()))),
            alert_script: Arc::new(Mutex::new(VecDeque::new())),
            gate: None,
        }
    }

    /// Block `set_system_enabled` and `toggle_siren` until [`Self::release`]
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    /// Let one blocked control request through
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn set_status(&self, status: std::result::Result<SystemStatus, String>) {
        *self.status.lock().unwrap() = status;
    }

    pub fn set_system_result(&self, result: std::result::Result<(), String>) {
        *self.set_system_result.lock().unwrap() = result;
    }

    pub fn set_siren_reply(&self, reply: std::result::Result<SirenToggleResponse, String>) {
        *self.siren_reply.lock().unwrap() = reply;
    }

    pub fn set_camera(&self, camera: std::result::Result<CameraStatus, String>) {
        *self.camera.lock().unwrap() = camera;
    }

    pub fn set_clear_result(&self, result: std::result::Result<(), String>) {
        *self.clear_result.lock().unwrap() = result;
    }

    /// Queue replies for `fetch_alerts`; an empty queue answers `Ok([])`
    pub fn script_alerts(&self, replies: impl IntoIterator<Item = AlertReply>) {
        self.alert_script.lock().unwrap().extend(replies);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn set_system_calls(&self) -> usize {
        self.set_system_calls.load(Ordering::SeqCst)
    }

    pub fn siren_calls(&self) -> usize {
        self.siren_calls.load(Ordering::SeqCst)
    }

    pub fn camera_calls(&self) -> usize {
        self.camera_calls.load(Ordering::SeqCst)
    }

    pub fn alert_calls(&self) -> usize {
        self.alert_calls.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    /// Every call made, across all endpoints
    pub fn total_calls(&self) -> usize {
        self.status_calls()
            + self.set_system_calls()
            + self.siren_calls()
            + self.camera_calls()
            + self.alert_calls()
            + self.clear_calls()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl DeviceTransport for ScriptedTransport {
    async fn fetch_alerts(&self) -> Result<Vec<Alert>> {
        self.alert_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .alert_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| AlertReply::ok(Vec::new()));

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result.map_err(Error::transport)
    }

    async fn system_status(&self) -> Result<SystemStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status.lock().unwrap().clone().map_err(Error::transport)
    }

    async fn set_system_enabled(&self, _enabled: bool) -> Result<()> {
        self.set_system_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        self.set_system_result
            .lock()
            .unwrap()
            .clone()
            .map_err(Error::transport)
    }

    async fn toggle_siren(&self, _action: SirenAction) -> Result<SirenToggleResponse> {
        self.siren_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        self.siren_reply
            .lock()
            .unwrap()
            .clone()
            .map_err(Error::transport)
    }

    async fn camera_status(&self) -> Result<CameraStatus> {
        self.camera_calls.fetch_add(1, Ordering::SeqCst);
        self.camera.lock().unwrap().clone().map_err(Error::transport)
    }

    async fn clear_events(&self) -> Result<()> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.clear_result
            .lock()
            .unwrap()
            .clone()
            .map_err(Error::transport)
    }

    fn transport_name(&self) -> &'static str {
        "scripted"
    }
}

/// A feed connector that records every URL it was asked to open
///
/// Connections stay open until aborted, unless a failure is scripted.
#[derive(Clone, Default)]
pub struct RecordingConnector {
    opened: Arc<Mutex<Vec<String>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following connection fail immediately
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedConnector for RecordingConnector {
    async fn run(
        &self,
        url: &str,
        on_progress: &(dyn Fn(FeedProgress) + Send + Sync),
    ) -> Result<u64> {
        self.opened.lock().unwrap().push(url.to_string());

        let failure = self.fail_with.lock().unwrap().clone();
        if let Some(message) = failure {
            return Err(Error::feed(message));
        }

        on_progress(FeedProgress::Connected {
            content_type: Some("multipart/x-mixed-replace".to_string()),
        });
        std::future::pending::<()>().await;
        Ok(0)
    }

    fn connector_name(&self) -> &'static str {
        "recording"
    }
}

pub fn status_with(state: DeviceState) -> SystemStatus {
    SystemStatus {
        status: state,
        siren_state: DeviceState::Off,
        ..SystemStatus::default()
    }
}

pub fn alert(id: &str, timestamp: Option<&str>) -> Alert {
    Alert {
        id: Some(id.to_string()),
        timestamp: timestamp.map(str::to_string),
        alert_type: Some("human".to_string()),
        ..Alert::default()
    }
}

pub fn live_settings(api_base_url: &str) -> Settings {
    Settings {
        api_base_url: api_base_url.to_string(),
        mock: false,
        ..Settings::default()
    }
}

/// Settings and intent stores backed by one shared memory store
pub async fn memory_stores(defaults: Settings) -> (MemoryStateStore, SettingsStore, IntentCache) {
    let backing = MemoryStateStore::new();
    let settings = SettingsStore::load(Arc::new(backing.clone()), defaults).await;
    let intent = IntentCache::load(Arc::new(backing.clone())).await;
    (backing, settings, intent)
}

/// An event sink that discards everything
pub fn quiet() -> EventSink {
    EventSink::disabled()
}
