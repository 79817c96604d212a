//! Client engine
//!
//! The ClientEngine wires the components together and owns the timers of
//! each active view:
//!
//! | View        | Timers / sessions                                   |
//! |-------------|-----------------------------------------------------|
//! | `Dashboard` | status poll (reconciler)                            |
//! | `LiveFeed`  | camera status poll, feed session                    |
//! | `Alerts`    | alert auto-refresh                                  |
//!
//! ## Architecture
//!
//! ```text
//!                ┌──────────────┐
//!                │ SettingsStore│──── subscribe ───┐
//!                └──────────────┘                  │
//!                       │ mock?                    ▼
//! ┌────────────┐  ┌──────────────┐          ┌─────────────┐
//! │ live/mock  │◀─│  ModeRouter  │          │ FeedSession │
//! └────────────┘  └──────────────┘          └─────────────┘
//!                       │
//!      ┌────────────────┼──────────────┬──────────────┐
//!      ▼                ▼              ▼              ▼
//! ┌──────────┐   ┌────────────┐  ┌──────────┐  ┌───────────┐
//! │Reconciler│   │ Actuators  │  │ Camera   │  │ AlertFeed │
//! └──────────┘   └────────────┘  └──────────┘  └───────────┘
//!      │                │
//!      └──▶ IntentCache ◀┘
//! ```
//!
//! Every component emits [`EngineEvent`]s into one bounded channel.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info};

use crate::actuator::{SirenActuator, SystemActuator};
use crate::alerts::AlertFeed;
use crate::camera::CameraMonitor;
use crate::config::{ClientConfig, EngineConfig};
use crate::error::Result;
use crate::feed::FeedSession;
use crate::reconciler::StatusReconciler;
use crate::scheduler::{PollHandle, spawn_poll};
use crate::stores::{IntentCache, SettingsStore};
use crate::traits::{DeviceTransport, FeedConnector, StateStore};
use crate::transport::ModeRouter;

pub use crate::events::{EngineEvent, EventSink, View};

/// Timers and sessions owned by one active view
#[derive(Debug, Default)]
struct ViewHandles {
    polls: Vec<PollHandle>,
    feed: Option<FeedSession>,
}

impl ViewHandles {
    async fn shutdown(self) {
        for poll in self.polls {
            poll.cancel().await;
        }
        if let Some(feed) = self.feed {
            feed.stop().await;
        }
    }
}

/// Core client engine
///
/// ## Lifecycle
///
/// 1. Create with [`ClientEngine::new()`]
/// 2. Activate views with [`ClientEngine::activate()`] (or run with
///    [`ClientEngine::run()`])
/// 3. Deactivate views to stop their timers
/// 4. Call [`ClientEngine::shutdown()`] to stop everything and flush state
pub struct ClientEngine {
    engine_config: EngineConfig,
    state_store: Arc<dyn StateStore>,
    settings: SettingsStore,
    intent: IntentCache,
    transport: Arc<dyn DeviceTransport>,
    connector: Arc<dyn FeedConnector>,
    reconciler: StatusReconciler,
    camera: CameraMonitor,
    system: SystemActuator,
    siren: SirenActuator,
    alerts: AlertFeed,
    events: EventSink,
    active: Mutex<HashMap<View, ViewHandles>>,
}

impl ClientEngine {
    /// Create a new client engine
    ///
    /// # Parameters
    ///
    /// - `config`: Client configuration (validated here)
    /// - `state_store`: Backing store for the `settings` and `system` records
    /// - `live`: Transport used when the `mock` setting is off
    /// - `connector`: Connector for the live feed
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub async fn new(
        config: ClientConfig,
        state_store: Arc<dyn StateStore>,
        live: Arc<dyn DeviceTransport>,
        connector: Arc<dyn FeedConnector>,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;
        let settings = SettingsStore::load(state_store.clone(), config.defaults.clone()).await;
        Self::with_settings(config, state_store, settings, live, connector).await
    }

    /// Create an engine around an already loaded [`SettingsStore`]
    ///
    /// Used when the live transport itself needs the settings handle, so
    /// both observe the same record.
    pub async fn with_settings(
        config: ClientConfig,
        state_store: Arc<dyn StateStore>,
        settings: SettingsStore,
        live: Arc<dyn DeviceTransport>,
        connector: Arc<dyn FeedConnector>,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (events, rx) = EventSink::channel(config.engine.event_channel_capacity);
        let intent = IntentCache::load(state_store.clone()).await;
        let transport: Arc<dyn DeviceTransport> =
            Arc::new(ModeRouter::new(settings.clone(), live));

        let engine = Self {
            reconciler: StatusReconciler::new(transport.clone(), intent.clone(), events.clone()),
            camera: CameraMonitor::new(transport.clone(), events.clone()),
            system: SystemActuator::new(transport.clone(), intent.clone(), events.clone()),
            siren: SirenActuator::new(transport.clone(), events.clone()),
            alerts: AlertFeed::new(transport.clone(), events.clone()),
            engine_config: config.engine,
            state_store,
            settings,
            intent,
            transport,
            connector,
            events,
            active: Mutex::new(HashMap::new()),
        };

        Ok((engine, rx))
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn intent(&self) -> &IntentCache {
        &self.intent
    }

    /// Mode-aware transport shared by every component
    pub fn transport(&self) -> Arc<dyn DeviceTransport> {
        self.transport.clone()
    }

    pub fn reconciler(&self) -> &StatusReconciler {
        &self.reconciler
    }

    pub fn camera(&self) -> &CameraMonitor {
        &self.camera
    }

    pub fn system(&self) -> &SystemActuator {
        &self.system
    }

    pub fn siren(&self) -> &SirenActuator {
        &self.siren
    }

    pub fn alerts(&self) -> &AlertFeed {
        &self.alerts
    }

    /// Start a view's timers (no-op when already active)
    pub async fn activate(&self, view: View) {
        let mut active = self.active.lock().await;
        if active.contains_key(&view) {
            debug!("View {} already active", view);
            return;
        }

        let handles = match view {
            View::Dashboard => {
                let reconciler = self.reconciler.clone();
                ViewHandles {
                    polls: vec![spawn_poll(
                        "status-poll",
                        self.engine_config.status_poll_interval(),
                        move || {
                            let reconciler = reconciler.clone();
                            async move {
                                reconciler.poll_once().await;
                            }
                        },
                    )],
                    feed: None,
                }
            }
            View::LiveFeed => {
                let camera = self.camera.clone();
                ViewHandles {
                    polls: vec![spawn_poll(
                        "camera-poll",
                        self.engine_config.camera_poll_interval(),
                        move || {
                            let camera = camera.clone();
                            async move {
                                camera.poll_once().await;
                            }
                        },
                    )],
                    feed: Some(FeedSession::start(
                        &self.settings,
                        self.connector.clone(),
                        self.events.clone(),
                    )),
                }
            }
            View::Alerts => ViewHandles {
                polls: vec![
                    self.alerts
                        .start_auto_refresh(self.engine_config.alert_refresh_interval()),
                ],
                feed: None,
            },
        };

        active.insert(view, handles);
        info!("View {} activated", view);
        self.events.emit(EngineEvent::ViewActivated { view });
    }

    /// Stop a view's timers; in-flight results are discarded
    pub async fn deactivate(&self, view: View) {
        let handles = self.active.lock().await.remove(&view);
        if let Some(handles) = handles {
            handles.shutdown().await;
            info!("View {} deactivated", view);
            self.events.emit(EngineEvent::ViewDeactivated { view });
        }
    }

    /// Whether a view's timers are running
    pub async fn is_active(&self, view: View) -> bool {
        self.active.lock().await.contains_key(&view)
    }

    /// Stop every view and flush state
    pub async fn shutdown(&self) -> Result<()> {
        let views: Vec<View> = self.active.lock().await.keys().copied().collect();
        for view in views {
            self.deactivate(view).await;
        }
        self.state_store.flush().await?;
        info!("State flushed, engine stopped");
        Ok(())
    }

    /// Activate `views` and run until SIGINT/SIGTERM
    pub async fn run(&self, views: &[View]) -> Result<()> {
        self.run_internal(views, None).await
    }

    /// Activate `views` and run until `shutdown_rx` fires
    pub async fn run_with_shutdown(
        &self,
        views: &[View],
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<()> {
        self.run_internal(views, Some(shutdown_rx)).await
    }

    async fn run_internal(
        &self,
        views: &[View],
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        for view in views {
            self.activate(*view).await;
        }

        match shutdown_rx {
            Some(rx) => {
                let _ = rx.await;
            }
            None => wait_for_signal().await?,
        }

        info!("Shutdown signal received");
        self.shutdown().await
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
