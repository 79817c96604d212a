//! Status reconciler
//!
//! Polls the authoritative system status and folds it into the
//! [`IntentCache`].
//!
//! ## Protocol
//!
//! 1. `GET /api/system/status`. On failure the remote status is taken as
//!    `UNKNOWN` and the intent is not touched.
//! 2. On success, `remote_enabled = status == ON`. When it disagrees with the
//!    cached intent, the intent is overwritten (silently, no prompt).
//! 3. The published [`SystemView`] is built by [`merge_view`].
//!
//! In mock mode the transport answers with the fixed synthetic status, so
//! the reconciler itself never branches on mode.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::events::{EngineEvent, EventSink};
use crate::model::SystemStatus;
use crate::stores::IntentCache;
use crate::traits::DeviceTransport;

/// Optimistic intent and remote truth side by side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemView {
    /// What the user last asked for (or the last reconciled value)
    pub local_intent: bool,
    /// Last status reported by the device (`UNKNOWN` until the first poll)
    pub remote: SystemStatus,
    /// Whether a consumer should show the system as armed
    pub display_enabled: bool,
}

/// Combine the cached intent with the remote status
///
/// The system displays as armed when the device says `ON` or the user's
/// intent is armed. A pending arm request therefore shows immediately, and
/// a device that reports `ON` is never shown as off.
pub fn merge_view(local_intent: bool, remote: SystemStatus) -> SystemView {
    let display_enabled = remote.is_on() || local_intent;
    SystemView {
        local_intent,
        remote,
        display_enabled,
    }
}

/// Periodic reconciler between the intent cache and the device
#[derive(Clone)]
pub struct StatusReconciler {
    transport: Arc<dyn DeviceTransport>,
    intent: IntentCache,
    events: EventSink,
    remote_tx: Arc<watch::Sender<SystemView>>,
}

impl StatusReconciler {
    pub fn new(transport: Arc<dyn DeviceTransport>, intent: IntentCache, events: EventSink) -> Self {
        let initial = merge_view(intent.enabled(), SystemStatus::default());
        let (remote_tx, _rx) = watch::channel(initial);
        Self {
            transport,
            intent,
            events,
            remote_tx: Arc::new(remote_tx),
        }
    }

    /// Run one reconciliation round
    pub async fn poll_once(&self) -> SystemView {
        let view = match self.transport.system_status().await {
            Ok(status) => {
                let remote_enabled = status.is_on();
                let mut local = self.intent.enabled();

                if remote_enabled != local {
                    match self.intent.set(remote_enabled).await {
                        Ok(_) => {
                            info!(
                                "System intent corrected to {} (device reports {})",
                                remote_enabled, status.status
                            );
                            self.events.emit(EngineEvent::IntentReconciled {
                                enabled: remote_enabled,
                            });
                            local = remote_enabled;
                        }
                        Err(e) => warn!("Failed to persist reconciled intent: {}", e),
                    }
                }

                let view = merge_view(local, status);
                debug!(
                    "Status polled via {}: {} (display_enabled: {})",
                    self.transport.transport_name(),
                    view.remote.status,
                    view.display_enabled
                );
                self.events.emit(EngineEvent::StatusPolled {
                    status: view.remote.clone(),
                    display_enabled: view.display_enabled,
                });
                view
            }
            Err(e) => {
                warn!("Failed to fetch system status: {}", e);
                self.events.emit(EngineEvent::StatusUnavailable {
                    error: e.to_string(),
                });
                merge_view(self.intent.enabled(), SystemStatus::unknown())
            }
        };

        self.remote_tx.send_replace(view.clone());
        view
    }

    /// Current view, using the latest intent and the last polled status
    pub fn view(&self) -> SystemView {
        let remote = self.remote_tx.borrow().remote.clone();
        merge_view(self.intent.enabled(), remote)
    }

    /// Observe the view published after every poll
    pub fn subscribe(&self) -> watch::Receiver<SystemView> {
        self.remote_tx.subscribe()
    }
}
