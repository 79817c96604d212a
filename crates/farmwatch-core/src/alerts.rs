//! Alert feed manager
//!
//! Fetches the detection log, sorts it newest first, and publishes the
//! displayed list through a watch channel.
//!
//! ## Overlapping loads
//!
//! Manual refreshes and the auto-refresh timer may overlap. Every load takes
//! a sequence number when it starts, and its result is displayed only when
//! that number is higher than the last one applied. A slow, stale response
//! can therefore never replace a fresher one.
//!
//! ## Clearing
//!
//! A successful clear marks every load issued so far as applied, so loads
//! that were in flight when the log was wiped cannot bring entries back.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::events::{EngineEvent, EventSink};
use crate::model::{Alert, sort_alerts};
use crate::scheduler::{PollHandle, spawn_poll};
use crate::traits::DeviceTransport;

/// Prompt shown before the log is wiped
pub const CLEAR_PROMPT: &str =
    "Are you sure you want to clear all detection logs? This cannot be undone.";

/// Displayed alert log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFeedState {
    /// Alerts, newest first
    pub alerts: Vec<Alert>,
    /// Whether any load is in flight
    pub loading: bool,
    /// Error from the most recently applied load
    pub error: Option<String>,
    applied_seq: u64,
    loads_in_flight: usize,
}

impl AlertFeedState {
    /// Whether a clear would currently be accepted
    pub fn can_clear(&self) -> bool {
        !self.loading && !self.alerts.is_empty()
    }
}

/// Confirmation gate for destructive actions
#[async_trait]
pub trait ConfirmClear: Send + Sync {
    /// Return `true` to proceed
    async fn confirm(&self, prompt: &str) -> bool;
}

#[async_trait]
impl<F> ConfirmClear for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    async fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Result of a clear request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The device wiped the log and the displayed list was emptied
    Cleared,
    /// The confirmation gate said no
    Declined,
    /// The list is empty or a load is in progress
    Disabled,
    /// The device refused or could not be reached; the list is unchanged
    Failed(String),
}

impl ClearOutcome {
    pub fn cleared(&self) -> bool {
        matches!(self, ClearOutcome::Cleared)
    }
}

/// Decrements the in-flight count even when a load is abandoned
struct LoadGuard<'a> {
    tx: &'a watch::Sender<AlertFeedState>,
}

impl<'a> LoadGuard<'a> {
    fn begin(tx: &'a watch::Sender<AlertFeedState>) -> Self {
        tx.send_modify(|state| {
            state.loads_in_flight += 1;
            state.loading = true;
        });
        Self { tx }
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.tx.send_modify(|state| {
            state.loads_in_flight = state.loads_in_flight.saturating_sub(1);
            state.loading = state.loads_in_flight > 0;
        });
    }
}

struct Inner {
    transport: Arc<dyn DeviceTransport>,
    events: EventSink,
    issued_seq: AtomicU64,
    tx: watch::Sender<AlertFeedState>,
}

/// Alert log manager
///
/// Cloning is cheap; clones share the displayed list.
#[derive(Clone)]
pub struct AlertFeed {
    inner: Arc<Inner>,
}

impl AlertFeed {
    pub fn new(transport: Arc<dyn DeviceTransport>, events: EventSink) -> Self {
        let (tx, _rx) = watch::channel(AlertFeedState::default());
        Self {
            inner: Arc::new(Inner {
                transport,
                events,
                issued_seq: AtomicU64::new(0),
                tx,
            }),
        }
    }

    /// Snapshot of the displayed state
    pub fn state(&self) -> AlertFeedState {
        self.inner.tx.borrow().clone()
    }

    /// Snapshot of the displayed alerts
    pub fn alerts(&self) -> Vec<Alert> {
        self.inner.tx.borrow().alerts.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AlertFeedState> {
        self.inner.tx.subscribe()
    }

    /// Fetch and sort the alert log
    ///
    /// Never fails: a transport failure yields an empty list and records
    /// the error. The returned list is what this fetch produced; it is only
    /// displayed when no fresher load has been applied meanwhile.
    pub async fn load(&self) -> Vec<Alert> {
        let seq = self.inner.issued_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = LoadGuard::begin(&self.inner.tx);

        let (alerts, error) = match self.inner.transport.fetch_alerts().await {
            Ok(mut alerts) => {
                sort_alerts(&mut alerts);
                (alerts, None)
            }
            Err(e) => {
                warn!("Failed to fetch alerts: {}", e);
                (Vec::new(), Some(e.to_string()))
            }
        };

        let mut applied = false;
        self.inner.tx.send_modify(|state| {
            if seq > state.applied_seq {
                state.applied_seq = seq;
                state.alerts = alerts.clone();
                state.error = error.clone();
                applied = true;
            }
        });

        if applied {
            match &error {
                Some(error) => self.inner.events.emit(EngineEvent::AlertsLoadFailed {
                    error: error.clone(),
                }),
                None => {
                    debug!("Applied alert load #{} ({} alerts)", seq, alerts.len());
                    self.inner.events.emit(EngineEvent::AlertsLoaded {
                        count: alerts.len(),
                    });
                }
            }
        } else {
            debug!("Discarded stale alert load #{}", seq);
        }

        alerts
    }

    /// Wipe the device's alert log after confirmation
    pub async fn clear(&self, confirm: &dyn ConfirmClear) -> ClearOutcome {
        if !self.state().can_clear() {
            return ClearOutcome::Disabled;
        }

        if !confirm.confirm(CLEAR_PROMPT).await {
            debug!("Alert log clear declined");
            return ClearOutcome::Declined;
        }

        match self.inner.transport.clear_events().await {
            Ok(()) => {
                let issued = self.inner.issued_seq.load(Ordering::SeqCst);
                self.inner.tx.send_modify(|state| {
                    state.alerts.clear();
                    state.error = None;
                    state.applied_seq = state.applied_seq.max(issued);
                });
                info!("All logs cleared successfully");
                self.inner.events.emit(EngineEvent::AlertsCleared);
                ClearOutcome::Cleared
            }
            Err(e) => {
                error!("Failed to clear logs: {}", e);
                self.inner.events.emit(EngineEvent::AlertsClearFailed {
                    error: e.to_string(),
                });
                ClearOutcome::Failed(e.to_string())
            }
        }
    }

    /// Reload every `period` until the handle is dropped
    pub fn start_auto_refresh(&self, period: Duration) -> PollHandle {
        let feed = self.clone();
        spawn_poll("alert-refresh", period, move || {
            let feed = feed.clone();
            async move {
                feed.load().await;
            }
        })
    }
}
