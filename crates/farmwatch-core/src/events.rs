//! Engine events and the sink components emit them through
//!
//! Every component holds an [`EventSink`] clone. Events are delivered over a
//! bounded channel; when the consumer falls behind, new events are dropped
//! with a warning rather than blocking a poll or a user action.

use tokio::sync::mpsc;
use tracing::warn;

use crate::model::{CameraStatus, DeviceState, SirenAction, SystemStatus};

/// Views that own repeating timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// System and siren controls plus the status poll
    Dashboard,
    /// Camera status poll and the live feed session
    LiveFeed,
    /// Alert log with auto-refresh
    Alerts,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Dashboard => f.write_str("dashboard"),
            View::LiveFeed => f.write_str("live-feed"),
            View::Alerts => f.write_str("alerts"),
        }
    }
}

/// Events emitted by the client components
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A view started its timers
    ViewActivated { view: View },

    /// A view stopped its timers
    ViewDeactivated { view: View },

    /// A status poll succeeded (or produced the mock status)
    StatusPolled {
        status: SystemStatus,
        display_enabled: bool,
    },

    /// A status poll failed; the intent was left untouched
    StatusUnavailable { error: String },

    /// The cached intent disagreed with the device and was corrected
    IntentReconciled { enabled: bool },

    /// A camera status poll finished (failures carry the disconnected stand-in)
    CameraStatusPolled { status: CameraStatus },

    /// The user asked to arm or disarm the system
    SystemToggleRequested { enabled: bool },

    /// The system request failed after the optimistic write
    SystemToggleFailed { enabled: bool, error: String },

    /// The device confirmed a siren change
    SirenToggled {
        action: SirenAction,
        siren_state: DeviceState,
    },

    /// A siren change was rejected or could not be sent
    SirenToggleFailed { action: SirenAction, error: String },

    /// A fresher alert list was applied
    AlertsLoaded { count: usize },

    /// An alert load failed; the displayed list was emptied
    AlertsLoadFailed { error: String },

    /// The device confirmed the alert log was cleared
    AlertsCleared,

    /// Clearing the alert log failed; the displayed list is unchanged
    AlertsClearFailed { error: String },

    /// The feed session resolved a new URL and is connecting
    FeedResolved { url: String },

    /// The feed stream is established
    FeedConnected { url: String },

    /// The feed connection ended in error and will not be retried
    FeedFailed { url: String, error: String },

    /// No feed URL could be resolved from the current settings
    FeedNotConfigured,
}

/// Cloneable handle for emitting [`EngineEvent`]s
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<EngineEvent>>,
}

impl EventSink {
    /// Create a sink and the receiver that observes it
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that discards every event
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Emit an event without waiting
    pub fn emit(&self, event: EngineEvent) {
        let Some(tx) = &self.tx else {
            return;
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    "Event channel full, dropping event. Consider increasing event_channel_capacity."
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::trace!("Event receiver dropped, discarding event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_channel_drops_event() {
        let (sink, mut rx) = EventSink::channel(1);
        sink.emit(EngineEvent::AlertsCleared);
        sink.emit(EngineEvent::FeedNotConfigured);

        assert_eq!(rx.try_recv().unwrap(), EngineEvent::AlertsCleared);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disabled_sink_is_silent() {
        EventSink::disabled().emit(EngineEvent::AlertsCleared);
    }
}
