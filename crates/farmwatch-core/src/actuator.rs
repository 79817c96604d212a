//! Control actuators for the system switch and the siren
//!
//! Each actuator is a two-state machine, `Idle` and `InFlight`. A request
//! made while another is in flight returns [`ActuatorOutcome::Busy`]
//! without queueing or cancelling anything. The in-flight flag is held by
//! an [`InFlightGuard`], so every exit path (including a dropped future)
//! returns the actuator to `Idle`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

use crate::events::{EngineEvent, EventSink};
use crate::model::{SirenAction, SirenToggleResponse, SystemIntent};
use crate::stores::IntentCache;
use crate::traits::DeviceTransport;

const UNKNOWN_SIREN_ERROR: &str = "Unknown error";

/// Result of an actuator request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorOutcome<T> {
    /// The device accepted the request
    Applied(T),
    /// The request was rejected or could not be sent
    Failed(String),
    /// Another request was already in flight; nothing was sent
    Busy,
}

impl<T> ActuatorOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActuatorOutcome::Applied(_))
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, ActuatorOutcome::Busy)
    }
}

/// Holds an actuator's in-flight flag until dropped
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    /// Move `Idle -> InFlight`, or `None` when already in flight
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Arms and disarms the system
///
/// The intent is written before the request is sent. On failure the
/// optimistic write stays; the next status poll corrects it.
#[derive(Clone)]
pub struct SystemActuator {
    transport: Arc<dyn DeviceTransport>,
    intent: IntentCache,
    events: EventSink,
    in_flight: Arc<AtomicBool>,
}

impl SystemActuator {
    pub fn new(transport: Arc<dyn DeviceTransport>, intent: IntentCache, events: EventSink) -> Self {
        Self {
            transport,
            intent,
            events,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Flip the cached intent
    pub async fn toggle(&self) -> ActuatorOutcome<SystemIntent> {
        let target = !self.intent.enabled();
        self.request(target).await
    }

    /// Ask for the system to be armed (`true`) or disarmed (`false`)
    pub async fn request(&self, enabled: bool) -> ActuatorOutcome<SystemIntent> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return ActuatorOutcome::Busy;
        };

        self.events
            .emit(EngineEvent::SystemToggleRequested { enabled });

        let intent = match self.intent.set(enabled).await {
            Ok(intent) => intent,
            Err(e) => {
                error!("Failed to persist system intent: {}", e);
                return self.fail(enabled, e.to_string());
            }
        };

        match self.transport.set_system_enabled(enabled).await {
            Ok(()) => {
                info!("System {} request accepted", if enabled { "arm" } else { "disarm" });
                ActuatorOutcome::Applied(intent)
            }
            Err(e) => {
                error!("Failed to set system state: {}", e);
                self.fail(enabled, e.to_string())
            }
        }
    }

    fn fail(&self, enabled: bool, error: String) -> ActuatorOutcome<SystemIntent> {
        self.events.emit(EngineEvent::SystemToggleFailed {
            enabled,
            error: error.clone(),
        });
        ActuatorOutcome::Failed(error)
    }
}

/// Switches the siren
///
/// The displayed siren state is local and only changes after the device
/// reports `success: true`.
#[derive(Clone)]
pub struct SirenActuator {
    transport: Arc<dyn DeviceTransport>,
    events: EventSink,
    in_flight: Arc<AtomicBool>,
    siren_on: Arc<AtomicBool>,
}

impl SirenActuator {
    pub fn new(transport: Arc<dyn DeviceTransport>, events: EventSink) -> Self {
        Self {
            transport,
            events,
            in_flight: Arc::new(AtomicBool::new(false)),
            siren_on: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Displayed siren state
    pub fn is_on(&self) -> bool {
        self.siren_on.load(Ordering::Acquire)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Request the opposite of the displayed state
    pub async fn toggle(&self) -> ActuatorOutcome<SirenToggleResponse> {
        self.request(SirenAction::toggling(self.is_on())).await
    }

    pub async fn request(&self, action: SirenAction) -> ActuatorOutcome<SirenToggleResponse> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return ActuatorOutcome::Busy;
        };

        match self.transport.toggle_siren(action).await {
            Ok(reply) if reply.success => {
                self.siren_on
                    .store(action == SirenAction::On, Ordering::Release);
                let siren_state = reply.siren_state.unwrap_or(action.as_state());
                info!("Siren turned {}", siren_state);
                self.events.emit(EngineEvent::SirenToggled {
                    action,
                    siren_state,
                });
                ActuatorOutcome::Applied(reply)
            }
            Ok(reply) => {
                let message = reply
                    .message
                    .unwrap_or_else(|| UNKNOWN_SIREN_ERROR.to_string());
                self.fail(action, format!("Failed to toggle siren: {message}"))
            }
            Err(e) => self.fail(action, format!("Error toggling siren: {e}")),
        }
    }

    fn fail(&self, action: SirenAction, error: String) -> ActuatorOutcome<SirenToggleResponse> {
        error!("{}", error);
        self.events.emit(EngineEvent::SirenToggleFailed {
            action,
            error: error.clone(),
        });
        ActuatorOutcome::Failed(error)
    }
}
