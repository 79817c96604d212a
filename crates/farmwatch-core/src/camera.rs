//! Camera monitor
//!
//! Polls `GET /camera/status` and keeps the latest snapshot. A failed poll
//! publishes the disconnected stand-in instead of an error.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::events::{EngineEvent, EventSink};
use crate::model::CameraStatus;
use crate::traits::DeviceTransport;

#[derive(Clone)]
pub struct CameraMonitor {
    transport: Arc<dyn DeviceTransport>,
    events: EventSink,
    tx: Arc<watch::Sender<CameraStatus>>,
}

impl CameraMonitor {
    pub fn new(transport: Arc<dyn DeviceTransport>, events: EventSink) -> Self {
        let (tx, _rx) = watch::channel(CameraStatus::disconnected());
        Self {
            transport,
            events,
            tx: Arc::new(tx),
        }
    }

    pub async fn poll_once(&self) -> CameraStatus {
        let status = match self.transport.camera_status().await {
            Ok(status) => {
                debug!("Camera status: {:?}", status.status);
                status
            }
            Err(e) => {
                warn!("Failed to fetch camera status: {}", e);
                CameraStatus::disconnected()
            }
        };

        self.events.emit(EngineEvent::CameraStatusPolled {
            status: status.clone(),
        });
        self.tx.send_replace(status.clone());
        status
    }

    pub fn latest(&self) -> CameraStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CameraStatus> {
        self.tx.subscribe()
    }
}
