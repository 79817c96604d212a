use std::sync::Arc;
use tokio::sync::watch;

use super::{PersistedRecord, Record};
use crate::Error;
use crate::model::SystemIntent;
use crate::traits::{StateStore, SYSTEM_KEY};

impl Record for SystemIntent {
    fn decode(raw: &str, defaults: &Self) -> Result<Self, Error> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let enabled = value
            .get("enabled")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(defaults.enabled);
        Ok(SystemIntent { enabled })
    }
}

/// Persisted local belief about whether the system is armed
///
/// Written optimistically by the system actuator and corrected by the
/// status reconciler. Never authoritative.
#[derive(Clone)]
pub struct IntentCache {
    record: Arc<PersistedRecord<SystemIntent>>,
}

impl IntentCache {
    /// Load the persisted intent (default `enabled: true`)
    pub async fn load(store: Arc<dyn StateStore>) -> Self {
        Self {
            record: Arc::new(
                PersistedRecord::load(SYSTEM_KEY, store, SystemIntent::default()).await,
            ),
        }
    }

    pub fn get(&self) -> SystemIntent {
        self.record.get()
    }

    pub fn enabled(&self) -> bool {
        self.get().enabled
    }

    /// Overwrite the intent and persist it
    pub async fn set(&self, enabled: bool) -> Result<SystemIntent, Error> {
        self.record.update(|intent| intent.enabled = enabled).await
    }

    pub fn subscribe(&self) -> watch::Receiver<SystemIntent> {
        self.record.subscribe()
    }
}

impl std::fmt::Debug for IntentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentCache")
            .field("enabled", &self.enabled())
            .finish()
    }
}
