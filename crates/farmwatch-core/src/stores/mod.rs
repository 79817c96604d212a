//! Typed, persisted state containers
//!
//! Each container wraps one keyed record of a [`StateStore`]:
//!
//! - [`SettingsStore`]: the `settings` record
//! - [`IntentCache`]: the `system` record
//!
//! Both share [`PersistedRecord`], which gives every record a single
//! merge-then-persist entry point and snapshot/subscription reads.

mod intent;
mod settings;

pub use intent::IntentCache;
pub use settings::SettingsStore;

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use crate::Error;
use crate::traits::StateStore;

/// A value that can be rebuilt from its persisted text
pub(crate) trait Record: Clone + Serialize + Send + Sync + 'static {
    /// Parse a stored record, taking `defaults` for any missing key
    fn decode(raw: &str, defaults: &Self) -> Result<Self, Error>;
}

/// One persisted record with a watch channel of committed values
pub(crate) struct PersistedRecord<T: Record> {
    key: &'static str,
    store: Arc<dyn StateStore>,
    // Held across merge and persist so writers commit in order
    write_lock: Mutex<()>,
    tx: watch::Sender<T>,
}

impl<T: Record> PersistedRecord<T> {
    /// Load the record, falling back to `defaults` when absent or unreadable
    pub(crate) async fn load(key: &'static str, store: Arc<dyn StateStore>, defaults: T) -> Self {
        let initial = match store.load(key).await {
            Ok(Some(raw)) => match T::decode(&raw, &defaults) {
                Ok(value) => {
                    debug!("Loaded persisted record '{}'", key);
                    value
                }
                Err(e) => {
                    warn!("Persisted record '{}' is unreadable, using defaults: {}", key, e);
                    defaults
                }
            },
            Ok(None) => {
                debug!("No persisted record '{}', using defaults", key);
                defaults
            }
            Err(e) => {
                warn!("Failed to load record '{}', using defaults: {}", key, e);
                defaults
            }
        };

        let (tx, _rx) = watch::channel(initial);
        Self {
            key,
            store,
            write_lock: Mutex::new(()),
            tx,
        }
    }

    /// Snapshot of the last committed value
    pub(crate) fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Observe every committed value
    pub(crate) fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Apply `mutate` to the current value, persist, then publish
    ///
    /// When persisting fails the in-memory value is left unchanged.
    pub(crate) async fn update<F>(&self, mutate: F) -> Result<T, Error>
    where
        F: FnOnce(&mut T),
    {
        let _guard = self.write_lock.lock().await;

        let mut next = self.get();
        mutate(&mut next);

        let raw = serde_json::to_string(&next)?;
        self.store.save(self.key, &raw).await?;

        self.tx.send_replace(next.clone());
        Ok(next)
    }
}
