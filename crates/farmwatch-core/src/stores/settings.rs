use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use super::{PersistedRecord, Record};
use crate::Error;
use crate::model::{Settings, SettingsPatch};
use crate::traits::{SETTINGS_KEY, StateStore};

impl Record for Settings {
    fn decode(raw: &str, defaults: &Self) -> Result<Self, Error> {
        let patch: SettingsPatch = serde_json::from_str(raw)?;
        let mut settings = defaults.clone();
        settings.merge(patch);
        Ok(settings)
    }
}

/// Persisted client settings
///
/// Cloning is cheap; every clone reads and writes the same record.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use farmwatch_core::model::{Settings, SettingsPatch};
/// use farmwatch_core::state::MemoryStateStore;
/// use farmwatch_core::stores::SettingsStore;
///
/// # async fn demo() -> farmwatch_core::Result<()> {
/// let settings = SettingsStore::load(Arc::new(MemoryStateStore::new()), Settings::default()).await;
/// let merged = settings.update(SettingsPatch::default().mock(false)).await?;
/// assert!(!merged.mock);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SettingsStore {
    record: Arc<PersistedRecord<Settings>>,
}

impl SettingsStore {
    /// Load persisted settings, taking `defaults` for anything not stored
    pub async fn load(store: Arc<dyn StateStore>, defaults: Settings) -> Self {
        Self {
            record: Arc::new(PersistedRecord::load(SETTINGS_KEY, store, defaults).await),
        }
    }

    /// Current settings
    pub fn get(&self) -> Settings {
        self.record.get()
    }

    /// Merge `patch` into the current settings and persist the result
    ///
    /// Returns the merged settings once they are durable.
    pub async fn update(&self, patch: SettingsPatch) -> Result<Settings, Error> {
        let merged = self.record.update(|settings| settings.merge(patch)).await?;
        info!(
            "Settings updated (api_base_url: {}, mock: {})",
            merged.api_base_url, merged.mock
        );
        Ok(merged)
    }

    /// Observe every committed settings value
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.record.subscribe()
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("current", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStateStore;

    #[tokio::test]
    async fn test_missing_keys_take_defaults() {
        let backing = MemoryStateStore::with_records([(
            SETTINGS_KEY,
            r#"{"apiBaseUrl":"http://10.0.0.5:8000"}"#,
        )]);
        let store = SettingsStore::load(Arc::new(backing), Settings::default()).await;

        let settings = store.get();
        assert_eq!(settings.api_base_url, "http://10.0.0.5:8000");
        assert!(settings.mock);
        assert_eq!(settings.stream_url, "");
    }

    #[tokio::test]
    async fn test_unparsable_record_uses_defaults() {
        let backing = MemoryStateStore::with_records([(SETTINGS_KEY, "not json")]);
        let store = SettingsStore::load(Arc::new(backing), Settings::default()).await;
        assert_eq!(store.get(), Settings::default());
    }

    #[tokio::test]
    async fn test_update_is_persisted_before_returning() {
        let backing = MemoryStateStore::new();
        let store = SettingsStore::load(Arc::new(backing.clone()), Settings::default()).await;

        store
            .update(SettingsPatch::default().stream_url("rtsp://cam"))
            .await
            .unwrap();

        let raw = backing.load(SETTINGS_KEY).await.unwrap().unwrap();
        let persisted: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted["streamUrl"], "rtsp://cam");
        assert_eq!(persisted["mock"], true);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let store =
            SettingsStore::load(Arc::new(MemoryStateStore::new()), Settings::default()).await;
        let mut rx = store.subscribe();

        store
            .update(SettingsPatch::default().mock(false))
            .await
            .unwrap();

        rx.changed().await.unwrap();
        assert!(!rx.borrow().mock);
    }
}
