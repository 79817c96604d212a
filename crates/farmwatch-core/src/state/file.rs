// # File State Store
//
// File-based implementation of StateStore with crash recovery.
//
// ## Purpose
//
// Keeps the `settings` and `system` records across client restarts.
// Each record lives in its own file, so writing one never touches the other.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Each record must be valid JSON on load
// - Automatic backup: Keeps `<key>.backup` with the previous good value
// - Recovery: Falls back to the backup if the record is corrupted
//
// ## Layout
//
// ```text
// <dir>/settings.json
// <dir>/settings.backup
// <dir>/system.json
// <dir>/system.backup
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::StateStore;

const RECORD_EXTENSION: &str = "json";

/// File-based state store with crash recovery
///
/// Records are cached in memory after the first read and written through to
/// disk on every `save`.
///
/// # Example
///
/// ```rust,no_run
/// use farmwatch_core::state::FileStateStore;
/// use farmwatch_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/farmwatch").await?;
///
///     store.save("system", r#"{"enabled":false}"#).await?;
///     let raw = store.load("system").await?;
///     assert_eq!(raw.as_deref(), Some(r#"{"enabled":false}"#));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl FileStateStore {
    /// Open a state directory, creating it if needed
    pub async fn new<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        let dir = dir.as_ref().to_path_buf();

        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(&dir).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create state directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(Self {
            dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Directory holding the record files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{RECORD_EXTENSION}"))
    }

    fn temp_path(path: &Path) -> PathBuf {
        path.with_extension("tmp")
    }

    fn backup_path(path: &Path) -> PathBuf {
        path.with_extension("backup")
    }

    /// Read one record file, checking that it holds JSON
    async fn read_record(path: &Path) -> Result<Option<String>, Error> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to read state file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str::<serde_json::Value>(&content).map_err(|e| {
            Error::state_store(format!(
                "Failed to parse state file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(content))
    }

    /// Read a record, recovering from its backup when the main file is corrupt
    ///
    /// A corrupt record with no usable backup reads as absent, so callers fall
    /// back to their defaults.
    async fn read_with_recovery(&self, key: &str) -> Result<Option<String>, Error> {
        let path = self.record_path(key);
        match Self::read_record(&path).await {
            Ok(content) => Ok(content),
            Err(e) => {
                tracing::warn!(
                    "State record '{}' appears corrupted: {}. Attempting recovery from backup.",
                    key,
                    e
                );

                let backup_path = Self::backup_path(&path);
                match Self::read_record(&backup_path).await {
                    Ok(Some(content)) => {
                        tracing::info!("Recovered state record '{}' from backup", key);
                        if let Err(restore_err) = fs::copy(&backup_path, &path).await {
                            tracing::error!(
                                "Failed to restore state record '{}' from backup: {}",
                                key,
                                restore_err
                            );
                        }
                        Ok(Some(content))
                    }
                    Ok(None) => {
                        tracing::warn!("No backup for state record '{}'. Using defaults.", key);
                        Ok(None)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup of state record '{}' also corrupted: {}. Using defaults.",
                            key,
                            backup_err
                        );
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Write a record atomically (temp file, backup, rename)
    async fn write_record(&self, key: &str, value: &str) -> Result<(), Error> {
        let path = self.record_path(key);
        let temp_path = Self::temp_path(&path);

        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(value.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Only a record that still parses is worth keeping as a backup
        if matches!(Self::read_record(&path).await, Ok(Some(_))) {
            if let Err(e) = fs::copy(&path, Self::backup_path(&path)).await {
                tracing::warn!("Failed to back up state record '{}': {}", key, e);
            }
        }

        fs::rename(&temp_path, &path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::trace!("State record '{}' written to {}", key, path.display());
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, key: &str) -> Result<Option<String>, Error> {
        if let Some(cached) = self.cache.read().await.get(key) {
            return Ok(Some(cached.clone()));
        }

        let loaded = self.read_with_recovery(key).await?;
        if let Some(content) = &loaded {
            self.cache
                .write()
                .await
                .insert(key.to_string(), content.clone());
        }
        Ok(loaded)
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), Error> {
        // Hold the cache lock across the write so concurrent saves of the
        // same key land on disk in the order they update the cache.
        let mut cache = self.cache.write().await;
        self.write_record(key, value).await?;
        cache.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut cache = self.cache.write().await;
        let path = self.record_path(key);
        if path.exists() {
            fs::remove_file(&path).await.map_err(|e| {
                Error::state_store(format!("Failed to delete {}: {}", path.display(), e))
            })?;
        }
        cache.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, Error> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to list state directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn flush(&self) -> Result<(), Error> {
        // Every save is written through before it returns
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();

        let store = FileStateStore::new(dir.path()).await.unwrap();
        assert!(store.list_keys().await.unwrap().is_empty());
        assert_eq!(store.load("system").await.unwrap(), None);

        store.save("system", r#"{"enabled":false}"#).await.unwrap();
        assert!(dir.path().join("system.json").exists());

        // A fresh instance reads what the first one wrote
        let store2 = FileStateStore::new(dir.path()).await.unwrap();
        assert_eq!(
            store2.load("system").await.unwrap().as_deref(),
            Some(r#"{"enabled":false}"#)
        );
    }

    #[tokio::test]
    async fn test_records_are_independent() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path()).await.unwrap();

        store.save("settings", r#"{"mock":true}"#).await.unwrap();
        store.save("system", r#"{"enabled":true}"#).await.unwrap();
        store.delete("system").await.unwrap();

        assert_eq!(store.list_keys().await.unwrap(), vec!["settings".to_string()]);
        assert!(store.load("settings").await.unwrap().is_some());
        assert!(store.load("system").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path()).await.unwrap();

        store.save("system", r#"{"enabled":true}"#).await.unwrap();
        // Second write moves the first value into the backup
        store.save("system", r#"{"enabled":false}"#).await.unwrap();

        let path = dir.path().join("system.json");
        assert!(FileStateStore::backup_path(&path).exists());

        fs::write(&path, b"corrupted json data").await.unwrap();

        let store2 = FileStateStore::new(dir.path()).await.unwrap();
        let recovered = store2.load("system").await.unwrap();
        assert_eq!(recovered.as_deref(), Some(r#"{"enabled":true}"#));

        // The main file was restored from the backup
        let restored = fs::read_to_string(&path).await.unwrap();
        assert_eq!(restored, r#"{"enabled":true}"#);
    }

    #[tokio::test]
    async fn test_corruption_without_backup_reads_as_absent() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), b"{not json")
            .await
            .unwrap();

        let store = FileStateStore::new(dir.path()).await.unwrap();
        assert_eq!(store.load("settings").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_atomic_write() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path()).await.unwrap();

        for i in 0..10 {
            store
                .save("settings", &format!(r#"{{"apiBaseUrl":"http://10.0.0.{i}"}}"#))
                .await
                .unwrap();
        }

        assert!(!dir.path().join("settings.tmp").exists());
        let store2 = FileStateStore::new(dir.path()).await.unwrap();
        assert_eq!(
            store2.load("settings").await.unwrap().as_deref(),
            Some(r#"{"apiBaseUrl":"http://10.0.0.9"}"#)
        );
    }
}
