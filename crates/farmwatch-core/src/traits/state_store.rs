// # State Store Trait
//
// Defines the interface for durable client state.
//
// ## Purpose
//
// The client keeps two independently keyed records:
// - `settings`: connection settings and the mock-mode flag
// - `system`: the cached system intent
//
// Each record is a flat JSON object stored as text. The store knows nothing
// about their shape; parsing and defaulting belong to the typed containers
// in `crate::stores`.
//
// ## Implementations
//
// - File-based: one JSON file per key (`crate::state::FileStateStore`)
// - In-memory: `crate::state::MemoryStateStore`
//
// ## Usage
//
// ```rust,ignore
// use farmwatch_core::StateStore;
//
// let store = /* StateStore implementation */;
// store.save("system", r#"{"enabled":true}"#).await?;
// let raw = store.load("system").await?;
// ```

use async_trait::async_trait;

/// Record key for persisted settings
pub const SETTINGS_KEY: &str = "settings";

/// Record key for the persisted system intent
pub const SYSTEM_KEY: &str = "system";

/// Trait for state store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Atomicity
///
/// `save` must replace the whole record or leave the previous value intact.
/// A reader must never observe a half-written record.
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
/// - ✅ Implement locking for thread safety
///
/// ## Forbidden Capabilities
/// - ❌ Interpret record contents (owned by the typed stores)
/// - ❌ Spawn background tasks
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the raw text of a record
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: The stored text
    /// - `Ok(None)`: No record under this key
    /// - `Err(Error)`: Storage error
    async fn load(&self, key: &str) -> Result<Option<String>, crate::Error>;

    /// Replace a record
    ///
    /// The write is durable when this returns `Ok`.
    async fn save(&self, key: &str, value: &str) -> Result<(), crate::Error>;

    /// Delete a record (no-op when absent)
    async fn delete(&self, key: &str) -> Result<(), crate::Error>;

    /// List all record keys in the store
    async fn list_keys(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
