//! Storage Abstractions
//!
//! Provides a host-agnostic trait for durable key-value storage. The
//! collection core persists its synced-item memory through this trait, so any
//! host facility that can load, save and delete a string by key is enough.

use async_trait::async_trait;

use crate::error::Result;

/// Key-value settings storage trait
///
/// Abstracts host-specific durable storage:
/// - Desktop: SQLite-backed table
/// - Tests: in-process map
/// - Plugin hosts: whatever data API the host exposes
///
/// Keys are namespaced by the caller (e.g. `collect-data.linkding.memory`).
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn remember(store: &dyn SettingsStore) -> Result<()> {
///     store.set_string("collect-data.linkding.memory", "[]").await?;
///     store.set_bool("collect.full_coverage", false).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Store an integer value
    async fn set_i64(&self, key: &str, value: i64) -> Result<()>;

    /// Retrieve an integer value
    async fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    /// Delete a setting. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool>;

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;
}
