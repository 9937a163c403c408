//! # Local Memory
//!
//! Per-target record of unique keys believed to already exist remotely.
//! Memory is a hint that lets a run skip the expensive remote probe. It is
//! only persisted once a collection is large enough to be worth it: a
//! remote-filtered run saves it when the remote count plus new successes
//! exceeds the threshold, and a full-coverage run replaces it when its
//! successes exceed the threshold or resets it otherwise. Small and
//! memory-filtered runs append to memory that already exists.

use crate::model::UniqueKey;
use crate::{Result, SyncError};
use async_trait::async_trait;
use bridge_traits::storage::SettingsStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Stored keys; empty when nothing was saved yet.
    async fn load(&self) -> Result<HashSet<UniqueKey>>;

    /// Replace the stored set.
    async fn save(&self, keys: &HashSet<UniqueKey>) -> Result<()>;

    /// Union `keys` into the stored set and return the result.
    ///
    /// Appending nothing leaves storage untouched.
    async fn append(&self, keys: &HashSet<UniqueKey>) -> Result<HashSet<UniqueKey>> {
        let mut merged = self.load().await?;
        if keys.is_empty() {
            return Ok(merged);
        }
        merged.extend(keys.iter().cloned());
        self.save(&merged).await?;
        Ok(merged)
    }

    /// Forget everything.
    async fn reset(&self) -> Result<()>;
}

/// [`MemoryStore`] persisted through the host [`SettingsStore`].
///
/// Keys are written as a sorted JSON array of strings under
/// `collect-data.<target>.memory`.
pub struct SettingsMemoryStore {
    settings: Arc<dyn SettingsStore>,
    storage_key: String,
}

impl SettingsMemoryStore {
    pub fn new(settings: Arc<dyn SettingsStore>, target: &str) -> Self {
        Self {
            settings,
            storage_key: format!("collect-data.{}.memory", target),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }
}

#[async_trait]
impl MemoryStore for SettingsMemoryStore {
    async fn load(&self) -> Result<HashSet<UniqueKey>> {
        let raw = self
            .settings
            .get_string(&self.storage_key)
            .await
            .map_err(|e| SyncError::Memory(e.to_string()))?;

        let Some(raw) = raw else {
            return Ok(HashSet::new());
        };

        let entries: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
            SyncError::Memory(format!("Corrupt memory at {}: {}", self.storage_key, e))
        })?;

        let mut keys = HashSet::with_capacity(entries.len());
        for entry in entries {
            match UniqueKey::parse(&entry) {
                Ok(key) => {
                    keys.insert(key);
                }
                Err(e) => warn!("Skipping unreadable memory entry: {}", e),
            }
        }

        Ok(keys)
    }

    async fn save(&self, keys: &HashSet<UniqueKey>) -> Result<()> {
        let mut entries: Vec<String> = keys.iter().map(ToString::to_string).collect();
        entries.sort();

        let raw = serde_json::to_string(&entries)
            .map_err(|e| SyncError::Memory(format!("Failed to encode memory: {}", e)))?;

        self.settings
            .set_string(&self.storage_key, &raw)
            .await
            .map_err(|e| SyncError::Memory(e.to_string()))?;

        debug!(key = %self.storage_key, size = entries.len(), "Saved memory");
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        self.settings
            .delete(&self.storage_key)
            .await
            .map_err(|e| SyncError::Memory(e.to_string()))?;
        debug!(key = %self.storage_key, "Reset memory");
        Ok(())
    }
}
