//! Process-local settings store
//!
//! Keeps values in a map behind an async lock. Useful for tests and for
//! hosts that do not need persistence across restarts.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SettingsStore,
};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq)]
enum StoredValue {
    String(String),
    Bool(bool),
    I64(i64),
}

impl StoredValue {
    fn type_name(&self) -> &'static str {
        match self {
            StoredValue::String(_) => "string",
            StoredValue::Bool(_) => "bool",
            StoredValue::I64(_) => "i64",
        }
    }
}

fn mismatch(expected: &str, actual: &StoredValue) -> BridgeError {
    BridgeError::Storage(format!(
        "Type mismatch: expected {}, got {}",
        expected,
        actual.type_name()
    ))
}

/// In-memory [`SettingsStore`] implementation
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<BTreeMap<String, StoredValue>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn put(&self, key: &str, value: StoredValue) {
        self.values.write().await.insert(key.to_string(), value);
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.put(key, StoredValue::String(value.to_string())).await;
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.values.read().await.get(key) {
            Some(StoredValue::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(mismatch("string", other)),
            None => Ok(None),
        }
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.put(key, StoredValue::Bool(value)).await;
        Ok(())
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.values.read().await.get(key) {
            Some(StoredValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(mismatch("bool", other)),
            None => Ok(None),
        }
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.put(key, StoredValue::I64(value)).await;
        Ok(())
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.values.read().await.get(key) {
            Some(StoredValue::I64(n)) => Ok(Some(*n)),
            Some(other) => Err(mismatch("i64", other)),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.values.read().await.contains_key(key))
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.values.read().await.keys().cloned().collect())
    }

    async fn clear_all(&self) -> Result<()> {
        self.values.write().await.clear();
        Ok(())
    }
}
