use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::KeyValueStore;
use crate::error::StorageError;

/// In-memory store. Clones share the same map, so a caller can keep a handle
/// to inspect what an engine persisted or to simulate a reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, Value>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail (quota exceeded, read-only medium).
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_writes = fail;
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|inner| {
                let mut keys: Vec<String> = inner.values.keys().cloned().collect();
                keys.sort();
                keys
            })
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StorageError::QueryFailed("memory store poisoned".into()))?;
        Ok(inner.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StorageError::QueryFailed("memory store poisoned".into()))?;
        if inner.fail_writes {
            return Err(StorageError::WriteRejected(key.to_string()));
        }
        inner.values.insert(key.to_string(), value.clone());
        Ok(())
    }
}
