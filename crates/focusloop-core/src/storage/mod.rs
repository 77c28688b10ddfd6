//! Persistence collaborators.
//!
//! The engine only needs a generic key -> JSON value store. Writes are
//! idempotent snapshots of current state, so no transactions are involved.

mod config;
mod memory;
mod persisted;
mod sqlite;

pub use config::{Config, LoggingConfig, NotificationsConfig, TimerConfig};
pub use memory::MemoryStore;
pub use persisted::{dump, keys, PersistedState, StateWriter};
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use serde_json::Value;

use crate::error::{ConfigError, StorageError};

/// Generic persisted key-value storage.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn set(&mut self, key: &str, value: &Value) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `FOCUSLOOP_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/focusloop`, or `~/.config/focusloop-dev` when
/// `FOCUSLOOP_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSLOOP_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSLOOP_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusloop-dev")
            } else {
                base_dir.join("focusloop")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
