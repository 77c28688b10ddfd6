//! Core error types for focusloop-core.
//!
//! The timer engine itself never fails from the caller's point of view; these
//! errors come from collaborators (storage, notifications, configuration) and
//! are either swallowed and logged at the engine boundary or propagated by
//! tooling such as the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusloop-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The timer service task is no longer running
    #[error("Timer service has stopped")]
    ServiceStopped,
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The store is locked by another writer
    #[error("Store is locked")]
    Locked,

    /// A stored value could not be encoded or decoded
    #[error("Invalid stored value for '{key}': {message}")]
    Codec { key: String, message: String },

    /// The store refused the write (quota, read-only, injected failure)
    #[error("Write rejected for '{0}'")]
    WriteRejected(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Side-effect collaborator errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Delivery failed
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
