//! SQLite-backed key-value store.
//!
//! Values are stored as JSON text in a single `kv` table.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use serde_json::Value;

use super::{data_dir, KeyValueStore};
use crate::error::{CoreError, StorageError};

pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open the store at `<data_dir>/focusloop.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory or the database cannot be opened.
    pub fn open_default() -> Result<Self, CoreError> {
        let path = data_dir()?.join("focusloop.db");
        Ok(Self::open(path)?)
    }

    /// Open (creating if needed) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| StorageError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let store = Self {
            conn,
            path: Some(path),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn, path: None };
        store.migrate()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );",
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let raw = match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(v) => v,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Codec {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::Codec {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![key, raw],
        )?;
        Ok(())
    }
}
