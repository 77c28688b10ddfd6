//! Typed view over the key-value store.
//!
//! Loads fall back to defaults per key; saves are best-effort and never
//! surface failures to the engine.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::KeyValueStore;
use crate::session::SessionLog;
use crate::settings::Settings;
use crate::timer::Phase;

pub mod keys {
    pub const SETTINGS: &str = "timer.settings";
    pub const PHASE: &str = "timer.phase";
    pub const RUNNING: &str = "timer.running";
    pub const COMPLETED_WORK_INTERVALS: &str = "timer.completed_work_intervals";
    pub const SESSION_LOG: &str = "timer.session_log";
}

/// State restored at process start. Remaining time is not part of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub settings: Settings,
    pub phase: Phase,
    /// Last persisted running flag. Informational only: a reload never resumes.
    pub was_running: bool,
    pub completed_work_intervals: u32,
    pub sessions: SessionLog,
}

impl PersistedState {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            settings: read::<Settings>(store, keys::SETTINGS)
                .map(|s| s.sanitized())
                .unwrap_or_default(),
            phase: read(store, keys::PHASE).unwrap_or_default(),
            was_running: read(store, keys::RUNNING).unwrap_or(false),
            completed_work_intervals: read(store, keys::COMPLETED_WORK_INTERVALS).unwrap_or(0),
            sessions: read(store, keys::SESSION_LOG).unwrap_or_default(),
        }
    }
}

fn read<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match store.get(key) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring malformed persisted value");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read persisted value");
            None
        }
    }
}

/// Best-effort writer owned by the engine.
pub struct StateWriter {
    store: Box<dyn KeyValueStore>,
}

impl StateWriter {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> PersistedState {
        PersistedState::load(self.store.as_ref())
    }

    pub fn save_settings(&mut self, settings: &Settings) {
        self.write(keys::SETTINGS, settings);
    }

    pub fn save_phase(&mut self, phase: Phase) {
        self.write(keys::PHASE, &phase);
    }

    pub fn save_running(&mut self, running: bool) {
        self.write(keys::RUNNING, &running);
    }

    pub fn save_completed_work_intervals(&mut self, count: u32) {
        self.write(keys::COMPLETED_WORK_INTERVALS, &count);
    }

    pub fn save_sessions(&mut self, sessions: &SessionLog) {
        self.write(keys::SESSION_LOG, sessions);
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to encode state for persistence");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &value) {
            tracing::warn!(key, error = %e, "Failed to persist state; continuing in memory");
        }
    }
}

/// Raw JSON of every persisted key, for diagnostics.
pub fn dump(store: &dyn KeyValueStore) -> Vec<(&'static str, Option<Value>)> {
    [
        keys::SETTINGS,
        keys::PHASE,
        keys::RUNNING,
        keys::COMPLETED_WORK_INTERVALS,
        keys::SESSION_LOG,
    ]
    .into_iter()
    .map(|k| (k, store.get(k).ok().flatten()))
    .collect()
}
