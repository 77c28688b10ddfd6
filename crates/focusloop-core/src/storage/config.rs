//! TOML-based application configuration.
//!
//! Stores host-level preferences:
//! - Clock driver tick interval and engine timing windows
//! - Notification delivery
//! - Log level
//!
//! User-facing timer settings (durations, auto-start, sound) live in the
//! key-value store instead, next to the rest of the timer state.
//!
//! Configuration is stored at `~/.config/focusloop/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::EngineTuning;

/// Timer host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Interval of the periodic tick callback while running.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_auto_start_delay_ms")]
    pub auto_start_delay_ms: u64,
    #[serde(default = "default_completion_cooldown_ms")]
    pub completion_cooldown_ms: u64,
    #[serde(default = "default_duplicate_window_ms")]
    pub duplicate_window_ms: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusloop/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_tick_interval_ms() -> u64 {
    250
}
fn default_auto_start_delay_ms() -> u64 {
    EngineTuning::DEFAULT_AUTO_START_DELAY_MS
}
fn default_completion_cooldown_ms() -> u64 {
    EngineTuning::DEFAULT_COMPLETION_COOLDOWN_MS
}
fn default_duplicate_window_ms() -> u64 {
    EngineTuning::DEFAULT_DUPLICATE_WINDOW_MS
}
fn default_true() -> bool {
    true
}
fn default_app_name() -> String {
    "Focusloop".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            auto_start_delay_ms: default_auto_start_delay_ms(),
            completion_cooldown_ms: default_completion_cooldown_ms(),
            duplicate_window_ms: default_duplicate_window_ms(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            app_name: default_app_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TimerConfig {
    pub fn tuning(&self) -> EngineTuning {
        EngineTuning {
            auto_start_delay_ms: self.auto_start_delay_ms,
            completion_cooldown_ms: self.completion_cooldown_ms,
            duplicate_window_ms: self.duplicate_window_ms,
        }
    }

    /// Tick interval, never below 10ms.
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms.max(10))
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|e| invalid(e.to_string()))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot overwrite a section".into()))
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.timer.tick_interval_ms, 250);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[timer]\ntick_interval_ms = 100\n").unwrap();
        assert_eq!(parsed.timer.tick_interval_ms, 100);
        assert_eq!(parsed.timer.auto_start_delay_ms, 200);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("timer.duplicate_window_ms").as_deref(), Some("1000"));
        assert_eq!(cfg.get("logging.level").as_deref(), Some("info"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("timer.tick_interval_ms", "500").unwrap();
        cfg.set("notifications.enabled", "false").unwrap();
        cfg.set("logging.level", "debug").unwrap();
        assert_eq!(cfg.timer.tick_interval_ms, 500);
        assert!(!cfg.notifications.enabled);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("notifications.enabled", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("timer", "1").is_err());
    }

    #[test]
    fn tuning_mirrors_timer_section() {
        let mut cfg = Config::default();
        cfg.timer.completion_cooldown_ms = 50;
        let tuning = cfg.timer.tuning();
        assert_eq!(tuning.completion_cooldown_ms, 50);
        assert_eq!(tuning.auto_start_delay_ms, 200);
        cfg.timer.tick_interval_ms = 0;
        assert_eq!(cfg.timer.tick_interval().as_millis(), 10);
    }
}
