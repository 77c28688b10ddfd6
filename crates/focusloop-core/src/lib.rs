//! # Focusloop Core Library
//!
//! This library provides the core logic for the Focusloop interval timer: a
//! single-user cycle of Work and break phases with a persisted log of
//! completed focus sessions. The CLI binary is a thin presentation layer over
//! the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A clock-driven state machine that requires the caller
//!   to periodically invoke `tick()` while running
//! - **Service**: A tokio task that owns one engine and serializes user
//!   commands, ticks and deferred actions onto a single queue
//! - **Storage**: A generic key -> JSON store (SQLite or in-memory) and
//!   TOML-based host configuration
//! - **Notify**: Narrow traits for the completion chime and system
//!   notifications
//!
//! ## Key Components
//!
//! - [`PhaseTimerEngine`]: Core timer state machine
//! - [`TimerService`]: Serialized actor hosting the engine
//! - [`SessionLog`]: Completed focus sessions
//! - [`Config`]: Host configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod service;
pub mod session;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, NotifyError, StorageError};
pub use events::Event;
pub use notify::{ChimePlayer, Notifier, Permission, SilentChime, SilentNotifier};
pub use service::{Command, RuntimeClock, TimerHandle, TimerService};
pub use session::{Session, SessionLog, SessionType};
pub use settings::{SettingField, Settings};
pub use stats::{day_summary, week_summary, DaySummary, DayTotal, WeekSummary};
pub use storage::{Config, KeyValueStore, MemoryStore, PersistedState, SqliteStore};
pub use timer::{
    Clock, ClockDriver, EngineTuning, ManualClock, Phase, PhaseTarget, PhaseTimerEngine,
    SystemClock, TimerSnapshot,
};
