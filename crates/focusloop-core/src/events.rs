use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::settings::{SettingField, Settings};
use crate::timer::Phase;

/// Every state change in the engine produces an Event.
/// The presentation layer subscribes to them; the snapshot is the read model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    PhaseSwitched {
        from: Phase,
        to: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// A countdown reached zero and its side effects ran.
    PhaseCompleted {
        phase: Phase,
        next: Phase,
        completed_work_intervals: u32,
        session: Option<Session>,
        at: DateTime<Utc>,
    },
    /// A zero-crossing arrived inside the duplicate window and was dropped.
    CompletionSuppressed {
        phase: Phase,
        at: DateTime<Utc>,
    },
    AutoStartScheduled {
        phase: Phase,
        due_at_ms: u64,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        field: SettingField,
        settings: Settings,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    HistoryCleared {
        removed: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerReset { at, .. }
            | Event::PhaseSwitched { at, .. }
            | Event::PhaseCompleted { at, .. }
            | Event::CompletionSuppressed { at, .. }
            | Event::AutoStartScheduled { at, .. }
            | Event::SettingsChanged { at, .. }
            | Event::HistoryCleared { at, .. } => *at,
        }
    }
}

/// Converts an engine clock reading to a timestamp.
pub(crate) fn timestamp(ms: u64) -> DateTime<Utc> {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::PhaseSwitched {
            from: Phase::Work,
            to: Phase::ShortBreak,
            remaining_ms: 300_000,
            at: timestamp(0),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "phase_switched");
        assert_eq!(json["to"], "short");
    }

    #[test]
    fn timestamp_from_epoch_ms() {
        assert_eq!(timestamp(1_000).timestamp(), 1);
        assert_eq!(Event::HistoryCleared { removed: 0, at: timestamp(5_000) }.at().timestamp(), 5);
    }
}
