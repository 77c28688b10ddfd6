//! Append-only log of completed focus sessions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    #[default]
    Work,
}

/// One completed Work phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(rename = "type", default)]
    pub session_type: SessionType,
    /// Epoch milliseconds.
    pub completed_at: u64,
    pub duration_ms: u64,
}

impl Session {
    pub fn work(completed_at: u64, duration_ms: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_type: SessionType::Work,
            completed_at,
            duration_ms,
        }
    }
}

/// Most-recent-first, unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLog {
    #[serde(default)]
    sessions: Vec<Session>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries in any order; they are sorted newest first.
    pub fn from_sessions(mut sessions: Vec<Session>) -> Self {
        sessions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Self { sessions }
    }

    pub fn head(&self) -> Option<&Session> {
        self.sessions.first()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn as_slice(&self) -> &[Session] {
        &self.sessions
    }

    /// Prepend `session` unless the newest entry completed within
    /// `duplicate_window_ms` of it. Returns whether it was recorded.
    pub fn record(&mut self, session: Session, duplicate_window_ms: u64) -> bool {
        if let Some(head) = self.head() {
            if head.completed_at.abs_diff(session.completed_at) < duplicate_window_ms {
                return false;
            }
        }
        self.sessions.insert(0, session);
        true
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first() {
        let mut log = SessionLog::new();
        assert!(log.record(Session::work(1_000, 60_000), 1_000));
        assert!(log.record(Session::work(90_000, 60_000), 1_000));
        assert_eq!(log.head().unwrap().completed_at, 90_000);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn rejects_entry_inside_duplicate_window() {
        let mut log = SessionLog::new();
        assert!(log.record(Session::work(10_000, 60_000), 1_000));
        assert!(!log.record(Session::work(10_999, 60_000), 1_000));
        assert!(log.record(Session::work(11_000, 60_000), 1_000));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn ids_are_unique() {
        let a = Session::work(1, 1);
        let b = Session::work(1, 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn serialized_shape() {
        let s = Session {
            id: "abc".into(),
            session_type: SessionType::Work,
            completed_at: 42,
            duration_ms: 1_500_000,
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["type"], "work");
        assert_eq!(json["duration_ms"], 1_500_000);
    }

    #[test]
    fn from_sessions_sorts_and_clear_empties() {
        let mut log = SessionLog::from_sessions(vec![Session::work(5, 1), Session::work(9, 1)]);
        assert_eq!(log.head().unwrap().completed_at, 9);
        log.clear();
        assert!(log.is_empty());
    }
}
