use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The current timer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Phase {
    #[default]
    #[serde(rename = "work")]
    Work,
    #[serde(rename = "short")]
    ShortBreak,
    #[serde(rename = "long")]
    LongBreak,
}

impl Phase {
    /// Storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::ShortBreak => "short",
            Phase::LongBreak => "long",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::ShortBreak => "Short break",
            Phase::LongBreak => "Long break",
        }
    }

    /// Order used by a manual "next" request: Work -> Short -> Long -> Work.
    pub fn cycle_next(self) -> Phase {
        match self {
            Phase::Work => Phase::ShortBreak,
            Phase::ShortBreak => Phase::LongBreak,
            Phase::LongBreak => Phase::Work,
        }
    }

    /// Phase entered after this one completes naturally.
    ///
    /// `completed_work_intervals` must already include the interval that just
    /// finished when `self` is `Work`.
    pub fn after_completion(self, completed_work_intervals: u32, intervals_before_long_break: u32) -> Phase {
        match self {
            Phase::Work => {
                let every = intervals_before_long_break.max(1);
                if completed_work_intervals % every == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        }
    }

    /// Notification `(title, body)` shown when this phase completes.
    pub fn completion_copy(self) -> (&'static str, &'static str) {
        match self {
            Phase::Work => ("Focusloop", "Time to rest!"),
            Phase::ShortBreak | Phase::LongBreak => ("Focusloop", "Time to work!"),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" | "focus" => Ok(Phase::Work),
            "short" | "short_break" | "shortbreak" => Ok(Phase::ShortBreak),
            "long" | "long_break" | "longbreak" => Ok(Phase::LongBreak),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

/// Argument of a forced phase switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseTarget {
    Phase(Phase),
    Next,
}

impl PhaseTarget {
    pub fn resolve(self, current: Phase) -> Phase {
        match self {
            PhaseTarget::Phase(p) => p,
            PhaseTarget::Next => current.cycle_next(),
        }
    }
}

impl From<Phase> for PhaseTarget {
    fn from(phase: Phase) -> Self {
        PhaseTarget::Phase(phase)
    }
}

impl FromStr for PhaseTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("next") {
            return Ok(PhaseTarget::Next);
        }
        s.parse::<Phase>().map(PhaseTarget::Phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_with_four_intervals() {
        let breaks: Vec<Phase> = (1..=4)
            .map(|n| Phase::Work.after_completion(n, 4))
            .collect();
        assert_eq!(
            breaks,
            vec![Phase::ShortBreak, Phase::ShortBreak, Phase::ShortBreak, Phase::LongBreak]
        );
    }

    #[test]
    fn single_interval_always_long() {
        assert_eq!(Phase::Work.after_completion(1, 1), Phase::LongBreak);
        assert_eq!(Phase::Work.after_completion(7, 1), Phase::LongBreak);
    }

    #[test]
    fn breaks_return_to_work() {
        assert_eq!(Phase::ShortBreak.after_completion(3, 4), Phase::Work);
        assert_eq!(Phase::LongBreak.after_completion(4, 4), Phase::Work);
    }

    #[test]
    fn next_target_cycles() {
        assert_eq!(PhaseTarget::Next.resolve(Phase::Work), Phase::ShortBreak);
        assert_eq!(PhaseTarget::Next.resolve(Phase::ShortBreak), Phase::LongBreak);
        assert_eq!(PhaseTarget::Next.resolve(Phase::LongBreak), Phase::Work);
    }

    #[test]
    fn parses_storage_and_long_names() {
        assert_eq!("short".parse::<Phase>().unwrap(), Phase::ShortBreak);
        assert_eq!("long_break".parse::<Phase>().unwrap(), Phase::LongBreak);
        assert_eq!("NEXT".parse::<PhaseTarget>().unwrap(), PhaseTarget::Next);
        assert!("nap".parse::<Phase>().is_err());
    }

    #[test]
    fn serializes_to_storage_names() {
        assert_eq!(serde_json::to_string(&Phase::ShortBreak).unwrap(), "\"short\"");
        let back: Phase = serde_json::from_str("\"long\"").unwrap();
        assert_eq!(back, Phase::LongBreak);
    }
}
