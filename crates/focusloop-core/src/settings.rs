//! User-tunable durations and behaviour flags.
//!
//! Settings are mutated only through [`Settings::with_field`], which coerces
//! any input to the nearest valid value instead of failing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timer::Phase;

pub const MS_PER_MINUTE: u64 = 60_000;

pub const MAX_WORK_MINUTES: u32 = 90;
pub const MAX_SHORT_BREAK_MINUTES: u32 = 60;
pub const MAX_LONG_BREAK_MINUTES: u32 = 60;
pub const MAX_INTERVALS_BEFORE_LONG_BREAK: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_intervals_before_long_break")]
    pub intervals_before_long_break: u32,
    #[serde(default = "default_true")]
    pub auto_start_next: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_intervals_before_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            intervals_before_long_break: default_intervals_before_long_break(),
            auto_start_next: true,
            sound_enabled: true,
        }
    }
}

/// A single editable field of [`Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingField {
    WorkMinutes,
    ShortBreakMinutes,
    LongBreakMinutes,
    IntervalsBeforeLongBreak,
    AutoStartNext,
    SoundEnabled,
}

impl SettingField {
    pub const ALL: [SettingField; 6] = [
        SettingField::WorkMinutes,
        SettingField::ShortBreakMinutes,
        SettingField::LongBreakMinutes,
        SettingField::IntervalsBeforeLongBreak,
        SettingField::AutoStartNext,
        SettingField::SoundEnabled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingField::WorkMinutes => "work_minutes",
            SettingField::ShortBreakMinutes => "short_break_minutes",
            SettingField::LongBreakMinutes => "long_break_minutes",
            SettingField::IntervalsBeforeLongBreak => "intervals_before_long_break",
            SettingField::AutoStartNext => "auto_start_next",
            SettingField::SoundEnabled => "sound_enabled",
        }
    }

    /// Inclusive numeric range, `None` for boolean fields.
    pub fn bounds(self) -> Option<(u32, u32)> {
        match self {
            SettingField::WorkMinutes => Some((1, MAX_WORK_MINUTES)),
            SettingField::ShortBreakMinutes => Some((1, MAX_SHORT_BREAK_MINUTES)),
            SettingField::LongBreakMinutes => Some((1, MAX_LONG_BREAK_MINUTES)),
            SettingField::IntervalsBeforeLongBreak => Some((1, MAX_INTERVALS_BEFORE_LONG_BREAK)),
            SettingField::AutoStartNext | SettingField::SoundEnabled => None,
        }
    }

    /// Whether a change to this field alters a phase duration.
    pub fn affects_duration(self) -> bool {
        matches!(
            self,
            SettingField::WorkMinutes | SettingField::ShortBreakMinutes | SettingField::LongBreakMinutes
        )
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "workminutes" | "work" => Ok(SettingField::WorkMinutes),
            "shortbreakminutes" | "shortbreak" => Ok(SettingField::ShortBreakMinutes),
            "longbreakminutes" | "longbreak" => Ok(SettingField::LongBreakMinutes),
            "intervalsbeforelongbreak" | "intervals" => Ok(SettingField::IntervalsBeforeLongBreak),
            "autostartnext" | "autostart" => Ok(SettingField::AutoStartNext),
            "soundenabled" | "sound" => Ok(SettingField::SoundEnabled),
            _ => Err(format!("unknown setting: {s}")),
        }
    }
}

impl Settings {
    /// Full duration of `phase` in milliseconds.
    pub fn phase_duration_ms(&self, phase: Phase) -> u64 {
        let minutes = match phase {
            Phase::Work => self.work_minutes,
            Phase::ShortBreak => self.short_break_minutes,
            Phase::LongBreak => self.long_break_minutes,
        };
        u64::from(minutes).saturating_mul(MS_PER_MINUTE)
    }

    /// Return a copy with `field` set to the coerced `value`.
    pub fn with_field(&self, field: SettingField, value: &Value) -> Settings {
        let mut next = self.clone();
        match field {
            SettingField::WorkMinutes => next.work_minutes = coerce_minutes(field, value),
            SettingField::ShortBreakMinutes => next.short_break_minutes = coerce_minutes(field, value),
            SettingField::LongBreakMinutes => next.long_break_minutes = coerce_minutes(field, value),
            SettingField::IntervalsBeforeLongBreak => {
                next.intervals_before_long_break = coerce_minutes(field, value)
            }
            SettingField::AutoStartNext => next.auto_start_next = coerce_flag(value),
            SettingField::SoundEnabled => next.sound_enabled = coerce_flag(value),
        }
        next
    }

    /// Current value of `field` as JSON.
    pub fn get(&self, field: SettingField) -> Value {
        match field {
            SettingField::WorkMinutes => self.work_minutes.into(),
            SettingField::ShortBreakMinutes => self.short_break_minutes.into(),
            SettingField::LongBreakMinutes => self.long_break_minutes.into(),
            SettingField::IntervalsBeforeLongBreak => self.intervals_before_long_break.into(),
            SettingField::AutoStartNext => self.auto_start_next.into(),
            SettingField::SoundEnabled => self.sound_enabled.into(),
        }
    }

    /// Re-apply bounds, e.g. after loading a hand-edited store.
    pub fn sanitized(&self) -> Settings {
        let clamp = |field: SettingField, v: u32| {
            let (lo, hi) = field.bounds().unwrap_or((1, u32::MAX));
            v.clamp(lo, hi)
        };
        Settings {
            work_minutes: clamp(SettingField::WorkMinutes, self.work_minutes),
            short_break_minutes: clamp(SettingField::ShortBreakMinutes, self.short_break_minutes),
            long_break_minutes: clamp(SettingField::LongBreakMinutes, self.long_break_minutes),
            intervals_before_long_break: clamp(
                SettingField::IntervalsBeforeLongBreak,
                self.intervals_before_long_break,
            ),
            auto_start_next: self.auto_start_next,
            sound_enabled: self.sound_enabled,
        }
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn coerce_minutes(field: SettingField, value: &Value) -> u32 {
    let (lo, hi) = field.bounds().unwrap_or((1, u32::MAX));
    match numeric(value) {
        Some(n) if n.is_finite() && n >= f64::from(lo) => {
            let truncated = n.trunc();
            if truncated >= f64::from(hi) {
                hi
            } else {
                truncated as u32
            }
        }
        _ => lo,
    }
}

fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && f.is_finite()).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "on" | "yes" | "1"
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_classic_pomodoro() {
        let s = Settings::default();
        assert_eq!(s.work_minutes, 25);
        assert_eq!(s.short_break_minutes, 5);
        assert_eq!(s.long_break_minutes, 15);
        assert_eq!(s.intervals_before_long_break, 4);
        assert!(s.auto_start_next);
        assert!(s.sound_enabled);
        assert_eq!(s.phase_duration_ms(Phase::Work), 1_500_000);
    }

    #[test]
    fn invalid_numbers_fall_back_to_one() {
        let s = Settings::default();
        for bad in [json!("abc"), json!(null), json!(0), json!(-3), json!([1]), json!(0.5)] {
            let next = s.with_field(SettingField::WorkMinutes, &bad);
            assert_eq!(next.work_minutes, 1, "input {bad}");
        }
    }

    #[test]
    fn numbers_are_truncated_and_clamped() {
        let s = Settings::default();
        assert_eq!(s.with_field(SettingField::WorkMinutes, &json!(30.9)).work_minutes, 30);
        assert_eq!(s.with_field(SettingField::WorkMinutes, &json!("45")).work_minutes, 45);
        assert_eq!(s.with_field(SettingField::WorkMinutes, &json!(500)).work_minutes, 90);
        assert_eq!(
            s.with_field(SettingField::ShortBreakMinutes, &json!(61)).short_break_minutes,
            60
        );
        assert_eq!(
            s.with_field(SettingField::IntervalsBeforeLongBreak, &json!(0))
                .intervals_before_long_break,
            1
        );
    }

    #[test]
    fn flags_accept_common_spellings() {
        let s = Settings::default();
        assert!(!s.with_field(SettingField::SoundEnabled, &json!("off")).sound_enabled);
        assert!(!s.with_field(SettingField::SoundEnabled, &json!("garbage")).sound_enabled);
        let off = Settings { auto_start_next: false, ..Settings::default() };
        assert!(off.with_field(SettingField::AutoStartNext, &json!("true")).auto_start_next);
        assert!(off.with_field(SettingField::AutoStartNext, &json!(1)).auto_start_next);
    }

    #[test]
    fn field_names_parse_in_both_cases() {
        assert_eq!("workMinutes".parse::<SettingField>().unwrap(), SettingField::WorkMinutes);
        assert_eq!(
            "intervals_before_long_break".parse::<SettingField>().unwrap(),
            SettingField::IntervalsBeforeLongBreak
        );
        assert!("volume".parse::<SettingField>().is_err());
    }

    #[test]
    fn sanitized_repairs_out_of_range_values() {
        let broken = Settings {
            work_minutes: 0,
            long_break_minutes: 600,
            intervals_before_long_break: 0,
            ..Settings::default()
        };
        let fixed = broken.sanitized();
        assert_eq!(fixed.work_minutes, 1);
        assert_eq!(fixed.long_break_minutes, 60);
        assert_eq!(fixed.intervals_before_long_break, 1);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let s: Settings = serde_json::from_value(json!({ "work_minutes": 50 })).unwrap();
        assert_eq!(s.work_minutes, 50);
        assert_eq!(s.short_break_minutes, 5);
    }
}
