//! Simple aggregation of the session log for display.
//!
//! Weeks start on Monday. Day boundaries are taken in the time zone of the
//! reference timestamp the caller passes in.

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionType};
use crate::settings::MS_PER_MINUTE;

/// Minimum chart scale, so a light day does not render as a full bar.
pub const MIN_CHART_SCALE_MS: u64 = 30 * MS_PER_MINUTE;

/// Sessions listed per day.
pub const DAY_LISTING_LIMIT: usize = 20;

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub label: String,
    pub work_sessions: u32,
    pub work_ms: u64,
    /// Bar height relative to the week's scale, 0..=100.
    pub bar_pct: u8,
}

impl DayTotal {
    pub fn work_minutes(&self) -> u64 {
        round_minutes(self.work_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub week_start: NaiveDate,
    pub days: Vec<DayTotal>,
    pub scale_ms: u64,
    pub today_index: usize,
}

impl WeekSummary {
    pub fn total_work_ms(&self) -> u64 {
        self.days.iter().map(|d| d.work_ms).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub work_sessions: u32,
    pub work_minutes: u64,
    /// Most recent first, at most [`DAY_LISTING_LIMIT`].
    pub sessions: Vec<Session>,
}

/// Milliseconds to whole minutes, rounding half up.
pub fn round_minutes(ms: u64) -> u64 {
    ms.saturating_add(MS_PER_MINUTE / 2) / MS_PER_MINUTE
}

fn local_date<Tz: TimeZone>(tz: &Tz, epoch_ms: u64) -> Option<NaiveDate> {
    let ms = i64::try_from(epoch_ms).ok()?;
    tz.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.date_naive())
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Per-day work totals for the week containing `now`.
pub fn week_summary<Tz: TimeZone>(sessions: &[Session], now: &DateTime<Tz>) -> WeekSummary {
    let tz = now.timezone();
    let today = now.date_naive();
    let start = week_start(today);

    let mut days: Vec<DayTotal> = (0..7u64)
        .map(|i| DayTotal {
            date: start.checked_add_days(Days::new(i)).unwrap_or(start),
            label: WEEKDAY_LABELS[i as usize].to_string(),
            work_sessions: 0,
            work_ms: 0,
            bar_pct: 0,
        })
        .collect();

    for session in sessions.iter().filter(|s| s.session_type == SessionType::Work) {
        let Some(date) = local_date(&tz, session.completed_at) else {
            continue;
        };
        let idx = (date - start).num_days();
        if let Some(day) = usize::try_from(idx).ok().and_then(|i| days.get_mut(i)) {
            day.work_sessions += 1;
            day.work_ms = day.work_ms.saturating_add(session.duration_ms);
        }
    }

    let scale_ms = days
        .iter()
        .map(|d| d.work_ms)
        .max()
        .unwrap_or(0)
        .max(MIN_CHART_SCALE_MS);
    for day in &mut days {
        let pct = (day.work_ms as f64 / scale_ms as f64 * 100.0).round();
        day.bar_pct = pct.clamp(0.0, 100.0) as u8;
    }

    WeekSummary {
        week_start: start,
        days,
        scale_ms,
        today_index: today.weekday().num_days_from_monday() as usize,
    }
}

/// Work sessions completed on `date` in `tz`.
pub fn day_summary<Tz: TimeZone>(sessions: &[Session], date: NaiveDate, tz: &Tz) -> DaySummary {
    let mut of_day: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.session_type == SessionType::Work)
        .filter(|s| local_date(tz, s.completed_at) == Some(date))
        .collect();
    of_day.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    let total_ms: u64 = of_day.iter().map(|s| s.duration_ms).sum();
    DaySummary {
        date,
        work_sessions: of_day.len() as u32,
        work_minutes: round_minutes(total_ms),
        sessions: of_day
            .into_iter()
            .take(DAY_LISTING_LIMIT)
            .cloned()
            .collect(),
    }
}
