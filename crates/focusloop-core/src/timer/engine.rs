//! Phase timer engine.
//!
//! The engine is a single-threaded state machine over
//! `{Work, ShortBreak, LongBreak} x {Idle, Running}`. It owns no threads and
//! no timers of its own: the host calls [`PhaseTimerEngine::tick`] from a
//! best-effort periodic callback while the engine is running, and wakes it at
//! [`PhaseTimerEngine::next_deadline`] for deferred actions (auto-start and the
//! completion cooldown).
//!
//! ## State Transitions
//!
//! ```text
//! start:        Idle -> Running          (same phase)
//! pause:        Running -> Idle
//! zero:         Running -> Idle -> complete -> switch_phase(next) [-> auto-start]
//! switch_phase: * -> Idle                (new phase, full duration)
//! reset:        * -> Idle                (same phase, full duration)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = PhaseTimerEngine::builder(MemoryStore::new()).build();
//! engine.start();
//! // From the periodic callback:
//! for event in engine.tick() { /* render */ }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::clock::{Clock, ClockDriver, SystemClock};
use super::deferred::DeferredAction;
use super::phase::{Phase, PhaseTarget};
use crate::events::{timestamp, Event};
use crate::notify::{ChimePlayer, Notifier, SilentChime, SilentNotifier};
use crate::session::{Session, SessionLog};
use crate::settings::{SettingField, Settings};
use crate::storage::{KeyValueStore, StateWriter};

/// Timing windows used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineTuning {
    /// Delay between a completion and the automatic start of the next phase.
    pub auto_start_delay_ms: u64,
    /// How long the completion guard stays raised after a completion.
    pub completion_cooldown_ms: u64,
    /// Completions (and logged sessions) closer than this are duplicates.
    pub duplicate_window_ms: u64,
}

impl EngineTuning {
    pub const DEFAULT_AUTO_START_DELAY_MS: u64 = 200;
    pub const DEFAULT_COMPLETION_COOLDOWN_MS: u64 = 300;
    pub const DEFAULT_DUPLICATE_WINDOW_MS: u64 = 1_000;
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            auto_start_delay_ms: Self::DEFAULT_AUTO_START_DELAY_MS,
            completion_cooldown_ms: Self::DEFAULT_COMPLETION_COOLDOWN_MS,
            duplicate_window_ms: Self::DEFAULT_DUPLICATE_WINDOW_MS,
        }
    }
}

/// Read model for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub phase_label: String,
    pub is_running: bool,
    pub remaining_ms: u64,
    /// `MM:SS`, rounded to the nearest second.
    pub formatted_time: String,
    pub phase_duration_ms: u64,
    /// `1 - remaining / duration`, clamped to `0.0..=1.0`.
    pub progress: f64,
    pub completed_work_intervals: u32,
    pub settings: Settings,
    pub sessions: Vec<Session>,
    pub auto_start_due_ms: Option<u64>,
}

/// Formats milliseconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_mm_ss(ms: u64) -> String {
    let total_secs = ms.saturating_add(500) / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

pub struct EngineBuilder {
    store: Box<dyn KeyValueStore>,
    notifier: Box<dyn Notifier>,
    chime: Box<dyn ChimePlayer>,
    clock: Arc<dyn Clock>,
    tuning: EngineTuning,
}

impl EngineBuilder {
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn chime(mut self, chime: impl ChimePlayer + 'static) -> Self {
        self.chime = Box::new(chime);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn tuning(mut self, tuning: EngineTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Restore persisted state and request notification permission.
    ///
    /// The engine always comes up idle, at the full duration of the stored
    /// phase.
    pub fn build(self) -> PhaseTimerEngine {
        let mut writer = StateWriter::new(self.store);
        let state = writer.load();
        if state.was_running {
            tracing::debug!("Timer was running at shutdown; restoring as idle");
            writer.save_running(false);
        }

        let mut notifier = self.notifier;
        let permission = notifier.request_permission();
        tracing::debug!(?permission, "Notification permission");

        let remaining_ms = state.settings.phase_duration_ms(state.phase);
        let last_completion_ms = state.sessions.head().map(|s| s.completed_at);

        PhaseTimerEngine {
            settings: state.settings,
            phase: state.phase,
            running: false,
            remaining_ms,
            completed_work_intervals: state.completed_work_intervals,
            sessions: state.sessions,
            driver: ClockDriver::new(),
            auto_start: DeferredAction::new(),
            cooldown: DeferredAction::new(),
            last_completion_ms,
            disposed: false,
            tuning: self.tuning,
            writer,
            notifier,
            chime: self.chime,
            clock: self.clock,
        }
    }
}

/// Core timer engine.
///
/// Not internally synchronized: every call must come from one serialized
/// context (see [`crate::service`]).
pub struct PhaseTimerEngine {
    settings: Settings,
    phase: Phase,
    running: bool,
    remaining_ms: u64,
    completed_work_intervals: u32,
    sessions: SessionLog,
    driver: ClockDriver,
    auto_start: DeferredAction,
    /// Raised for `completion_cooldown_ms` after each completion.
    cooldown: DeferredAction,
    last_completion_ms: Option<u64>,
    disposed: bool,
    tuning: EngineTuning,
    writer: StateWriter,
    notifier: Box<dyn Notifier>,
    chime: Box<dyn ChimePlayer>,
    clock: Arc<dyn Clock>,
}

impl PhaseTimerEngine {
    pub fn builder(store: impl KeyValueStore + 'static) -> EngineBuilder {
        EngineBuilder {
            store: Box::new(store),
            notifier: Box::new(SilentNotifier),
            chime: Box::new(SilentChime),
            clock: Arc::new(SystemClock),
            tuning: EngineTuning::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn completed_work_intervals(&self) -> u32 {
        self.completed_work_intervals
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sessions(&self) -> &SessionLog {
        &self.sessions
    }

    pub fn tuning(&self) -> EngineTuning {
        self.tuning
    }

    /// Current reading of the engine's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn phase_duration_ms(&self) -> u64 {
        self.settings.phase_duration_ms(self.phase)
    }

    pub fn formatted_time(&self) -> String {
        format_mm_ss(self.remaining_ms)
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.phase_duration_ms();
        if total == 0 {
            return 0.0;
        }
        (1.0 - self.remaining_ms as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn auto_start_pending(&self) -> bool {
        self.auto_start.is_pending()
    }

    pub fn completion_guard_raised(&self) -> bool {
        self.cooldown.is_pending()
    }

    /// Earliest pending deferred action, in clock milliseconds.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.auto_start.deadline(), self.cooldown.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            phase_label: self.phase.label().to_string(),
            is_running: self.running,
            remaining_ms: self.remaining_ms,
            formatted_time: self.formatted_time(),
            phase_duration_ms: self.phase_duration_ms(),
            progress: self.progress(),
            completed_work_intervals: self.completed_work_intervals,
            settings: self.settings.clone(),
            sessions: self.sessions.as_slice().to_vec(),
            auto_start_due_ms: self.auto_start.deadline(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.disposed {
            return None;
        }
        self.auto_start.cancel();
        if self.running {
            return None;
        }
        let now = self.clock.now_ms();
        Some(self.begin_running(now))
    }

    /// Stop the countdown, first charging the time run since the last tick.
    ///
    /// If that time reaches zero the phase completes instead, and the next
    /// phase stays idle.
    pub fn pause(&mut self) -> Vec<Event> {
        if self.disposed {
            return Vec::new();
        }
        if self.auto_start.cancel() {
            tracing::debug!("Pending auto-start cancelled by pause");
        }
        if !self.running {
            return Vec::new();
        }

        let now = self.clock.now_ms();
        let delta = self.driver.delta(now);
        let mut events = self.apply_elapsed(delta, now);
        if !events.is_empty() {
            self.auto_start.cancel();
            events.retain(|e| !matches!(e, Event::AutoStartScheduled { .. }));
            return events;
        }

        self.stop_running();
        tracing::debug!(phase = %self.phase, remaining_ms = self.remaining_ms, "Timer paused");
        vec![Event::TimerPaused {
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            at: timestamp(now),
        }]
    }

    pub fn reset(&mut self) -> Option<Event> {
        if self.disposed {
            return None;
        }
        self.auto_start.cancel();
        if self.running {
            self.stop_running();
        }
        self.remaining_ms = self.phase_duration_ms();
        tracing::debug!(phase = %self.phase, "Timer reset");
        Some(Event::TimerReset {
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            at: self.now(),
        })
    }

    /// Force a transition, regardless of remaining time. Used for "skip".
    pub fn switch_phase(&mut self, target: impl Into<PhaseTarget>) -> Option<Event> {
        if self.disposed {
            return None;
        }
        self.auto_start.cancel();
        let next = target.into().resolve(self.phase);
        Some(self.enter_phase(next))
    }

    pub fn edit_setting(&mut self, field: SettingField, value: &serde_json::Value) -> Option<Event> {
        if self.disposed {
            return None;
        }
        self.settings = self.settings.with_field(field, value);
        self.writer.save_settings(&self.settings);
        if !self.running && field.affects_duration() {
            // A running countdown keeps its remaining time until the next switch.
            self.remaining_ms = self.phase_duration_ms();
        }
        tracing::debug!(%field, value = %self.settings.get(field), "Setting changed");
        Some(Event::SettingsChanged {
            field,
            settings: self.settings.clone(),
            remaining_ms: self.remaining_ms,
            at: self.now(),
        })
    }

    pub fn clear_history(&mut self) -> Option<Event> {
        if self.disposed {
            return None;
        }
        let removed = self.sessions.len();
        self.sessions.clear();
        self.writer.save_sessions(&self.sessions);
        tracing::info!(removed, "Session history cleared");
        Some(Event::HistoryCleared {
            removed,
            at: self.now(),
        })
    }

    /// Cancel every pending callback. A disposed engine ignores all input.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.running = false;
        self.driver.disarm();
        self.auto_start.cancel();
        self.cooldown.cancel();
        self.disposed = true;
        tracing::debug!("Timer engine disposed");
    }

    // ── Clock entry points ───────────────────────────────────────────

    /// Periodic callback: fire due deferred actions, then apply the elapsed
    /// time since the previous tick.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.disposed {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let mut events = self.poll_deferred_at(now);
        if self.running && self.driver.is_subscribed() {
            let delta = self.driver.delta(now);
            events.extend(self.apply_elapsed(delta, now));
        }
        events
    }

    /// Fire deferred actions whose deadline has passed.
    pub fn poll_deferred(&mut self) -> Vec<Event> {
        if self.disposed {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        self.poll_deferred_at(now)
    }

    /// Apply an elapsed-time delta to the running countdown.
    ///
    /// Ignored while idle, so a stale callback can never move a paused timer.
    pub fn on_tick(&mut self, delta_ms: u64) -> Vec<Event> {
        if self.disposed {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        self.apply_elapsed(delta_ms, now)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        timestamp(self.clock.now_ms())
    }

    fn begin_running(&mut self, now: u64) -> Event {
        self.running = true;
        self.driver.arm(now);
        self.writer.save_running(true);
        tracing::debug!(phase = %self.phase, remaining_ms = self.remaining_ms, "Timer started");
        Event::TimerStarted {
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            at: timestamp(now),
        }
    }

    fn stop_running(&mut self) {
        self.running = false;
        self.driver.disarm();
        self.writer.save_running(false);
    }

    fn enter_phase(&mut self, next: Phase) -> Event {
        let from = self.phase;
        if self.running {
            self.stop_running();
        }
        self.phase = next;
        self.remaining_ms = self.phase_duration_ms();
        self.writer.save_phase(next);
        tracing::debug!(%from, to = %next, "Phase switched");
        Event::PhaseSwitched {
            from,
            to: next,
            remaining_ms: self.remaining_ms,
            at: self.now(),
        }
    }

    fn poll_deferred_at(&mut self, now: u64) -> Vec<Event> {
        let mut events = Vec::new();
        if self.cooldown.fire_if_due(now) {
            tracing::trace!("Completion guard lowered");
        }
        if self.auto_start.fire_if_due(now) && !self.running {
            tracing::debug!(phase = %self.phase, "Auto-starting next phase");
            events.push(self.begin_running(now));
        }
        events
    }

    fn apply_elapsed(&mut self, delta_ms: u64, now: u64) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(delta_ms);
        if self.remaining_ms > 0 {
            return Vec::new();
        }
        self.stop_running();
        self.complete(now)
    }

    /// Completion side effects and transition. Runs at most once per
    /// zero-crossing, however many duplicate triggers arrive.
    fn complete(&mut self, now: u64) -> Vec<Event> {
        let completed = self.phase;
        if self.cooldown.is_pending() || self.is_duplicate_completion(now) {
            tracing::debug!(phase = %completed, "Duplicate completion suppressed");
            return vec![Event::CompletionSuppressed {
                phase: completed,
                at: timestamp(now),
            }];
        }
        self.cooldown.schedule(now.saturating_add(self.tuning.completion_cooldown_ms));
        self.last_completion_ms = Some(now);

        self.fire_side_effects(completed);

        let mut session = None;
        if completed == Phase::Work {
            let record = Session::work(now, self.settings.phase_duration_ms(Phase::Work));
            if self.sessions.record(record.clone(), self.tuning.duplicate_window_ms) {
                self.writer.save_sessions(&self.sessions);
                session = Some(record);
            }
            self.completed_work_intervals = self.completed_work_intervals.saturating_add(1);
            self.writer.save_completed_work_intervals(self.completed_work_intervals);
        }

        let next = completed.after_completion(
            self.completed_work_intervals,
            self.settings.intervals_before_long_break,
        );
        tracing::info!(
            phase = %completed,
            %next,
            completed_work_intervals = self.completed_work_intervals,
            "Phase completed"
        );

        let mut events = vec![Event::PhaseCompleted {
            phase: completed,
            next,
            completed_work_intervals: self.completed_work_intervals,
            session,
            at: timestamp(now),
        }];
        events.push(self.enter_phase(next));

        if self.settings.auto_start_next {
            let due_at_ms = now.saturating_add(self.tuning.auto_start_delay_ms);
            self.auto_start.schedule(due_at_ms);
            events.push(Event::AutoStartScheduled {
                phase: next,
                due_at_ms,
                at: timestamp(now),
            });
        }
        events
    }

    fn is_duplicate_completion(&self, now: u64) -> bool {
        self.last_completion_ms
            .is_some_and(|last| last.abs_diff(now) < self.tuning.duplicate_window_ms)
    }

    fn fire_side_effects(&mut self, completed: Phase) {
        if self.settings.sound_enabled {
            if let Err(e) = self.chime.play_completion_chime() {
                tracing::warn!(error = %e, "Completion chime failed");
            }
        }
        let (title, body) = completed.completion_copy();
        if let Err(e) = self.notifier.notify(title, body) {
            tracing::warn!(error = %e, "Completion notification failed");
        }
    }
}

impl Drop for PhaseTimerEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::notify::Permission;
    use crate::storage::{keys, MemoryStore};
    use crate::timer::ManualClock;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    const T0: u64 = 1_700_000_000_000;

    #[derive(Clone, Default)]
    struct Recorder {
        notes: Arc<Mutex<Vec<(String, String)>>>,
        chimes: Arc<Mutex<u32>>,
    }

    impl Notifier for Recorder {
        fn request_permission(&mut self) -> Permission {
            Permission::Granted
        }

        fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
            self.notes.lock().unwrap().push((title.into(), body.into()));
            Ok(())
        }
    }

    impl ChimePlayer for Recorder {
        fn play_completion_chime(&mut self) -> Result<(), NotifyError> {
            *self.chimes.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn engine_with(store: MemoryStore, clock: &ManualClock) -> PhaseTimerEngine {
        PhaseTimerEngine::builder(store).clock(clock.clone()).build()
    }

    fn manual_engine() -> (PhaseTimerEngine, ManualClock) {
        let clock = ManualClock::new(T0);
        (engine_with(MemoryStore::new(), &clock), clock)
    }

    #[test]
    fn starts_idle_in_work_at_full_duration() {
        let (engine, _) = manual_engine();
        assert_eq!(engine.phase(), Phase::Work);
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_ms(), 1_500_000);
        assert_eq!(engine.formatted_time(), "25:00");
        assert_eq!(engine.progress(), 0.0);
    }

    #[test]
    fn start_is_noop_when_running() {
        let (mut engine, _) = manual_engine();
        assert!(engine.start().is_some());
        assert!(engine.start().is_none());
        assert!(engine.is_running());
    }

    #[test]
    fn pause_is_idempotent() {
        let (mut engine, clock) = manual_engine();
        engine.start();
        clock.advance(10_000);
        engine.tick();
        assert_eq!(engine.pause().len(), 1);
        assert!(engine.pause().is_empty());
        assert_eq!(engine.remaining_ms(), 1_490_000);
    }

    #[test]
    fn pause_charges_time_since_last_tick() {
        let (mut engine, clock) = manual_engine();
        for _ in 0..10 {
            engine.start();
            clock.advance(240);
            let events = engine.pause();
            assert!(matches!(events.as_slice(), [Event::TimerPaused { .. }]));
        }
        assert_eq!(engine.remaining_ms(), 1_497_600);
    }

    #[test]
    fn pause_past_zero_completes_and_stays_idle() {
        let (mut engine, clock) = manual_engine();
        engine.edit_setting(SettingField::WorkMinutes, &json!(1));
        engine.start();
        clock.advance(60_500);
        let events = engine.pause();
        assert!(events.iter().any(|e| matches!(e, Event::PhaseCompleted { .. })));
        assert!(!events.iter().any(|e| matches!(e, Event::AutoStartScheduled { .. })));
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert_eq!(engine.sessions().len(), 1);
        assert!(!engine.auto_start_pending());
        assert!(!engine.is_running());
    }

    #[test]
    fn ticks_measure_wall_clock_gaps() {
        let (mut engine, clock) = manual_engine();
        engine.start();
        assert!(engine.tick().is_empty());
        assert_eq!(engine.remaining_ms(), 1_500_000);
        clock.advance(600_000);
        engine.tick();
        assert_eq!(engine.remaining_ms(), 900_000);
        assert_eq!(engine.formatted_time(), "15:00");
        assert!((engine.progress() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn paused_engine_ignores_ticks() {
        let (mut engine, clock) = manual_engine();
        engine.start();
        engine.pause();
        clock.advance(60_000);
        assert!(engine.tick().is_empty());
        assert!(engine.on_tick(60_000).is_empty());
        assert_eq!(engine.remaining_ms(), 1_500_000);
    }

    #[test]
    fn resume_after_pause_does_not_count_paused_time() {
        let (mut engine, clock) = manual_engine();
        engine.start();
        clock.advance(1_000);
        engine.tick();
        engine.pause();
        clock.advance(300_000);
        engine.start();
        clock.advance(1_000);
        engine.tick();
        assert_eq!(engine.remaining_ms(), 1_498_000);
    }

    #[test]
    fn reset_restores_current_phase_duration() {
        let (mut engine, clock) = manual_engine();
        engine.switch_phase(Phase::LongBreak);
        engine.start();
        clock.advance(120_000);
        engine.tick();
        engine.reset();
        assert_eq!(engine.phase(), Phase::LongBreak);
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_ms(), 900_000);
    }

    #[test]
    fn switch_phase_stops_and_loads_full_duration() {
        let (mut engine, _) = manual_engine();
        engine.start();
        let event = engine.switch_phase(PhaseTarget::Next).unwrap();
        assert!(matches!(event, Event::PhaseSwitched { from: Phase::Work, to: Phase::ShortBreak, .. }));
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_ms(), 300_000);
    }

    #[test]
    fn settings_edit_while_paused_applies_immediately() {
        let (mut engine, clock) = manual_engine();
        engine.start();
        clock.advance(5_000);
        engine.tick();
        engine.pause();
        engine.edit_setting(SettingField::WorkMinutes, &json!(50));
        assert_eq!(engine.remaining_ms(), 3_000_000);
    }

    #[test]
    fn flag_edits_while_paused_keep_progress() {
        let (mut engine, clock) = manual_engine();
        engine.start();
        clock.advance(5_000);
        engine.pause();
        engine.edit_setting(SettingField::SoundEnabled, &json!(false));
        engine.edit_setting(SettingField::AutoStartNext, &json!("off"));
        engine.edit_setting(SettingField::IntervalsBeforeLongBreak, &json!(2));
        assert_eq!(engine.remaining_ms(), 1_495_000);
    }

    #[test]
    fn settings_edit_while_running_waits_for_next_switch() {
        let (mut engine, clock) = manual_engine();
        engine.start();
        clock.advance(5_000);
        engine.tick();
        engine.edit_setting(SettingField::WorkMinutes, &json!(10));
        assert_eq!(engine.remaining_ms(), 1_495_000);
        engine.reset();
        assert_eq!(engine.remaining_ms(), 600_000);
    }

    #[test]
    fn duplicate_completion_trigger_is_absorbed() {
        let (mut engine, _) = manual_engine();
        let first = engine.complete(T0);
        let second = engine.complete(T0 + 5);
        assert!(matches!(first[0], Event::PhaseCompleted { .. }));
        assert!(matches!(second[..], [Event::CompletionSuppressed { .. }]));
        assert_eq!(engine.sessions().len(), 1);
        assert_eq!(engine.completed_work_intervals(), 1);
        assert_eq!(engine.phase(), Phase::ShortBreak);
    }

    #[test]
    fn completion_after_cooldown_inside_window_is_suppressed() {
        let (mut engine, clock) = manual_engine();
        engine.complete(T0);
        clock.set(T0 + 400);
        engine.poll_deferred();
        assert!(!engine.completion_guard_raised());
        let events = engine.complete(T0 + 400);
        assert!(matches!(events[..], [Event::CompletionSuppressed { .. }]));
        assert_eq!(engine.phase(), Phase::ShortBreak);
    }

    #[test]
    fn completion_fires_side_effects_once() {
        let clock = ManualClock::new(T0);
        let recorder = Recorder::default();
        let mut engine = PhaseTimerEngine::builder(MemoryStore::new())
            .clock(clock.clone())
            .notifier(recorder.clone())
            .chime(recorder.clone())
            .build();
        engine.start();
        engine.on_tick(1_500_000);
        engine.on_tick(16);
        assert_eq!(*recorder.chimes.lock().unwrap(), 1);
        let notes = recorder.notes.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].1, "Time to rest!");
    }

    #[test]
    fn sound_disabled_skips_chime_only() {
        let clock = ManualClock::new(T0);
        let recorder = Recorder::default();
        let mut engine = PhaseTimerEngine::builder(MemoryStore::new())
            .clock(clock.clone())
            .notifier(recorder.clone())
            .chime(recorder.clone())
            .build();
        engine.edit_setting(SettingField::SoundEnabled, &json!(false));
        engine.switch_phase(Phase::ShortBreak);
        engine.start();
        engine.on_tick(300_000);
        assert_eq!(*recorder.chimes.lock().unwrap(), 0);
        assert_eq!(recorder.notes.lock().unwrap()[0].1, "Time to work!");
        assert_eq!(engine.phase(), Phase::Work);
    }

    #[test]
    fn auto_start_fires_after_delay() {
        let (mut engine, clock) = manual_engine();
        engine.start();
        clock.advance(1_500_000);
        engine.tick();
        assert!(!engine.is_running());
        assert!(engine.auto_start_pending());
        assert_eq!(engine.next_deadline(), Some(T0 + 1_500_000 + 200));
        clock.advance(199);
        engine.tick();
        assert!(!engine.is_running());
        clock.advance(1);
        let events = engine.tick();
        assert!(matches!(events[0], Event::TimerStarted { phase: Phase::ShortBreak, .. }));
        assert!(engine.is_running());
    }

    #[test]
    fn pause_cancels_pending_auto_start() {
        let (mut engine, clock) = manual_engine();
        engine.start();
        engine.on_tick(1_500_000);
        engine.pause();
        clock.advance(1_000);
        engine.tick();
        assert!(!engine.is_running());
        assert!(!engine.auto_start_pending());
    }

    #[test]
    fn dispose_cancels_everything() {
        let (mut engine, clock) = manual_engine();
        engine.start();
        engine.on_tick(1_500_000);
        assert!(engine.next_deadline().is_some());
        engine.dispose();
        assert_eq!(engine.next_deadline(), None);
        clock.advance(1_000);
        assert!(engine.tick().is_empty());
        assert!(engine.start().is_none());
        assert!(!engine.is_running());
    }

    #[test]
    fn reload_restores_phase_but_not_running() {
        let clock = ManualClock::new(T0);
        let store = MemoryStore::new();
        {
            let mut engine = engine_with(store.clone(), &clock);
            engine.switch_phase(Phase::LongBreak);
            engine.start();
            clock.advance(60_000);
            engine.tick();
        }
        assert_eq!(store.get(keys::RUNNING).unwrap(), Some(json!(true)));
        let engine = engine_with(store.clone(), &clock);
        assert_eq!(engine.phase(), Phase::LongBreak);
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_ms(), 900_000);
        assert_eq!(store.get(keys::RUNNING).unwrap(), Some(json!(false)));
    }

    #[test]
    fn format_rounds_to_nearest_second() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(59_499), "00:59");
        assert_eq!(format_mm_ss(59_500), "01:00");
        assert_eq!(format_mm_ss(90 * 60_000), "90:00");
    }

    #[test]
    fn snapshot_reflects_state() {
        let (mut engine, clock) = manual_engine();
        engine.start();
        clock.advance(750_000);
        engine.tick();
        let snap = engine.snapshot();
        assert_eq!(snap.phase, Phase::Work);
        assert!(snap.is_running);
        assert_eq!(snap.formatted_time, "12:30");
        assert!((snap.progress - 0.5).abs() < 1e-9);
        assert!(snap.sessions.is_empty());
    }
}
