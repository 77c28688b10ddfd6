//! Time sources and the tick-delta driver.
//!
//! The periodic callback that drives the engine is best-effort: it may be
//! throttled, delayed or suspended for minutes. [`ClockDriver`] turns whatever
//! callbacks do arrive into elapsed-time deltas measured against the clock, so
//! the countdown stays correct regardless of callback jitter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Manually advanced clock for tests and simulations.
///
/// Clones share the same underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Converts clock readings at each callback into countdown deltas.
#[derive(Debug, Clone, Default)]
pub struct ClockDriver {
    last_tick_ms: Option<u64>,
    subscribed: bool,
}

impl ClockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to ticks, measuring the first delta from `now_ms`.
    pub fn arm(&mut self, now_ms: u64) {
        self.subscribed = true;
        self.last_tick_ms = Some(now_ms);
    }

    /// Drop the subscription. The next `arm` starts a fresh measurement.
    pub fn disarm(&mut self) {
        self.subscribed = false;
        self.last_tick_ms = None;
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn last_tick_ms(&self) -> Option<u64> {
        self.last_tick_ms
    }

    /// Elapsed time since the previous reading.
    ///
    /// Zero on the first reading and when the clock went backwards. A long gap
    /// is returned whole; it is never split into several ticks.
    pub fn delta(&mut self, now_ms: u64) -> u64 {
        let delta = match self.last_tick_ms {
            Some(last) => now_ms.saturating_sub(last),
            None => 0,
        };
        self.last_tick_ms = Some(now_ms);
        delta
    }
}
