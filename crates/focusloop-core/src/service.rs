//! Serialized host for a [`PhaseTimerEngine`].
//!
//! One tokio task owns the engine. User commands, the periodic tick and
//! deferred-action wakeups are all handled inside that task, one at a time,
//! so no two of them ever interleave inside an engine call.
//!
//! The periodic tick only exists while the engine is running; pausing,
//! completing or switching phase drops it, and it is recreated on start.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::error::CoreError;
use crate::events::Event;
use crate::settings::SettingField;
use crate::timer::{Clock, PhaseTarget, PhaseTimerEngine, TimerSnapshot};

const EVENT_BUFFER: usize = 64;

/// Monotonic clock anchored to the wall clock at creation.
///
/// Follows tokio's time source, so a paused test runtime moves it as well.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClock {
    origin: Instant,
    origin_epoch_ms: u64,
}

impl RuntimeClock {
    pub fn new() -> Self {
        let origin_epoch_ms = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        Self {
            origin: Instant::now(),
            origin_epoch_ms,
        }
    }
}

impl Default for RuntimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for RuntimeClock {
    fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.origin_epoch_ms.saturating_add(elapsed)
    }
}

/// User intents accepted by the service.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Pause,
    /// Start when idle, pause when running.
    Toggle,
    Reset,
    SwitchPhase(PhaseTarget),
    EditSetting(SettingField, Value),
    ClearHistory,
}

enum Envelope {
    Command(Command),
    Snapshot(oneshot::Sender<TimerSnapshot>),
    Shutdown,
}

/// Client side of a running [`TimerService`].
pub struct TimerHandle {
    commands: mpsc::UnboundedSender<Envelope>,
    snapshots: watch::Receiver<TimerSnapshot>,
    events: broadcast::Sender<Event>,
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// Queue a command behind everything already submitted.
    ///
    /// # Errors
    /// Returns [`CoreError::ServiceStopped`] if the service task has exited.
    pub fn send(&self, command: Command) -> Result<(), CoreError> {
        self.commands
            .send(Envelope::Command(command))
            .map_err(|_| CoreError::ServiceStopped)
    }

    /// Snapshot taken after every previously sent command was applied.
    ///
    /// # Errors
    /// Returns [`CoreError::ServiceStopped`] if the service task has exited.
    pub async fn request_snapshot(&self) -> Result<TimerSnapshot, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Envelope::Snapshot(tx))
            .map_err(|_| CoreError::ServiceStopped)?;
        rx.await.map_err(|_| CoreError::ServiceStopped)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Dispose the engine and wait for the task to finish.
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(Envelope::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Timer service task ended abnormally");
            }
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub struct TimerService {
    engine: PhaseTimerEngine,
    tick_interval: Duration,
    commands: mpsc::UnboundedReceiver<Envelope>,
    snapshots: watch::Sender<TimerSnapshot>,
    events: broadcast::Sender<Event>,
    ticker: Option<Interval>,
}

impl TimerService {
    /// Move `engine` onto a new task on the current tokio runtime.
    pub fn spawn(engine: PhaseTimerEngine, tick_interval: Duration) -> TimerHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

        let service = TimerService {
            engine,
            tick_interval,
            commands: command_rx,
            snapshots: snapshot_tx,
            events: event_tx.clone(),
            ticker: None,
        };
        let task = tokio::spawn(service.run());

        TimerHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_tx,
            task: Some(task),
        }
    }

    async fn run(mut self) {
        tracing::debug!(tick_ms = self.tick_interval.as_millis() as u64, "Timer service started");
        loop {
            self.sync_ticker();
            let deadline = self.deadline_instant();

            let events = tokio::select! {
                envelope = self.commands.recv() => match envelope {
                    Some(Envelope::Command(command)) => self.apply(command),
                    Some(Envelope::Snapshot(reply)) => {
                        let _ = reply.send(self.engine.snapshot());
                        continue;
                    }
                    Some(Envelope::Shutdown) | None => break,
                },
                _ = next_tick(&mut self.ticker) => self.engine.tick(),
                _ = wait_until(deadline) => self.engine.poll_deferred(),
            };
            self.publish(events);
        }

        self.ticker = None;
        self.engine.dispose();
        self.snapshots.send_replace(self.engine.snapshot());
        tracing::debug!("Timer service stopped");
    }

    fn apply(&mut self, command: Command) -> Vec<Event> {
        let event = match command {
            Command::Start => self.engine.start(),
            Command::Pause => return self.engine.pause(),
            Command::Toggle => {
                if self.engine.is_running() {
                    return self.engine.pause();
                }
                self.engine.start()
            }
            Command::Reset => self.engine.reset(),
            Command::SwitchPhase(target) => self.engine.switch_phase(target),
            Command::EditSetting(field, value) => self.engine.edit_setting(field, &value),
            Command::ClearHistory => self.engine.clear_history(),
        };
        event.into_iter().collect()
    }

    /// Hold a periodic tick exactly while the engine runs.
    fn sync_ticker(&mut self) {
        match (self.engine.is_running(), self.ticker.is_some()) {
            (true, false) => {
                let mut interval = tokio::time::interval(self.tick_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.ticker = Some(interval);
            }
            (false, true) => self.ticker = None,
            _ => {}
        }
    }

    fn deadline_instant(&self) -> Option<Instant> {
        let due = self.engine.next_deadline()?;
        let wait = due.saturating_sub(self.engine.now_ms());
        Some(Instant::now() + Duration::from_millis(wait))
    }

    fn publish(&mut self, events: Vec<Event>) {
        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
        self.snapshots.send_replace(self.engine.snapshot());
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
