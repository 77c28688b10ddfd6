//! Interactive terminal session over a [`TimerService`].

use std::io::{IsTerminal, Write};

use clap::Args;
use focusloop_core::{
    Command, Config, Event, Phase, PhaseTarget, PhaseTimerEngine, RuntimeClock, SettingField,
    SilentNotifier, SqliteStore, TimerService, TimerSnapshot,
};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use super::timer::status_line;
use crate::desktop::{DesktopNotifier, SystemChime};

const HELP: &str = "keys: p toggle | r reset | n next phase | s status | q quit\n\
                    also: start, pause, skip <work|short|long>, set <setting> <value>, clear";

#[derive(Args)]
pub struct RunArgs {
    /// Start the countdown immediately
    #[arg(long)]
    start: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(session(config, args));
    // A pending stdin read would otherwise hold the runtime open.
    runtime.shutdown_background();
    result
}

async fn session(config: Config, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(&config)?;
    let handle = TimerService::spawn(engine, config.timer.tick_interval());
    let mut snapshots = handle.watch();
    let mut events = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut status = StatusLine::new(std::io::stdout().is_terminal());

    println!("{HELP}");
    if args.start {
        handle.send(Command::Start)?;
    }
    status.update(&handle.request_snapshot().await?);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Input::Command(command) => handle.send(command)?,
                    Input::Status => {
                        let snapshot = handle.request_snapshot().await?;
                        status.message(&status_line(&snapshot));
                    }
                    Input::Help => status.message(HELP),
                    Input::Quit => break,
                    Input::Invalid(message) => status.message(&message),
                    Input::Nothing => {}
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                status.update(&snapshot);
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(message) = describe(&event) {
                        status.message(&message);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event listener lagged");
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => break,
        }
    }

    status.finish();
    handle.shutdown().await;
    Ok(())
}

fn build_engine(config: &Config) -> Result<PhaseTimerEngine, Box<dyn std::error::Error>> {
    let store = SqliteStore::open_default()?;
    let builder = PhaseTimerEngine::builder(store)
        .chime(SystemChime)
        .clock(RuntimeClock::new())
        .tuning(config.timer.tuning());
    let builder = if config.notifications.enabled {
        builder.notifier(DesktopNotifier::new(&config.notifications))
    } else {
        builder.notifier(SilentNotifier)
    };
    Ok(builder.build())
}

#[derive(Debug, PartialEq)]
enum Input {
    Command(Command),
    Status,
    Help,
    Quit,
    Invalid(String),
    Nothing,
}

fn parse_input(line: &str) -> Input {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Input::Nothing;
    };

    match head.to_ascii_lowercase().as_str() {
        "p" | "toggle" => Input::Command(Command::Toggle),
        "start" => Input::Command(Command::Start),
        "pause" => Input::Command(Command::Pause),
        "r" | "reset" => Input::Command(Command::Reset),
        "n" | "next" => Input::Command(Command::SwitchPhase(PhaseTarget::Next)),
        "skip" => match words.next().unwrap_or("next").parse::<PhaseTarget>() {
            Ok(target) => Input::Command(Command::SwitchPhase(target)),
            Err(e) => Input::Invalid(e),
        },
        "set" => {
            let (Some(field), Some(value)) = (words.next(), words.next()) else {
                return Input::Invalid("usage: set <setting> <value>".to_string());
            };
            match field.parse::<SettingField>() {
                Ok(field) => {
                    Input::Command(Command::EditSetting(field, Value::String(value.to_string())))
                }
                Err(e) => Input::Invalid(e),
            }
        }
        "clear" => Input::Command(Command::ClearHistory),
        "s" | "status" => Input::Status,
        "h" | "help" | "?" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        other => Input::Invalid(format!("unknown input: {other} (h for help)")),
    }
}

fn describe(event: &Event) -> Option<String> {
    match event {
        Event::PhaseCompleted { phase, next, .. } => Some(format!(
            "{} complete. Up next: {}",
            phase.label(),
            next.label()
        )),
        Event::AutoStartScheduled { phase, .. } => {
            Some(format!("{} starts automatically", phase.label()))
        }
        Event::SettingsChanged { field, settings, .. } => {
            Some(format!("{field} = {}", settings.get(*field)))
        }
        Event::HistoryCleared { removed, .. } => Some(format!("cleared {removed} sessions")),
        _ => None,
    }
}

/// Redraws the countdown in place on a terminal; otherwise prints a line
/// whenever the phase or running state changes.
struct StatusLine {
    tty: bool,
    last: Option<(Phase, bool, String)>,
}

impl StatusLine {
    fn new(tty: bool) -> Self {
        Self { tty, last: None }
    }

    fn update(&mut self, snapshot: &TimerSnapshot) {
        let key = (
            snapshot.phase,
            snapshot.is_running,
            snapshot.formatted_time.clone(),
        );
        let state_changed = self
            .last
            .as_ref()
            .map_or(true, |(phase, running, _)| {
                (*phase, *running) != (snapshot.phase, snapshot.is_running)
            });
        if self.last.as_ref() == Some(&key) {
            return;
        }
        self.last = Some(key);

        let mut stdout = std::io::stdout();
        if self.tty {
            let _ = write!(stdout, "\r\x1b[2K{}", status_line(snapshot));
            let _ = stdout.flush();
        } else if state_changed {
            let _ = writeln!(stdout, "{}", status_line(snapshot));
        }
    }

    fn message(&mut self, text: &str) {
        if self.tty {
            print!("\r\x1b[2K");
            // Force the countdown to be redrawn below the message.
            self.last = None;
        }
        println!("{text}");
    }

    fn finish(&self) {
        if self.tty {
            println!();
        }
    }
}
