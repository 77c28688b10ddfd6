use clap::Subcommand;
use focusloop_core::{Config, PhaseTarget, TimerSnapshot};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print the current phase and countdown
    Status {
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Switch phase: work, short, long or next
    Skip {
        #[arg(default_value = "next")]
        target: String,
    },
    /// Restore the current phase to its full duration
    Reset,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut engine = super::open_engine(&config)?;

    match action {
        TimerAction::Status { json } => {
            let snapshot = engine.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_status(&snapshot);
            }
        }
        TimerAction::Skip { target } => {
            let target: PhaseTarget = target.parse()?;
            engine.switch_phase(target);
            print_status(&engine.snapshot());
        }
        TimerAction::Reset => {
            engine.reset();
            print_status(&engine.snapshot());
        }
    }
    Ok(())
}

pub(crate) fn print_status(snapshot: &TimerSnapshot) {
    println!("{}", status_line(snapshot));
}

pub(crate) fn status_line(snapshot: &TimerSnapshot) -> String {
    let state = if snapshot.is_running { "running" } else { "paused" };
    format!(
        "{:<12} {}  [{state}]  intervals: {}",
        snapshot.phase_label, snapshot.formatted_time, snapshot.completed_work_intervals
    )
}
