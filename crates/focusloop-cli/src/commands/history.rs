use chrono::{Local, TimeZone};
use clap::Subcommand;
use focusloop_core::stats::round_minutes;
use focusloop_core::{Config, Session};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List completed focus sessions, newest first
    List {
        /// Maximum number of sessions to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every logged session
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut engine = super::open_engine(&config)?;

    match action {
        HistoryAction::List { limit, json } => {
            let sessions: Vec<&Session> = engine.sessions().iter().take(limit).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            } else if sessions.is_empty() {
                println!("No sessions yet.");
            } else {
                for session in sessions {
                    println!("{}", format_session(session));
                }
            }
        }
        HistoryAction::Clear => {
            let removed = engine.sessions().len();
            engine.clear_history();
            println!("cleared {removed} sessions");
        }
    }
    Ok(())
}

pub(crate) fn format_session(session: &Session) -> String {
    let when = i64::try_from(session.completed_at)
        .ok()
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let minutes = round_minutes(session.duration_ms);
    format!("{when}  {minutes:>3} min")
}
