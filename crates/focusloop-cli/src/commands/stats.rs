use chrono::Local;
use clap::Subcommand;
use focusloop_core::stats::round_minutes;
use focusloop_core::{day_summary, week_summary, Config};

const BAR_WIDTH: usize = 30;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Focus minutes per day for the current week (Mon-Sun)
    Week {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sessions completed today
    Today {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let engine = super::open_engine(&config)?;
    let sessions = engine.sessions().as_slice();
    let now = Local::now();

    match action {
        StatsAction::Week { json } => {
            let week = week_summary(sessions, &now);
            if json {
                println!("{}", serde_json::to_string_pretty(&week)?);
                return Ok(());
            }
            println!("Week of {}", week.week_start.format("%Y-%m-%d"));
            for (i, day) in week.days.iter().enumerate() {
                let marker = if i == week.today_index { '>' } else { ' ' };
                let filled = usize::from(day.bar_pct) * BAR_WIDTH / 100;
                println!(
                    "{marker} {} {:<width$} {:>4} min",
                    day.label,
                    "#".repeat(filled),
                    day.work_minutes(),
                    width = BAR_WIDTH
                );
            }
            println!("Total: {} min", round_minutes(week.total_work_ms()));
        }
        StatsAction::Today { json } => {
            let day = day_summary(sessions, now.date_naive(), &Local);
            if json {
                println!("{}", serde_json::to_string_pretty(&day)?);
                return Ok(());
            }
            println!(
                "Today: {} sessions, {} min",
                day.work_sessions, day.work_minutes
            );
            for session in &day.sessions {
                println!("  {}", super::history::format_session(session));
            }
        }
    }
    Ok(())
}
