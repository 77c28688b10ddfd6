use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod desktop;

#[derive(Parser)]
#[command(name = "focusloop", version, about = "Focusloop interval timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timer interactively in this terminal
    Run(commands::run::RunArgs),
    /// Inspect or move the persisted timer state
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Durations and behaviour flags
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Completed focus sessions
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let debug_enabled = std::env::var("FOCUSLOOP_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = focusloop_core::Config::load_or_default().logging.level;
            EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"))
        })
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
