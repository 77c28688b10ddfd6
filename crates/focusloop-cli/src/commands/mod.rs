pub mod config;
pub mod history;
pub mod run;
pub mod settings;
pub mod stats;
pub mod timer;

use focusloop_core::{Config, PhaseTimerEngine, SilentChime, SilentNotifier, SqliteStore};

/// Engine over the default database with no side effects on completion.
///
/// One-shot commands never run a countdown, so they skip the desktop
/// notifier and the chime.
pub(crate) fn open_engine(config: &Config) -> Result<PhaseTimerEngine, Box<dyn std::error::Error>> {
    let store = SqliteStore::open_default()?;
    Ok(PhaseTimerEngine::builder(store)
        .notifier(SilentNotifier)
        .chime(SilentChime)
        .tuning(config.timer.tuning())
        .build())
}
