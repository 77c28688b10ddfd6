mod clock;
mod deferred;
mod engine;
mod phase;

pub use clock::{Clock, ClockDriver, ManualClock, SystemClock};
pub use deferred::DeferredAction;
pub use engine::{format_mm_ss, EngineBuilder, EngineTuning, PhaseTimerEngine, TimerSnapshot};
pub use phase::{Phase, PhaseTarget};
