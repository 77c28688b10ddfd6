//! Property tests for countdown accounting and settings edits.

use focusloop_core::{ManualClock, MemoryStore, Phase, PhaseTimerEngine, SettingField};
use proptest::prelude::*;
use serde_json::json;

const T0: u64 = 1_760_000_000_000;

fn idle_engine(clock: &ManualClock) -> PhaseTimerEngine {
    PhaseTimerEngine::builder(MemoryStore::new())
        .clock(clock.clone())
        .build()
}

fn phase_strategy() -> impl Strategy<Value = Phase> {
    prop_oneof![Just(Phase::Work), Just(Phase::ShortBreak), Just(Phase::LongBreak)]
}

fn duration_field() -> impl Strategy<Value = SettingField> {
    prop_oneof![
        Just(SettingField::WorkMinutes),
        Just(SettingField::ShortBreakMinutes),
        Just(SettingField::LongBreakMinutes),
    ]
}

proptest! {
    #[test]
    fn running_countdown_never_increases(deltas in prop::collection::vec(0u64..400_000, 1..60)) {
        let clock = ManualClock::new(T0);
        let mut engine = idle_engine(&clock);
        engine.start();
        let mut last = engine.remaining_ms();
        for delta in deltas {
            clock.advance(delta);
            engine.tick();
            if engine.phase() != Phase::Work {
                // Completed: the countdown hit zero exactly once.
                prop_assert_eq!(engine.sessions().len(), 1);
                break;
            }
            prop_assert!(engine.remaining_ms() <= last);
            last = engine.remaining_ms();
        }
    }

    #[test]
    fn paused_edits_apply_to_remaining_time(
        phase in phase_strategy(),
        field in duration_field(),
        minutes in -10i64..200,
        elapsed in 0u64..60_000,
    ) {
        let clock = ManualClock::new(T0);
        let mut engine = idle_engine(&clock);
        engine.switch_phase(phase);
        engine.start();
        clock.advance(elapsed);
        engine.tick();
        engine.pause();

        engine.edit_setting(field, &json!(minutes));
        prop_assert_eq!(engine.remaining_ms(), engine.settings().phase_duration_ms(phase));
        prop_assert!(engine.remaining_ms() >= 60_000);
        prop_assert!(engine.remaining_ms() <= 90 * 60_000);
    }

    #[test]
    fn arbitrary_setting_input_stays_in_bounds(raw in ".*") {
        let clock = ManualClock::new(T0);
        let mut engine = idle_engine(&clock);
        engine.edit_setting(SettingField::IntervalsBeforeLongBreak, &json!(raw));
        engine.edit_setting(SettingField::WorkMinutes, &json!(raw));
        let settings = engine.settings();
        prop_assert!((1..=10).contains(&settings.intervals_before_long_break));
        prop_assert!((1..=90).contains(&settings.work_minutes));
    }
}
