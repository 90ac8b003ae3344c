//! Property-based tests for the emotion ledger.
//!
//! Intensities must stay inside [0, 1] no matter what triggers arrive, and
//! decay must never raise an intensity or push it below zero.

use anima_core::{EmotionChannel, MemoryStage};
use anima_limbic::{AffectEvent, ChannelProfile, EmotionLedger, TriggerSource};
use chrono::Utc;
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Strategies
// ============================================================================

fn arb_channel() -> impl Strategy<Value = EmotionChannel> {
    prop::sample::select(EmotionChannel::ALL.to_vec())
}

fn arb_delta() -> impl Strategy<Value = f32> {
    prop_oneof![
        -2.0f32..=2.0,
        Just(f32::INFINITY),
        Just(f32::NEG_INFINITY),
        Just(f32::NAN),
    ]
}

fn arb_event() -> impl Strategy<Value = AffectEvent> {
    prop::sample::select(vec![
        AffectEvent::MemoryRecovered,
        AffectEvent::UserCare,
        AffectEvent::EnvironmentDanger,
        AffectEvent::UserNeglect,
        AffectEvent::TaskCompletion,
        AffectEvent::UnexpectedEvent,
    ])
}

fn arb_ledger() -> impl Strategy<Value = EmotionLedger> {
    prop::collection::vec((0.0001f32..0.1, 0.0f32..=1.0), 8).prop_map(|params| {
        EmotionLedger::with_profiles(
            EmotionChannel::ALL
                .iter()
                .zip(params)
                .map(|(&c, (rate, initial))| (c, ChannelProfile::new(rate, initial))),
        )
    })
}

fn assert_bounded(ledger: &EmotionLedger) {
    for state in ledger.snapshot().states {
        assert!(
            (0.0..=1.0).contains(&state.intensity),
            "{} out of range: {}",
            state.channel,
            state.intensity
        );
        assert!(state.decay_rate > 0.0);
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn triggers_keep_intensity_in_unit_range(
        mut ledger in arb_ledger(),
        triggers in prop::collection::vec((arb_channel(), arb_delta()), 0..50),
    ) {
        let now = Utc::now();
        for (channel, delta) in triggers {
            let r = ledger.apply_trigger(channel, delta, TriggerSource::UserMessage, now).unwrap();
            prop_assert!((0.0..=1.0).contains(&r));
        }
        assert_bounded(&ledger);
    }

    #[test]
    fn decay_is_monotone_and_floored(
        mut ledger in arb_ledger(),
        steps in prop::collection::vec(0u64..10_000, 1..20),
    ) {
        for ms in steps {
            let before = ledger.snapshot().states;
            ledger.tick_decay(Duration::from_millis(ms));
            let after = ledger.snapshot().states;
            for (b, a) in before.iter().zip(after.iter()) {
                prop_assert!(a.intensity <= b.intensity);
                prop_assert!(a.intensity >= 0.0);
            }
        }
    }

    #[test]
    fn trigger_log_grows_by_one_per_trigger(
        mut ledger in arb_ledger(),
        triggers in prop::collection::vec((arb_channel(), arb_delta()), 0..30),
    ) {
        let now = Utc::now();
        let n = triggers.len();
        for (channel, delta) in triggers {
            ledger.apply_trigger(channel, delta, TriggerSource::UserMessage, now).unwrap();
        }
        prop_assert_eq!(ledger.trigger_log().len(), n);
    }

    #[test]
    fn events_and_stage_entries_stay_bounded(
        mut ledger in arb_ledger(),
        events in prop::collection::vec(arb_event(), 0..20),
    ) {
        let now = Utc::now();
        for event in events {
            ledger.apply_event(event, now).unwrap();
        }
        for stage in MemoryStage::ALL {
            ledger.apply_stage_entry(stage, now).unwrap();
        }
        assert_bounded(&ledger);
    }

    #[test]
    fn snapshot_round_trip_preserves_intensities(ledger in arb_ledger()) {
        let snap = ledger.snapshot();
        let restored = EmotionLedger::from_snapshot(&snap);
        for state in &snap.states {
            prop_assert_eq!(restored.intensity(state.channel), Some(state.intensity));
        }
    }
}
