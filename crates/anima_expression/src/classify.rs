//! Fixed rules turning an observation into candidate intents.
//!
//! Dispatch is on the payload tag only. Stage, mood and presence gating
//! happen later in the scheduler; this module just proposes.

use anima_core::{
    AppCategory, BehaviorIntent, EmotionChannel, EmotionPrecondition, IntentKind, MemoryStage,
    Observation, ObservationPayload, Priority,
};

pub fn classify(observation: &Observation) -> Vec<BehaviorIntent> {
    use EmotionChannel::*;
    let situation = observation.payload.summary();
    let intent = |kind, priority| BehaviorIntent::new(kind, priority, situation.clone());

    match &observation.payload {
        ObservationPayload::UserArrived { .. } => vec![intent(IntentKind::Greet, Priority::Medium)
            .with_emotion(Happy, 0.2)
            .with_emotion(Lonely, -0.2)
            .counts_as_interaction()],

        ObservationPayload::UserLeft => vec![
            intent(IntentKind::MissUser, Priority::Low).with_emotion(Sad, 0.05),
            intent(IntentKind::LockScreenSuggestion, Priority::High).with_emotion(Lonely, 0.1),
        ],

        ObservationPayload::MotionDetected => vec![
            intent(IntentKind::CheckSurroundings, Priority::Low).with_emotion(Surprised, 0.2),
        ],

        ObservationPayload::ScanCompleted { unknown_files, .. } => {
            let mut report = intent(IntentKind::ReportScan, Priority::Medium).with_emotion(Curious, 0.2);
            if *unknown_files > 0 {
                report = report.with_emotion(Surprised, 0.1);
            }
            vec![report]
        }

        ObservationPayload::NewFile { known_type: false, .. } => vec![intent(
            IntentKind::InvestigateFile,
            Priority::Medium,
        )
        .with_emotion(Curious, 0.3)
        .with_emotion(Surprised, 0.2)],

        // Familiar files only interest a companion that is already curious.
        ObservationPayload::NewFile { known_type: true, .. } => vec![intent(
            IntentKind::InvestigateFile,
            Priority::Low,
        )
        .requires_stage(MemoryStage::Relaxed)
        .when(EmotionPrecondition::any_of(&[Curious], 0.3))
        .with_emotion(Curious, 0.1)],

        ObservationPayload::ActiveApp { category, .. } => match category {
            AppCategory::Game => vec![intent(IntentKind::PlayfulBanter, Priority::Low)
                .requires_stage(MemoryStage::Trusting)
                .when(EmotionPrecondition::any_of(&[Excited, Curious], 0.4))
                .with_emotion(Excited, 0.2)],
            AppCategory::Video => vec![intent(IntentKind::WatchTogether, Priority::Low)
                .requires_stage(MemoryStage::Relaxed)
                .when(EmotionPrecondition::any_of(&[Curious, Happy, Lonely], 0.3))
                .with_emotion(Happy, 0.1)],
            AppCategory::Work => vec![intent(IntentKind::FocusSupport, Priority::Low)
                .requires_stage(MemoryStage::Relaxed)
                .with_emotion(Calm, 0.1)],
            AppCategory::Browser | AppCategory::Other => Vec::new(),
        },

        ObservationPayload::LateNight { .. } => vec![intent(IntentKind::SleepReminder, Priority::High)],

        ObservationPayload::MealTime { .. } => vec![
            intent(IntentKind::MealReminder, Priority::Medium).requires_stage(MemoryStage::Trusting),
        ],

        ObservationPayload::LongSession { .. } => vec![intent(IntentKind::RestReminder, Priority::Medium)],

        ObservationPayload::BatteryLow { .. } => vec![
            intent(IntentKind::BatteryWarning, Priority::High).with_emotion(Surprised, 0.2),
        ],

        ObservationPayload::HighLoad { .. } => vec![
            intent(IntentKind::SlowdownConcern, Priority::Medium).with_emotion(Surprised, 0.1),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::SensorKind;
    use std::path::PathBuf;

    fn obs(kind: SensorKind, payload: ObservationPayload) -> Observation {
        Observation::new(kind, payload)
    }

    #[test]
    fn test_user_left_suggests_lock_and_sulks() {
        let intents = classify(&obs(SensorKind::Camera, ObservationPayload::UserLeft));
        let kinds: Vec<_> = intents.iter().map(|i| (i.kind, i.priority)).collect();
        assert_eq!(
            kinds,
            vec![
                (IntentKind::MissUser, Priority::Low),
                (IntentKind::LockScreenSuggestion, Priority::High),
            ]
        );
    }

    #[test]
    fn test_unknown_file_investigated_from_the_start() {
        let intents = classify(&obs(
            SensorKind::Filesystem,
            ObservationPayload::NewFile {
                path: PathBuf::from("/tmp/x.qqq"),
                known_type: false,
            },
        ));
        assert_eq!(intents[0].kind, IntentKind::InvestigateFile);
        assert_eq!(intents[0].required_stage, MemoryStage::Anxious);
        assert!(intents[0].payload.contains("x.qqq"));
    }

    #[test]
    fn test_game_needs_trust_and_excitement() {
        let intents = classify(&obs(
            SensorKind::Screen,
            ObservationPayload::ActiveApp {
                label: "Steam".into(),
                category: AppCategory::Game,
            },
        ));
        let banter = &intents[0];
        assert_eq!(banter.kind, IntentKind::PlayfulBanter);
        assert_eq!(banter.required_stage, MemoryStage::Trusting);
        assert_eq!(banter.emotion_preconditions.len(), 1);
    }

    #[test]
    fn test_browser_is_ignored() {
        let intents = classify(&obs(
            SensorKind::Screen,
            ObservationPayload::ActiveApp {
                label: "Firefox".into(),
                category: AppCategory::Browser,
            },
        ));
        assert!(intents.is_empty());
    }

    #[test]
    fn test_greet_counts_as_interaction() {
        let intents = classify(&obs(
            SensorKind::Camera,
            ObservationPayload::UserArrived { label: None },
        ));
        assert!(intents[0].effects.records_interaction);
    }
}
