use serde::{Deserialize, Serialize};
use std::fmt;

use crate::action::ActionChannel;
use crate::emotion::{EmotionChannel, EmotionSnapshot};
use crate::stage::MemoryStage;

/// Priority tier used for ordering within a cycle and for queue eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low = 0,
    Medium = 1,
    High = 2,
    Urgent = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Greet,
    LockScreenSuggestion,
    CheckSurroundings,
    ReportScan,
    InvestigateFile,
    PlayfulBanter,
    WatchTogether,
    FocusSupport,
    SleepReminder,
    MealReminder,
    RestReminder,
    BatteryWarning,
    SlowdownConcern,
    MemoryShare,
    MissUser,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Greet => "greet",
            IntentKind::LockScreenSuggestion => "lock_screen_suggestion",
            IntentKind::CheckSurroundings => "check_surroundings",
            IntentKind::ReportScan => "report_scan",
            IntentKind::InvestigateFile => "investigate_file",
            IntentKind::PlayfulBanter => "playful_banter",
            IntentKind::WatchTogether => "watch_together",
            IntentKind::FocusSupport => "focus_support",
            IntentKind::SleepReminder => "sleep_reminder",
            IntentKind::MealReminder => "meal_reminder",
            IntentKind::RestReminder => "rest_reminder",
            IntentKind::BatteryWarning => "battery_warning",
            IntentKind::SlowdownConcern => "slowdown_concern",
            IntentKind::MemoryShare => "memory_share",
            IntentKind::MissUser => "miss_user",
        }
    }

    /// Presentation channel an intent of this kind is delivered on.
    pub fn channel(&self) -> ActionChannel {
        match self {
            IntentKind::LockScreenSuggestion
            | IntentKind::BatteryWarning
            | IntentKind::SlowdownConcern => ActionChannel::Notification,
            IntentKind::CheckSurroundings | IntentKind::MissUser => ActionChannel::Expression,
            _ => ActionChannel::Speech,
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accept only if at least one of `any_of` is at or above `min_intensity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPrecondition {
    pub any_of: Vec<EmotionChannel>,
    pub min_intensity: f32,
}

impl EmotionPrecondition {
    pub fn any_of(channels: &[EmotionChannel], min_intensity: f32) -> Self {
        Self {
            any_of: channels.to_vec(),
            min_intensity,
        }
    }

    pub fn is_met(&self, mood: &EmotionSnapshot) -> bool {
        self.any_of
            .iter()
            .any(|&c| mood.intensity(c) >= self.min_intensity)
    }
}

/// Side effects applied when an intent is accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentEffects {
    /// Signed deltas applied through `apply_trigger`.
    pub emotions: Vec<(EmotionChannel, f32)>,
    /// Count the action as an interaction with the user.
    pub records_interaction: bool,
}

/// Candidate autonomous behavior. Discarded when suppressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorIntent {
    pub kind: IntentKind,
    pub priority: Priority,
    pub required_stage: MemoryStage,
    pub emotion_preconditions: Vec<EmotionPrecondition>,
    pub effects: IntentEffects,
    /// Situation summary handed to rendering.
    pub payload: String,
}

impl BehaviorIntent {
    pub fn new(kind: IntentKind, priority: Priority, payload: impl Into<String>) -> Self {
        Self {
            kind,
            priority,
            required_stage: MemoryStage::Anxious,
            emotion_preconditions: Vec::new(),
            effects: IntentEffects::default(),
            payload: payload.into(),
        }
    }

    pub fn requires_stage(mut self, stage: MemoryStage) -> Self {
        self.required_stage = stage;
        self
    }

    pub fn when(mut self, precondition: EmotionPrecondition) -> Self {
        self.emotion_preconditions.push(precondition);
        self
    }

    pub fn with_emotion(mut self, channel: EmotionChannel, delta: f32) -> Self {
        self.effects.emotions.push((channel, delta));
        self
    }

    pub fn counts_as_interaction(mut self) -> Self {
        self.effects.records_interaction = true;
        self
    }

    pub fn preconditions_met(&self, mood: &EmotionSnapshot) -> bool {
        self.emotion_preconditions.iter().all(|p| p.is_met(mood))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_precondition_any_of() {
        let mut mood = EmotionSnapshot::at_rest();
        let pre = EmotionPrecondition::any_of(&[EmotionChannel::Excited, EmotionChannel::Curious], 0.5);
        assert!(!pre.is_met(&mood));

        for s in mood.states.iter_mut() {
            if s.channel == EmotionChannel::Curious {
                s.intensity = 0.6;
            }
        }
        assert!(pre.is_met(&mood));
    }

    #[test]
    fn test_builder_collects_effects() {
        let intent = BehaviorIntent::new(IntentKind::Greet, Priority::High, "user arrived")
            .requires_stage(MemoryStage::Relaxed)
            .with_emotion(EmotionChannel::Happy, 0.2)
            .counts_as_interaction();
        assert_eq!(intent.required_stage, MemoryStage::Relaxed);
        assert_eq!(intent.effects.emotions, vec![(EmotionChannel::Happy, 0.2)]);
        assert!(intent.effects.records_interaction);
        assert!(intent.preconditions_met(&EmotionSnapshot::at_rest()));
    }

    #[test]
    fn test_channel_routing() {
        assert_eq!(IntentKind::BatteryWarning.channel(), ActionChannel::Notification);
        assert_eq!(IntentKind::Greet.channel(), ActionChannel::Speech);
    }
}
