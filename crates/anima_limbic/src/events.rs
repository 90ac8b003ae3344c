//! Named affective events and stage-entry emotions.

use anima_core::{EmotionChannel, MemoryStage};
use serde::{Deserialize, Serialize};

/// Recurring situations with a fixed emotional signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectEvent {
    /// A memory fragment came back
    MemoryRecovered,
    /// The user offered reassurance or empathy
    UserCare,
    /// Something in the environment looks threatening
    EnvironmentDanger,
    /// The user has been away for a long time
    UserNeglect,
    /// A shared task was finished
    TaskCompletion,
    /// Something happened that was not expected
    UnexpectedEvent,
}

impl AffectEvent {
    pub fn deltas(&self) -> &'static [(EmotionChannel, f32)] {
        match self {
            AffectEvent::MemoryRecovered => &[(EmotionChannel::Happy, 0.3)],
            AffectEvent::UserCare => &[
                (EmotionChannel::Happy, 0.4),
                (EmotionChannel::Lonely, -0.2),
            ],
            AffectEvent::EnvironmentDanger => &[
                (EmotionChannel::Surprised, 0.3),
                (EmotionChannel::Lonely, 0.5),
            ],
            AffectEvent::UserNeglect => &[
                (EmotionChannel::Sad, 0.3),
                (EmotionChannel::Lonely, 0.2),
            ],
            AffectEvent::TaskCompletion => &[(EmotionChannel::Happy, 0.2)],
            AffectEvent::UnexpectedEvent => &[(EmotionChannel::Surprised, 0.4)],
        }
    }
}

/// Emotions raised (or lowered) on entering a stage.
pub fn stage_entry_deltas(stage: MemoryStage) -> &'static [(EmotionChannel, f32)] {
    match stage {
        MemoryStage::Anxious => &[],
        MemoryStage::Relaxed => &[
            (EmotionChannel::Curious, 0.3),
            (EmotionChannel::Happy, 0.2),
        ],
        MemoryStage::Trusting => &[
            (EmotionChannel::Happy, 0.3),
            (EmotionChannel::Calm, 0.2),
            (EmotionChannel::Lonely, -0.3),
        ],
        MemoryStage::Dependent => &[
            (EmotionChannel::Happy, 0.4),
            (EmotionChannel::Excited, 0.3),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relaxed_entry_raises_curious_or_happy() {
        let deltas = stage_entry_deltas(MemoryStage::Relaxed);
        assert!(deltas.iter().any(|(c, d)| {
            (*c == EmotionChannel::Curious || *c == EmotionChannel::Happy) && *d > 0.0
        }));
    }

    #[test]
    fn test_dependent_entry_raises_happy_and_excited() {
        let deltas = stage_entry_deltas(MemoryStage::Dependent);
        assert!(deltas.contains(&(EmotionChannel::Happy, 0.4)));
        assert!(deltas.contains(&(EmotionChannel::Excited, 0.3)));
    }

    #[test]
    fn test_care_soothes_loneliness() {
        assert!(AffectEvent::UserCare
            .deltas()
            .iter()
            .any(|(c, d)| *c == EmotionChannel::Lonely && *d < 0.0));
    }
}
