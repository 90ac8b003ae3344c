use serde::{Deserialize, Serialize};

use crate::emotion::{EmotionChannel, EmotionSnapshot};
use crate::intent::IntentKind;
use crate::persona::Persona;
use crate::stage::MemoryStage;

/// Everything the dialogue generator gets to see for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageAndEmotionContext {
    pub persona: Persona,
    pub stage: MemoryStage,
    pub dominant: EmotionChannel,
    pub mood: EmotionSnapshot,
    /// Unlocked memory fragments, already rendered with any user detail.
    pub memories: Vec<String>,
    pub intent: IntentKind,
    /// What just happened, in one line.
    pub situation: String,
}

impl StageAndEmotionContext {
    pub fn new(
        persona: Persona,
        stage: MemoryStage,
        mood: EmotionSnapshot,
        memories: Vec<String>,
        intent: IntentKind,
        situation: impl Into<String>,
    ) -> Self {
        Self {
            persona,
            stage,
            dominant: mood.dominant(),
            mood,
            memories,
            intent,
            situation: situation.into(),
        }
    }
}
