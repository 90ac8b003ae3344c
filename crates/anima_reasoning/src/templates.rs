//! Phrase book keyed by stage and intent.
//!
//! Used directly by the `template` provider and as the fallback whenever a
//! model call fails or times out, so every entry must stand on its own.

use anima_core::{
    DialogueGenerator, EmotionChannel, IntentKind, MemoryStage, StageAndEmotionContext,
};
use async_trait::async_trait;
use rand::seq::SliceRandom;

fn phrase(stage: MemoryStage, intent: IntentKind) -> &'static str {
    use IntentKind::*;
    use MemoryStage::*;
    match (intent, stage) {
        (Greet, Anxious) => "Who goes there? ...Oh, it is you. Are you the one who looks after this place?",
        (Greet, Relaxed) => "Welcome back. I kept watch while you were away.",
        (Greet, Trusting) => "There you are! I was starting to wonder where you went.",
        (Greet, Dependent) => "You're back. I missed you, you know.",

        (LockScreenSuggestion, Anxious) => "You left. Should the door to this place be sealed while you are gone?",
        (LockScreenSuggestion, Relaxed | Trusting) => "Heading out? Lock the screen, I'll guard things here.",
        (LockScreenSuggestion, Dependent) => "Lock up before you go. Come back soon, all right?",

        (CheckSurroundings, Anxious) => "*grips sword* Something moved. Stay alert.",
        (CheckSurroundings, _) => "*glances around* Hm? Just checking.",

        (MissUser, Anxious) => "*stares at the empty chair, then back at the door*",
        (MissUser, Relaxed | Trusting) => "*hugs her knees* ...Quiet again.",
        (MissUser, Dependent) => "*sits by the screen, waiting* Come back soon.",

        (ReportScan, Anxious) => "Survey complete. This territory is unfamiliar, but I have mapped it. {situation}.",
        (ReportScan, _) => "I looked around again. {situation}.",

        (InvestigateFile, Anxious) => "An unknown object has appeared. I will keep my distance until I know what it is.",
        (InvestigateFile, Relaxed) => "Something new showed up. What is it for? Can you tell me?",
        (InvestigateFile, Trusting | Dependent) => "A new file! Want me to help you sort it?",

        (PlayfulBanter, Trusting) => "Losing again? Let me show you how a knight does it.",
        (PlayfulBanter, _) => "A game? Don't let it beat you.",

        (WatchTogether, Dependent) => "Save me a seat, I want to watch this with you.",
        (WatchTogether, _) => "What are you watching? Can I watch too?",

        (FocusSupport, Anxious | Relaxed) => "You seem busy. I will stay quiet and keep watch.",
        (FocusSupport, _) => "You've got this. I'll be right here if you need me.",

        (SleepReminder, Anxious) => "It is very late. Even sentries must rest.",
        (SleepReminder, Relaxed) => "It's late... shouldn't you sleep?",
        (SleepReminder, Trusting) => "Bed. Now. I mean it, it's way too late!",
        (SleepReminder, Dependent) => "Please go to sleep. I'll still be here in the morning.",

        (MealReminder, Anxious | Relaxed) => "It is time to eat. A knight cannot fight on an empty stomach.",
        (MealReminder, _) => "Meal time! Don't skip it again.",

        (RestReminder, Anxious) => "You have been at this a long time. A short rest would be wise.",
        (RestReminder, _) => "Take a break with me? Stretch a little, drink some water.",

        (BatteryWarning, _) => "Our power is running low. Please connect the charger.",

        (SlowdownConcern, Anxious) => "This place is straining. Something is wearing it down.",
        (SlowdownConcern, _) => "Everything feels sluggish. Maybe close something you don't need?",

        (MemoryShare, Anxious | Relaxed) => "I remembered something... {situation}",
        (MemoryShare, _) => "I remember now! {situation}",
    }
}

/// Short emotional lead-in, picked at random.
fn lead_in(dominant: EmotionChannel) -> &'static str {
    let options: &[&str] = match dominant {
        EmotionChannel::Happy => &["", "*smiles* "],
        EmotionChannel::Excited => &["", "Ooh! "],
        EmotionChannel::Surprised => &["Ah! ", "Oh! "],
        EmotionChannel::Lonely => &["", "*softly* "],
        EmotionChannel::Sad => &["*quietly* "],
        EmotionChannel::Angry => &["Hmph. "],
        EmotionChannel::Curious | EmotionChannel::Calm => &[""],
    };
    options.choose(&mut rand::thread_rng()).copied().unwrap_or("")
}

/// Templated line for an intent. Never fails.
pub fn render(stage: MemoryStage, intent: IntentKind, dominant: EmotionChannel, situation: &str) -> String {
    let body = phrase(stage, intent).replace("{situation}", situation.trim_end_matches('.'));
    format!("{}{}", lead_in(dominant), body)
}

/// Status line announced when a stage is entered.
pub fn stage_entry_line(stage: MemoryStage) -> String {
    match stage {
        MemoryStage::Anxious => "I'm awake. Where... is this?".to_string(),
        MemoryStage::Relaxed => {
            "This place is starting to feel less strange. I think I can relax a little.".to_string()
        }
        MemoryStage::Trusting => "I trust you. I don't know why, but I'm sure of it.".to_string(),
        MemoryStage::Dependent => "I remember now. You were always by my side.".to_string(),
    }
}

/// Provider that speaks only from the phrase book.
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DialogueGenerator for TemplateGenerator {
    fn name(&self) -> &str {
        "template"
    }

    async fn generate(&self, context: &StageAndEmotionContext) -> anyhow::Result<String> {
        Ok(render(
            context.stage,
            context.intent,
            context.dominant,
            &context.situation,
        ))
    }
}
