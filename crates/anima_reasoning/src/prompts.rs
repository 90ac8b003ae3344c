use anima_core::{IntentKind, StageAndEmotionContext};

/// What the model is asked to do for each intent.
fn instruction(intent: IntentKind) -> &'static str {
    match intent {
        IntentKind::Greet => "Greet the user who just showed up.",
        IntentKind::LockScreenSuggestion => {
            "The user walked away. Suggest locking the screen while they are gone."
        }
        IntentKind::CheckSurroundings => "Something moved nearby. React as you look around.",
        IntentKind::ReportScan => "You just finished surveying this space. Report what you found.",
        IntentKind::InvestigateFile => "A new file appeared. Say how you feel about it and what you will do.",
        IntentKind::PlayfulBanter => "The user is playing a game. Tease them playfully.",
        IntentKind::WatchTogether => "The user is watching a video. Ask to watch along.",
        IntentKind::FocusSupport => "The user is working. Offer quiet support without distracting them.",
        IntentKind::SleepReminder => "It is very late. Urge the user to go to sleep.",
        IntentKind::MealReminder => "It is meal time. Remind the user to eat.",
        IntentKind::RestReminder => "The user has been at it for a long time. Suggest a short break.",
        IntentKind::BatteryWarning => "The battery is running low. Warn the user.",
        IntentKind::SlowdownConcern => "The machine is struggling. Voice your concern.",
        IntentKind::MemoryShare => "A memory came back to you. Share it with the user.",
        IntentKind::MissUser => "The user just left. Show, briefly, that you miss them.",
    }
}

/// Render the full prompt for one utterance.
///
/// Persona and stage profile first, then mood and memories, then the task.
pub fn build_prompt(ctx: &StageAndEmotionContext) -> String {
    let mut intensities: Vec<String> = ctx
        .mood
        .states
        .iter()
        .filter(|s| s.intensity > 0.05)
        .map(|s| format!("{} {:.2}", s.channel, s.intensity))
        .collect();
    if intensities.is_empty() {
        intensities.push("all quiet".to_string());
    }

    let memories = if ctx.memories.is_empty() {
        "(nothing yet)".to_string()
    } else {
        ctx.memories
            .iter()
            .map(|m| format!("- {}", m))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "{}\n\n== Mood ==\nDominant emotion: {}\nYou feel {}.\nIntensities: {}\n\n== Memories you have recovered ==\n{}\n\n== Situation ==\n{}\n\n== Task ==\n{}\nReply in character as {} with one or two short sentences. Output only the spoken words.",
        ctx.persona.format_context(ctx.stage),
        ctx.dominant,
        ctx.mood.describe(),
        intensities.join(", "),
        memories,
        ctx.situation,
        instruction(ctx.intent),
        ctx.persona.name,
    )
}

/// Trim model output down to the spoken line. `None` if nothing usable is left.
pub fn clean_reply(raw: &str) -> Option<String> {
    let text = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '“' || c == '”')
        .trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::{EmotionSnapshot, MemoryStage, Persona};

    #[test]
    fn test_prompt_has_every_section() {
        let mut mood = EmotionSnapshot::at_rest();
        mood.states[1].intensity = 0.7; // curious
        let ctx = StageAndEmotionContext::new(
            Persona::default(),
            MemoryStage::Relaxed,
            mood,
            vec!["We cooked stew together.".to_string()],
            IntentKind::InvestigateFile,
            "a new file appeared: notes.xyz",
        );
        let prompt = build_prompt(&ctx);
        assert!(prompt.contains("Current stage: relaxed"));
        assert!(prompt.contains("Dominant emotion: curious"));
        assert!(prompt.contains("curious 0.70"));
        assert!(prompt.contains("- We cooked stew together."));
        assert!(prompt.contains("notes.xyz"));
        assert!(prompt.contains("new file appeared"));
    }

    #[test]
    fn test_clean_reply() {
        assert_eq!(clean_reply("  \"Hello there.\" \n"), Some("Hello there.".to_string()));
        assert_eq!(clean_reply("   "), None);
    }
}
