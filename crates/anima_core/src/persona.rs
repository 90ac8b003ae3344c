use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::stage::MemoryStage;

/// How the companion carries herself at one trust stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageProfile {
    pub traits: Vec<String>,
    pub speech_style: String,
    pub behavior_patterns: Vec<String>,
}

/// Per-stage profiles. A missing stage borrows the nearest lower one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageProfiles {
    #[serde(default)]
    pub anxious: Option<StageProfile>,
    #[serde(default)]
    pub relaxed: Option<StageProfile>,
    #[serde(default)]
    pub trusting: Option<StageProfile>,
    #[serde(default)]
    pub dependent: Option<StageProfile>,
}

impl StageProfiles {
    pub fn exact(&self, stage: MemoryStage) -> Option<&StageProfile> {
        match stage {
            MemoryStage::Anxious => self.anxious.as_ref(),
            MemoryStage::Relaxed => self.relaxed.as_ref(),
            MemoryStage::Trusting => self.trusting.as_ref(),
            MemoryStage::Dependent => self.dependent.as_ref(),
        }
    }
}

/// Persona: a fixed identity plus one profile per memory stage.
///
/// The identity never changes; the active profile follows the tracker's
/// stage, so the same prompt pipeline produces a guarded stranger early on
/// and a close companion later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub identity: String,
    #[serde(default = "default_profiles")]
    pub profiles: StageProfiles,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Alice".to_string(),
            identity: "\
You are Alice, a knight who woke up inside an unfamiliar digital space after an accident \
compressed most of your memories into fragments. You treat the user's computer as new \
territory and slowly remember the companion you once fought beside."
                .to_string(),
            profiles: default_profiles(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_profiles() -> StageProfiles {
    StageProfiles {
        anxious: Some(StageProfile {
            traits: strings(&["cautious", "rational", "tentative"]),
            speech_style: "brief, asks confirming questions, avoids touching anything unknown".into(),
            behavior_patterns: strings(&[
                "keeps sentences short and ends with a question",
                "treats unfamiliar files as possible threats",
                "stays slightly tense",
            ]),
        }),
        relaxed: Some(StageProfile {
            traits: strings(&["curious", "gentle", "budding reliance"]),
            speech_style: "asks about how things work, speaks with a light smile".into(),
            behavior_patterns: strings(&[
                "asks what programs are for",
                "moves closer to the user on her own",
                "gets a little sad during long silences",
            ]),
        }),
        trusting: Some(StageProfile {
            traits: strings(&["lively", "proactive", "responsible"]),
            speech_style: "plans things together, caretaking, teases back playfully".into(),
            behavior_patterns: strings(&[
                "plans activities for the two of you",
                "reminds the user to eat and tidy up",
                "protests when the user stays up late",
            ]),
        }),
        dependent: Some(StageProfile {
            traits: strings(&["caring", "proactive", "devoted"]),
            speech_style: "complete trust, warm and openly affectionate".into(),
            behavior_patterns: strings(&[
                "looks after the user's daily life",
                "makes long-term plans together",
                "gets anxious about separation",
            ]),
        }),
    }
}

impl Persona {
    /// Load a persona from a TOML file.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read persona file: {}", path.display()))?;
        let persona: Persona =
            toml::from_str(&content).with_context(|| "Failed to parse persona TOML")?;
        Ok(persona)
    }

    /// Profile for a stage, falling back to the nearest lower stage that has one.
    pub fn profile(&self, stage: MemoryStage) -> Option<&StageProfile> {
        MemoryStage::ALL
            .iter()
            .rev()
            .filter(|s| **s <= stage)
            .find_map(|s| self.profiles.exact(*s))
    }

    /// System-prompt block for the given stage.
    pub fn format_context(&self, stage: MemoryStage) -> String {
        let mut out = format!("== Identity ==\n{}\n\n== Current stage: {} ==", self.identity, stage);
        if let Some(profile) = self.profile(stage) {
            out.push_str(&format!(
                "\nTraits: {}\nSpeech style: {}\nBehavior:\n",
                profile.traits.join(", "),
                profile.speech_style
            ));
            for pattern in &profile.behavior_patterns {
                out.push_str(&format!("- {}\n", pattern));
            }
        }
        out
    }
}
