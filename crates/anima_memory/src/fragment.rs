use anima_core::MemoryStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder in `content_template` replaced by the user's detail.
const DETAIL_SLOT: &str = "{detail}";

/// A discrete piece of backstory, revealed once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFragment {
    pub id: String,
    pub stage_required: MemoryStage,
    pub content_template: String,
    /// Only an explicit user detail can unlock this fragment.
    #[serde(default)]
    pub requires_user_detail: bool,
    /// Happiness the memory brings back when shared, in [0, 1].
    #[serde(default)]
    pub emotional_impact: f32,
    /// Words in user messages that bring this memory to mind.
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    is_unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_detail: Option<String>,
}

impl MemoryFragment {
    pub fn new(id: impl Into<String>, stage_required: MemoryStage, content_template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stage_required,
            content_template: content_template.into(),
            requires_user_detail: false,
            emotional_impact: 0.3,
            keywords: Vec::new(),
            is_unlocked: false,
            unlocked_at: None,
            user_detail: None,
        }
    }

    pub fn needs_detail(mut self) -> Self {
        self.requires_user_detail = true;
        self
    }

    pub fn impact(mut self, impact: f32) -> Self {
        self.emotional_impact = impact.clamp(0.0, 1.0);
        self
    }

    pub fn keywords(mut self, words: &[&str]) -> Self {
        self.keywords = words.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn is_unlocked(&self) -> bool {
        self.is_unlocked
    }

    /// Flip to unlocked. Returns false if it already was.
    pub(crate) fn unlock(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_unlocked {
            return false;
        }
        self.is_unlocked = true;
        self.unlocked_at = Some(at);
        true
    }

    /// Catalog entries always start locked, whatever the file says.
    pub(crate) fn reset(&mut self) {
        self.is_unlocked = false;
        self.unlocked_at = None;
        self.user_detail = None;
    }

    /// Content with the user's detail filled in.
    pub fn render(&self) -> String {
        match (&self.user_detail, self.content_template.contains(DETAIL_SLOT)) {
            (Some(detail), true) => self.content_template.replace(DETAIL_SLOT, detail),
            (None, true) => self
                .content_template
                .replace(DETAIL_SLOT, "")
                .trim_end()
                .to_string(),
            (Some(detail), false) => format!("{} ({})", self.content_template, detail),
            (None, false) => self.content_template.clone(),
        }
    }

    /// Case-insensitive keyword hit in `text`.
    pub fn mentioned_in(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
    }
}
