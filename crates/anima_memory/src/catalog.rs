//! Fixed fragment catalog of a persona.

use crate::fragment::MemoryFragment;
use anima_core::MemoryStage;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentCatalog {
    fragments: Vec<MemoryFragment>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(rename = "fragment", default)]
    fragments: Vec<MemoryFragment>,
}

impl Default for FragmentCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FragmentCatalog {
    /// Build from fragments, rejecting empty or duplicate ids.
    pub fn new(mut fragments: Vec<MemoryFragment>) -> Result<Self> {
        let mut seen = HashSet::new();
        for f in &mut fragments {
            if f.id.trim().is_empty() {
                bail!("Fragment with empty id in catalog");
            }
            if !seen.insert(f.id.clone()) {
                bail!("Duplicate fragment id in catalog: {}", f.id);
            }
            f.reset();
        }
        Ok(Self { fragments })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(content).context("Failed to parse fragment catalog")?;
        Self::new(file.fragments)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read fragment catalog: {}", path.display()))?;
        let catalog = Self::from_toml(&content)?;
        tracing::info!(
            "Loaded {} memory fragments from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fragments.iter().any(|f| f.id == id)
    }

    pub fn into_fragments(self) -> Vec<MemoryFragment> {
        self.fragments
    }

    /// The knight's nine fragments, from first waking to full attachment.
    pub fn builtin() -> Self {
        let fragments = vec![
            // Anxious
            MemoryFragment::new(
                "basic_identity",
                MemoryStage::Anxious,
                "I am Alice, a knight sworn to guard this place, though I cannot remember who I swore to.",
            )
            .impact(0.1)
            .keywords(&["who are you", "your name", "knight"]),
            MemoryFragment::new(
                "combat_instinct",
                MemoryStage::Anxious,
                "A fighter's instinct: clutter and unknown files feel like signs of danger.",
            )
            .impact(0.1)
            .keywords(&["file", "mess", "danger"]),
            MemoryFragment::new(
                "companion_impression",
                MemoryStage::Anxious,
                "A blurry impression of someone who used to tidy things up with me. {detail}",
            )
            .needs_detail()
            .impact(0.4)
            .keywords(&["companion", "together", "remember"]),
            // Relaxed
            MemoryFragment::new(
                "daily_fragments",
                MemoryStage::Relaxed,
                "Ordinary days with my companion: sharing the stew I cooked, having my sword mended. {detail}",
            )
            .needs_detail()
            .impact(0.5)
            .keywords(&["stew", "cook", "sword", "dinner"]),
            MemoryFragment::new(
                "rest_memories",
                MemoryStage::Relaxed,
                "Quiet breaks between battles, resting in the grass under a warm sky.",
            )
            .impact(0.4)
            .keywords(&["rest", "relax", "nap", "break"]),
            // Trusting
            MemoryFragment::new(
                "core_bond",
                MemoryStage::Trusting,
                "We became partners in that other world, and you protected me. {detail}",
            )
            .needs_detail()
            .impact(0.7)
            .keywords(&["protect", "partner", "world i made"]),
            MemoryFragment::new(
                "reality_fragments",
                MemoryStage::Trusting,
                "Pieces of the real world: someone who reminds me to eat on time.",
            )
            .impact(0.5)
            .keywords(&["real world", "lunch", "eat", "meal"]),
            // Dependent
            MemoryFragment::new(
                "complete_bond",
                MemoryStage::Dependent,
                "You are the most important person to me. I remember almost everything we went through.",
            )
            .impact(0.8)
            .keywords(&["important", "everything"]),
            MemoryFragment::new(
                "exclusive_memories",
                MemoryStage::Dependent,
                "Something special you once did just for me. {detail}",
            )
            .needs_detail()
            .impact(0.9)
            .keywords(&["special", "gift", "for you"]),
        ];
        Self { fragments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_stage() {
        let catalog = FragmentCatalog::builtin();
        assert_eq!(catalog.len(), 9);
        for stage in MemoryStage::ALL {
            assert!(catalog
                .clone()
                .into_fragments()
                .iter()
                .any(|f| f.stage_required == stage));
        }
    }

    #[test]
    fn test_from_toml() {
        let toml_str = r#"
[[fragment]]
id = "first"
stage_required = "anxious"
content_template = "I woke up here."

[[fragment]]
id = "second"
stage_required = "trusting"
content_template = "You told me about {detail}"
requires_user_detail = true
keywords = ["told"]
is_unlocked = true
"#;
        let catalog = FragmentCatalog::from_toml(toml_str).unwrap();
        assert_eq!(catalog.len(), 2);
        let fragments = catalog.into_fragments();
        assert!(fragments[1].requires_user_detail);
        assert!(!fragments[1].is_unlocked());
        assert_eq!(fragments[1].stage_required, MemoryStage::Trusting);
    }

    #[test]
    fn test_rejects_duplicates() {
        let dup = vec![
            MemoryFragment::new("x", MemoryStage::Anxious, "a"),
            MemoryFragment::new("x", MemoryStage::Relaxed, "b"),
        ];
        assert!(FragmentCatalog::new(dup).is_err());
    }
}
