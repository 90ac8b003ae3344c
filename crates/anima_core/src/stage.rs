use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal trust level. Only ever advances, one step at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryStage {
    #[default]
    Anxious = 0,
    Relaxed = 1,
    Trusting = 2,
    Dependent = 3,
}

impl MemoryStage {
    pub const ALL: [MemoryStage; 4] = [
        MemoryStage::Anxious,
        MemoryStage::Relaxed,
        MemoryStage::Trusting,
        MemoryStage::Dependent,
    ];

    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    pub fn next(&self) -> Option<MemoryStage> {
        match self {
            MemoryStage::Anxious => Some(MemoryStage::Relaxed),
            MemoryStage::Relaxed => Some(MemoryStage::Trusting),
            MemoryStage::Trusting => Some(MemoryStage::Dependent),
            MemoryStage::Dependent => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryStage::Anxious => "anxious",
            MemoryStage::Relaxed => "relaxed",
            MemoryStage::Trusting => "trusting",
            MemoryStage::Dependent => "dependent",
        }
    }
}

impl fmt::Display for MemoryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anxious" => Ok(MemoryStage::Anxious),
            "relaxed" => Ok(MemoryStage::Relaxed),
            "trusting" => Ok(MemoryStage::Trusting),
            "dependent" => Ok(MemoryStage::Dependent),
            other => Err(format!("unknown memory stage: {}", other)),
        }
    }
}
