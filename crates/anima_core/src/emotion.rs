//! Discrete emotion channels.
//!
//! The companion's affect is a fixed set of named channels, each with its own
//! intensity in [0, 1] and its own linear decay rate. Mutation lives in the
//! limbic crate; this module only holds the data that crosses crate borders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnimaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionChannel {
    Happy,
    Curious,
    Lonely,
    Excited,
    Sad,
    Angry,
    Surprised,
    Calm,
}

impl EmotionChannel {
    pub const ALL: [EmotionChannel; 8] = [
        EmotionChannel::Happy,
        EmotionChannel::Curious,
        EmotionChannel::Lonely,
        EmotionChannel::Excited,
        EmotionChannel::Sad,
        EmotionChannel::Angry,
        EmotionChannel::Surprised,
        EmotionChannel::Calm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionChannel::Happy => "happy",
            EmotionChannel::Curious => "curious",
            EmotionChannel::Lonely => "lonely",
            EmotionChannel::Excited => "excited",
            EmotionChannel::Sad => "sad",
            EmotionChannel::Angry => "angry",
            EmotionChannel::Surprised => "surprised",
            EmotionChannel::Calm => "calm",
        }
    }

    /// Tie-break rank for `dominant_emotion`: anger > sad > lonely > surprised
    /// > excited > curious > happy > calm.
    pub fn salience(&self) -> u8 {
        match self {
            EmotionChannel::Angry => 7,
            EmotionChannel::Sad => 6,
            EmotionChannel::Lonely => 5,
            EmotionChannel::Surprised => 4,
            EmotionChannel::Excited => 3,
            EmotionChannel::Curious => 2,
            EmotionChannel::Happy => 1,
            EmotionChannel::Calm => 0,
        }
    }
}

impl fmt::Display for EmotionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionChannel {
    type Err = AnimaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(EmotionChannel::Happy),
            "curious" => Ok(EmotionChannel::Curious),
            "lonely" => Ok(EmotionChannel::Lonely),
            "excited" => Ok(EmotionChannel::Excited),
            "sad" => Ok(EmotionChannel::Sad),
            "angry" | "anger" => Ok(EmotionChannel::Angry),
            "surprised" => Ok(EmotionChannel::Surprised),
            "calm" => Ok(EmotionChannel::Calm),
            other => Err(AnimaError::InvalidChannel(other.to_string())),
        }
    }
}

/// Live state of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionState {
    pub channel: EmotionChannel,
    /// Always within [0, 1].
    pub intensity: f32,
    /// Intensity lost per second of elapsed time.
    pub decay_rate: f32,
    pub last_triggered_at: Option<DateTime<Utc>>,
}

/// Pick the strongest channel, breaking ties by salience.
///
/// Returns `Calm` when nothing is above zero.
pub fn dominant_of<'a>(states: impl IntoIterator<Item = &'a EmotionState>) -> EmotionChannel {
    let mut best: Option<&EmotionState> = None;
    for s in states {
        if s.intensity <= 0.0 {
            continue;
        }
        best = match best {
            None => Some(s),
            Some(b) if s.intensity > b.intensity => Some(s),
            Some(b) if s.intensity == b.intensity && s.channel.salience() > b.channel.salience() => {
                Some(s)
            }
            keep => keep,
        };
    }
    best.map(|s| s.channel).unwrap_or(EmotionChannel::Calm)
}

/// Read-only copy of the ledger handed to presentation layers, sensors and prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSnapshot {
    pub states: Vec<EmotionState>,
    pub taken_at: DateTime<Utc>,
}

impl EmotionSnapshot {
    /// Snapshot with every channel at rest. Used before a ledger exists.
    pub fn at_rest() -> Self {
        Self {
            states: EmotionChannel::ALL
                .iter()
                .map(|&channel| EmotionState {
                    channel,
                    intensity: 0.0,
                    decay_rate: 0.0,
                    last_triggered_at: None,
                })
                .collect(),
            taken_at: Utc::now(),
        }
    }

    pub fn intensity(&self, channel: EmotionChannel) -> f32 {
        self.states
            .iter()
            .find(|s| s.channel == channel)
            .map(|s| s.intensity)
            .unwrap_or(0.0)
    }

    pub fn dominant(&self) -> EmotionChannel {
        dominant_of(&self.states)
    }

    /// Short natural-language mood line for prompts and status output.
    pub fn describe(&self) -> String {
        let mut active: Vec<&EmotionState> =
            self.states.iter().filter(|s| s.intensity >= 0.2).collect();
        if active.is_empty() {
            return "emotionally quiet, nothing stands out".to_string();
        }
        active.sort_by(|a, b| {
            b.intensity
                .partial_cmp(&a.intensity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        active
            .iter()
            .take(3)
            .map(|s| format!("{} {}", intensity_word(s.intensity), s.channel))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn intensity_word(intensity: f32) -> &'static str {
    if intensity < 0.4 {
        "slightly"
    } else if intensity < 0.6 {
        "fairly"
    } else if intensity < 0.8 {
        "quite"
    } else {
        "very"
    }
}
