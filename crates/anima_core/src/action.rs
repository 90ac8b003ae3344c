use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::intent::{IntentKind, Priority};

/// Presentation channel. At most one Action per channel is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionChannel {
    /// Spoken/chat utterance
    Speech,
    /// Desktop-style notification
    Notification,
    /// Avatar expression or gesture
    Expression,
    /// Stage and memory status feed
    Status,
}

impl fmt::Display for ActionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionChannel::Speech => "speech",
            ActionChannel::Notification => "notification",
            ActionChannel::Expression => "expression",
            ActionChannel::Status => "status",
        };
        f.write_str(s)
    }
}

/// Approved, rendered behavior. The only artifact that crosses into presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,
    pub channel: ActionChannel,
    pub priority: Priority,
    /// `None` for engine-originated status actions.
    pub intent: Option<IntentKind>,
    pub rendered_payload: String,
    /// Rendered from the template book instead of the dialogue generator.
    pub used_fallback: bool,
    pub emitted_at: DateTime<Utc>,
}

impl Action {
    pub fn new(
        channel: ActionChannel,
        priority: Priority,
        intent: Option<IntentKind>,
        rendered_payload: impl Into<String>,
        emitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel,
            priority,
            intent,
            rendered_payload: rendered_payload.into(),
            used_fallback: false,
            emitted_at,
        }
    }

    pub fn fallback(mut self, used: bool) -> Self {
        self.used_fallback = used;
        self
    }
}
