pub mod action;
pub mod clock;
pub mod config;
pub mod context;
pub mod emotion;
pub mod error;
pub mod intent;
pub mod observation;
pub mod persona;
pub mod stage;

pub use action::{Action, ActionChannel};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AnimaConfig;
pub use context::StageAndEmotionContext;
pub use emotion::{EmotionChannel, EmotionSnapshot, EmotionState};
pub use error::AnimaError;
pub use intent::{BehaviorIntent, EmotionPrecondition, IntentEffects, IntentKind, Priority};
pub use observation::{AppCategory, Observation, ObservationPayload, SensorKind};
pub use persona::{Persona, StageProfile};
pub use stage::MemoryStage;

use async_trait::async_trait;
use std::time::Duration;

/// Capability contract for an environmental sensor.
///
/// Adapters are owned outside the engine and shared by handle. `poll` must
/// return within a bounded time; "nothing seen" is `Ok(None)`, and
/// `SensorUnavailable` is reserved for hard failures (device missing,
/// permission denied).
#[async_trait]
pub trait Sensor: Send + Sync {
    fn kind(&self) -> SensorKind;

    /// Interval when mood has no influence.
    fn base_interval(&self) -> Duration;

    /// Interval before the next poll, recomputed every cycle from current mood.
    fn interval(&self, _mood: &EmotionSnapshot) -> Duration {
        self.base_interval()
    }

    async fn poll(&self) -> Result<Option<Observation>, AnimaError>;
}

/// Prompt-in / text-out contract for the language model collaborator.
#[async_trait]
pub trait DialogueGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, context: &StageAndEmotionContext) -> anyhow::Result<String>;
}
