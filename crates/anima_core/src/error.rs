use std::time::Duration;
use thiserror::Error;

use crate::observation::SensorKind;
use crate::stage::MemoryStage;

/// Failure taxonomy shared by every engine component.
///
/// Sensor and generation failures are recovered inside the loop that hit them.
/// Channel and stage invariant violations mean shared state is corrupt and
/// stop the whole engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimaError {
    #[error("invalid emotion channel: {0}")]
    InvalidChannel(String),

    #[error("premature memory detail for fragment '{fragment_id}': {reason}")]
    PrematureDetail { fragment_id: String, reason: String },

    #[error("unknown memory fragment: {0}")]
    UnknownFragment(String),

    #[error("sensor {sensor} unavailable: {reason}")]
    SensorUnavailable { sensor: SensorKind, reason: String },

    #[error("dialogue generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    #[error("stage invariant violated: {from} -> {to}")]
    StageInvariantViolation { from: MemoryStage, to: MemoryStage },

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl AnimaError {
    /// Errors that indicate corrupted Ledger/Tracker state and must terminate the engine.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AnimaError::InvalidChannel(_) | AnimaError::StageInvariantViolation { .. }
        )
    }

    pub fn sensor_unavailable(sensor: SensorKind, reason: impl Into<String>) -> Self {
        AnimaError::SensorUnavailable {
            sensor,
            reason: reason.into(),
        }
    }
}
