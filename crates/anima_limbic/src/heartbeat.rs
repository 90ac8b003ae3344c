//! Heartbeat configuration for the decay loop
//!
//! The heartbeat determines how often intensities decay and stage gates are
//! re-evaluated, independently of how often any sensor fires.

use anima_core::config::EngineConfig;
use std::time::Duration;

/// Configuration for the decay heartbeat
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// How often to tick decay and stage evaluation (default: 2s)
    pub interval: Duration,
    /// Absence after which loneliness starts building (default: 30min)
    pub neglect_after: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            neglect_after: Duration::from_secs(30 * 60),
        }
    }
}

impl HeartbeatConfig {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn from_engine(engine: &EngineConfig) -> Self {
        Self {
            interval: engine.decay_tick(),
            neglect_after: engine.neglect_after(),
        }
    }

    /// Fast heartbeat for interactive demos
    pub fn fast() -> Self {
        Self::with_interval(Duration::from_millis(500))
    }

    /// Very fast heartbeat for testing
    pub fn testing() -> Self {
        Self {
            interval: Duration::from_millis(10),
            neglect_after: Duration::from_secs(60),
        }
    }
}
