//! Sensor driven by a pre-recorded script, for demos and tests.

use anima_core::{AnimaError, Observation, ObservationPayload, Sensor, SensorKind};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Step {
    Observe(ObservationPayload),
    Nothing,
    Fail(String),
}

/// Plays back queued steps, one per poll. An empty script sees nothing.
pub struct ScriptedSensor {
    kind: SensorKind,
    base_interval: Duration,
    script: Mutex<VecDeque<Step>>,
    polls: AtomicUsize,
}

impl ScriptedSensor {
    pub fn new(kind: SensorKind, base_interval: Duration) -> Self {
        Self {
            kind,
            base_interval,
            script: Mutex::new(VecDeque::new()),
            polls: AtomicUsize::new(0),
        }
    }

    fn push(&self, step: Step) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(step);
    }

    pub fn then_observe(&self, payload: ObservationPayload) -> &Self {
        self.push(Step::Observe(payload));
        self
    }

    pub fn then_nothing(&self) -> &Self {
        self.push(Step::Nothing);
        self
    }

    pub fn then_fail(&self, reason: impl Into<String>) -> &Self {
        self.push(Step::Fail(reason.into()));
        self
    }

    /// Number of polls so far.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sensor for ScriptedSensor {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn base_interval(&self) -> Duration {
        self.base_interval
    }

    async fn poll(&self) -> Result<Option<Observation>, AnimaError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match step {
            Some(Step::Observe(payload)) => Ok(Some(Observation::new(self.kind, payload))),
            Some(Step::Nothing) | None => Ok(None),
            Some(Step::Fail(reason)) => Err(AnimaError::sensor_unavailable(self.kind, reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plays_back_in_order() {
        let sensor = ScriptedSensor::new(SensorKind::Camera, Duration::from_secs(1));
        sensor
            .then_fail("no device")
            .then_nothing()
            .then_observe(ObservationPayload::UserLeft);

        assert!(sensor.poll().await.is_err());
        assert!(sensor.poll().await.unwrap().is_none());
        assert_eq!(
            sensor.poll().await.unwrap().unwrap().payload,
            ObservationPayload::UserLeft
        );
        assert!(sensor.poll().await.unwrap().is_none());
        assert_eq!(sensor.polls(), 4);
    }
}
