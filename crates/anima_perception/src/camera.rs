use crate::probe::{bounded, PresenceProbe};
use anima_core::{
    AnimaError, EmotionChannel, EmotionSnapshot, Observation, ObservationPayload, Sensor,
    SensorKind,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shortest camera interval, however lonely the companion gets.
const MIN_INTERVAL: Duration = Duration::from_secs(2);

/// Reports the user arriving, leaving, or unexplained motion.
///
/// Only edges are reported: a user sitting in frame for an hour produces one
/// `UserArrived`, not one per poll.
pub struct CameraSensor {
    probe: Arc<dyn PresenceProbe>,
    base_interval: Duration,
    probe_timeout: Duration,
    present: Mutex<Option<bool>>,
}

impl CameraSensor {
    pub fn new(probe: Arc<dyn PresenceProbe>, base_interval: Duration, probe_timeout: Duration) -> Self {
        Self {
            probe,
            base_interval,
            probe_timeout,
            present: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Sensor for CameraSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Camera
    }

    fn base_interval(&self) -> Duration {
        self.base_interval
    }

    /// Lonelier means more frequent checks, down to 40% of the base interval.
    fn interval(&self, mood: &EmotionSnapshot) -> Duration {
        let lonely = mood.intensity(EmotionChannel::Lonely).clamp(0.0, 1.0);
        self.base_interval
            .mul_f32(1.0 - 0.6 * lonely)
            .max(MIN_INTERVAL.min(self.base_interval))
    }

    async fn poll(&self) -> Result<Option<Observation>, AnimaError> {
        let reading = bounded(SensorKind::Camera, self.probe_timeout, self.probe.read()).await?;

        let mut present = self.present.lock().unwrap_or_else(|e| e.into_inner());
        let was_present = *present;
        *present = Some(reading.face);

        let payload = match (was_present, reading.face) {
            (Some(true), true) => None,
            (_, true) => Some(ObservationPayload::UserArrived {
                label: reading.label,
            }),
            (Some(true), false) => Some(ObservationPayload::UserLeft),
            (_, false) if reading.motion => Some(ObservationPayload::MotionDetected),
            _ => None,
        };
        Ok(payload.map(|p| Observation::new(SensorKind::Camera, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::PresenceReading;
    use std::collections::VecDeque;

    struct Scripted(Mutex<VecDeque<PresenceReading>>);

    #[async_trait]
    impl PresenceProbe for Scripted {
        async fn read(&self) -> anyhow::Result<PresenceReading> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("camera unplugged"))
        }
    }

    fn reading(face: bool, motion: bool) -> PresenceReading {
        PresenceReading {
            face,
            motion,
            label: None,
        }
    }

    #[tokio::test]
    async fn test_reports_edges_only() {
        let probe = Scripted(Mutex::new(
            vec![
                reading(false, false),
                reading(true, false),
                reading(true, false),
                reading(false, false),
                reading(false, true),
            ]
            .into(),
        ));
        let cam = CameraSensor::new(Arc::new(probe), Duration::from_secs(10), Duration::from_secs(1));

        assert!(cam.poll().await.unwrap().is_none());
        assert!(matches!(
            cam.poll().await.unwrap().unwrap().payload,
            ObservationPayload::UserArrived { .. }
        ));
        assert!(cam.poll().await.unwrap().is_none());
        assert_eq!(
            cam.poll().await.unwrap().unwrap().payload,
            ObservationPayload::UserLeft
        );
        assert_eq!(
            cam.poll().await.unwrap().unwrap().payload,
            ObservationPayload::MotionDetected
        );
        assert!(matches!(
            cam.poll().await,
            Err(AnimaError::SensorUnavailable { .. })
        ));
    }

    #[test]
    fn test_interval_shrinks_with_loneliness() {
        let probe = Scripted(Mutex::new(VecDeque::new()));
        let cam = CameraSensor::new(Arc::new(probe), Duration::from_secs(10), Duration::from_secs(1));
        let mut mood = EmotionSnapshot::at_rest();
        let calm = cam.interval(&mood);
        mood.states[2].intensity = 0.9; // lonely
        let lonely = cam.interval(&mood);
        assert_eq!(calm, Duration::from_secs(10));
        assert!(lonely < calm);
        assert!(lonely >= Duration::from_secs(2));
    }
}
