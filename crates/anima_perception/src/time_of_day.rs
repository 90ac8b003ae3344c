use anima_core::{AnimaError, Clock, Observation, ObservationPayload, Sensor, SensorKind};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Timelike, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Continuous use before the first rest reminder, and between reminders.
const LONG_SESSION_MINUTES: i64 = 120;

const MEALS: &[(u32, &str)] = &[(7, "breakfast"), (12, "lunch"), (18, "dinner")];

fn is_late(hour: u32) -> bool {
    hour >= 23 || hour < 5
}

#[derive(Debug, Default)]
struct Fired {
    late_night: Option<NaiveDate>,
    meals: Vec<(NaiveDate, &'static str)>,
    last_rest: Option<DateTime<Utc>>,
}

/// Time-of-day cues: staying up late, meal times, long sessions.
///
/// Each cue fires once per occurrence: late night once per night, each meal
/// once per day, the rest reminder every two hours of continuous use.
pub struct ClockSensor {
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    base_interval: Duration,
    session_start: DateTime<Utc>,
    fired: Mutex<Fired>,
}

impl ClockSensor {
    pub fn new(clock: Arc<dyn Clock>, offset: FixedOffset, base_interval: Duration) -> Self {
        let session_start = clock.now();
        Self {
            clock,
            offset,
            base_interval,
            session_start,
            fired: Mutex::new(Fired::default()),
        }
    }

    /// Sensor in the machine's local time zone.
    pub fn local(clock: Arc<dyn Clock>, base_interval: Duration) -> Self {
        let offset = *Local::now().offset();
        Self::new(clock, offset, base_interval)
    }

    fn observe(&self, now: DateTime<Utc>) -> Option<ObservationPayload> {
        let local = now.with_timezone(&self.offset);
        let hour = local.hour();
        // A night belongs to the date it started on.
        let night_of = if hour < 5 {
            local.date_naive().pred_opt().unwrap_or(local.date_naive())
        } else {
            local.date_naive()
        };
        let today = local.date_naive();
        let mut fired = self.fired.lock().unwrap_or_else(|e| e.into_inner());

        if is_late(hour) && fired.late_night != Some(night_of) {
            fired.late_night = Some(night_of);
            return Some(ObservationPayload::LateNight { hour });
        }

        if let Some(&(_, meal)) = MEALS.iter().find(|(h, _)| *h == hour) {
            if !fired.meals.contains(&(today, meal)) {
                fired.meals.retain(|(d, _)| *d == today);
                fired.meals.push((today, meal));
                return Some(ObservationPayload::MealTime {
                    meal: meal.to_string(),
                });
            }
        }

        let since = fired.last_rest.unwrap_or(self.session_start);
        if (now - since).num_minutes() >= LONG_SESSION_MINUTES {
            fired.last_rest = Some(now);
            let minutes = (now - self.session_start).num_minutes().max(0) as u64;
            return Some(ObservationPayload::LongSession { minutes });
        }
        None
    }
}

#[async_trait]
impl Sensor for ClockSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Clock
    }

    fn base_interval(&self) -> Duration {
        self.base_interval
    }

    async fn poll(&self) -> Result<Option<Observation>, AnimaError> {
        let now = self.clock.now();
        Ok(self
            .observe(now)
            .map(|p| Observation::at(SensorKind::Clock, p, now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::ManualClock;
    use chrono::TimeZone;

    fn sensor_at(h: u32, m: u32) -> (Arc<ManualClock>, ClockSensor) {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let sensor = ClockSensor::new(
            clock.clone(),
            FixedOffset::east_opt(0).unwrap(),
            Duration::from_secs(60),
        );
        (clock, sensor)
    }

    #[tokio::test]
    async fn test_late_night_once_per_night() {
        let (clock, sensor) = sensor_at(23, 30);
        let obs = sensor.poll().await.unwrap().unwrap();
        assert_eq!(obs.payload, ObservationPayload::LateNight { hour: 23 });

        clock.advance(chrono::Duration::minutes(60)); // 00:30 next day, same night
        assert!(sensor.poll().await.unwrap().is_none());

        clock.advance(chrono::Duration::hours(23)); // 23:30 next night
        assert!(matches!(
            sensor.poll().await.unwrap().unwrap().payload,
            ObservationPayload::LateNight { .. }
        ));
    }

    #[tokio::test]
    async fn test_meal_once_per_day() {
        let (clock, sensor) = sensor_at(11, 50);
        assert!(sensor.poll().await.unwrap().is_none());
        clock.advance(chrono::Duration::minutes(15));
        assert_eq!(
            sensor.poll().await.unwrap().unwrap().payload,
            ObservationPayload::MealTime {
                meal: "lunch".to_string()
            }
        );
        clock.advance(chrono::Duration::minutes(15));
        assert!(sensor.poll().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_long_session_every_two_hours() {
        let (clock, sensor) = sensor_at(8, 10);
        clock.advance(chrono::Duration::minutes(100));
        assert!(sensor.poll().await.unwrap().is_none());
        clock.advance(chrono::Duration::minutes(20)); // 10:10
        assert_eq!(
            sensor.poll().await.unwrap().unwrap().payload,
            ObservationPayload::LongSession { minutes: 120 }
        );
        clock.advance(chrono::Duration::minutes(30));
        assert!(sensor.poll().await.unwrap().is_none());
    }
}
