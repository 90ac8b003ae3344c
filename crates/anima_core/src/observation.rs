use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which adapter produced an observation. One scheduler loop runs per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Camera,
    Screen,
    Filesystem,
    Clock,
    Device,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Camera => "camera",
            SensorKind::Screen => "screen",
            SensorKind::Filesystem => "filesystem",
            SensorKind::Clock => "clock",
            SensorKind::Device => "device",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse category of the foreground application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppCategory {
    Game,
    Video,
    Work,
    Browser,
    Other,
}

/// Tagged payload. The scheduler dispatches on the tag, never on adapter type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObservationPayload {
    UserArrived { label: Option<String> },
    UserLeft,
    MotionDetected,
    ActiveApp { label: String, category: AppCategory },
    ScanCompleted { files_seen: usize, unknown_files: usize },
    NewFile { path: PathBuf, known_type: bool },
    LateNight { hour: u32 },
    MealTime { meal: String },
    LongSession { minutes: u64 },
    BatteryLow { percent: u8 },
    HighLoad { load: f32 },
}

impl ObservationPayload {
    /// One-line situation summary used as the intent payload.
    pub fn summary(&self) -> String {
        match self {
            ObservationPayload::UserArrived { label: Some(l) } => format!("{} appeared in front of the camera", l),
            ObservationPayload::UserArrived { label: None } => "the user appeared in front of the camera".to_string(),
            ObservationPayload::UserLeft => "the user left the camera frame".to_string(),
            ObservationPayload::MotionDetected => "something moved near the camera".to_string(),
            ObservationPayload::ActiveApp { label, .. } => format!("the user is using {}", label),
            ObservationPayload::ScanCompleted { files_seen, unknown_files } => format!(
                "finished looking around: {} files, {} unfamiliar",
                files_seen, unknown_files
            ),
            ObservationPayload::NewFile { path, .. } => {
                format!("a new file appeared: {}", path.display())
            }
            ObservationPayload::LateNight { hour } => format!("it is {}:00 and the user is still up", hour),
            ObservationPayload::MealTime { meal } => format!("it is {} time", meal),
            ObservationPayload::LongSession { minutes } => {
                format!("the user has been at the device for {} minutes", minutes)
            }
            ObservationPayload::BatteryLow { percent } => format!("battery is at {}%", percent),
            ObservationPayload::HighLoad { load } => format!("the machine is under heavy load ({:.1})", load),
        }
    }
}

/// Ephemeral sensor reading, consumed once by the scheduler and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub sensor_kind: SensorKind,
    pub payload: ObservationPayload,
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    pub fn new(sensor_kind: SensorKind, payload: ObservationPayload) -> Self {
        Self::at(sensor_kind, payload, Utc::now())
    }

    pub fn at(sensor_kind: SensorKind, payload: ObservationPayload, observed_at: DateTime<Utc>) -> Self {
        Self {
            sensor_kind,
            payload,
            observed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_tagged_json() {
        let payload = ObservationPayload::ScanCompleted {
            files_seen: 12,
            unknown_files: 2,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "scan_completed");
        assert_eq!(json["files_seen"], 12);
    }

    #[test]
    fn test_summary_mentions_details() {
        let s = ObservationPayload::BatteryLow { percent: 9 }.summary();
        assert!(s.contains("9%"));
        let s = ObservationPayload::NewFile {
            path: PathBuf::from("/home/u/notes.xyz"),
            known_type: false,
        }
        .summary();
        assert!(s.contains("notes.xyz"));
    }
}
