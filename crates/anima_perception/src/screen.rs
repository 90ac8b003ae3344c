use crate::probe::{bounded, ScreenProbe};
use anima_core::{
    AnimaError, AppCategory, EmotionChannel, EmotionSnapshot, Observation, ObservationPayload,
    Sensor, SensorKind,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const GAME_HINTS: &[&str] = &["steam", "game", "minecraft", "genshin", "league of legends", "dota"];
const VIDEO_HINTS: &[&str] = &["youtube", "netflix", "bilibili", "twitch", "vlc", "mpv", "prime video"];
const WORK_HINTS: &[&str] = &[
    "visual studio", "code", "vim", "emacs", "terminal", "word", "excel", "powerpoint",
    "libreoffice", "intellij", "slack", "outlook",
];
const BROWSER_HINTS: &[&str] = &["firefox", "chrome", "chromium", "edge", "safari", "brave"];

/// Rough category of a window title. Video beats browser, so a YouTube tab
/// counts as video.
pub fn categorize(label: &str) -> AppCategory {
    let lower = label.to_lowercase();
    let hit = |hints: &[&str]| hints.iter().any(|h| lower.contains(h));
    if hit(GAME_HINTS) {
        AppCategory::Game
    } else if hit(VIDEO_HINTS) {
        AppCategory::Video
    } else if hit(WORK_HINTS) {
        AppCategory::Work
    } else if hit(BROWSER_HINTS) {
        AppCategory::Browser
    } else {
        AppCategory::Other
    }
}

/// Reports the focused application whenever it changes.
pub struct ScreenSensor {
    probe: Arc<dyn ScreenProbe>,
    base_interval: Duration,
    probe_timeout: Duration,
    last_label: Mutex<Option<String>>,
}

impl ScreenSensor {
    pub fn new(probe: Arc<dyn ScreenProbe>, base_interval: Duration, probe_timeout: Duration) -> Self {
        Self {
            probe,
            base_interval,
            probe_timeout,
            last_label: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Sensor for ScreenSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Screen
    }

    fn base_interval(&self) -> Duration {
        self.base_interval
    }

    /// A calm companion glances at the screen half as often.
    fn interval(&self, mood: &EmotionSnapshot) -> Duration {
        if mood.dominant() == EmotionChannel::Calm {
            self.base_interval * 2
        } else {
            self.base_interval
        }
    }

    async fn poll(&self) -> Result<Option<Observation>, AnimaError> {
        let title = bounded(
            SensorKind::Screen,
            self.probe_timeout,
            self.probe.active_window(),
        )
        .await?;

        let mut last = self.last_label.lock().unwrap_or_else(|e| e.into_inner());
        if *last == title {
            return Ok(None);
        }
        *last = title.clone();

        Ok(title.map(|label| {
            let category = categorize(&label);
            Observation::new(
                SensorKind::Screen,
                ObservationPayload::ActiveApp { label, category },
            )
        }))
    }
}
