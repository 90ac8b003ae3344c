use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnimaConfig {
    pub engine: EngineConfig,
    pub stages: StageGates,
    pub backoff: BackoffConfig,
    pub sensors: SensorsConfig,
    pub presence: PresenceConfig,
    pub llm: LlmConfig,
    /// Optional persona TOML; the built-in persona is used when absent.
    pub persona_path: Option<PathBuf>,
    /// Optional fragment catalog TOML; the built-in catalog is used when absent.
    pub catalog_path: Option<PathBuf>,
}

impl AnimaConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: AnimaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ANIMA_STATE_PATH") {
            self.engine.state_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("ANIMA_LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("ANIMA_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("ANIMA_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("ANIMA_WATCH_DIR") {
            self.sensors.filesystem.watch_dir = Some(PathBuf::from(v));
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Period of the decay / stage-evaluation loop.
    pub decay_tick_ms: u64,
    /// Period of the autosave loop. 0 disables autosave.
    pub autosave_secs: u64,
    pub queue_capacity: usize,
    pub generation_timeout_ms: u64,
    pub poll_timeout_ms: u64,
    /// Minutes without seeing the user before loneliness starts building.
    pub neglect_after_mins: u64,
    pub state_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decay_tick_ms: 2_000,
            autosave_secs: 60,
            queue_capacity: 32,
            generation_timeout_ms: 8_000,
            poll_timeout_ms: 3_000,
            neglect_after_mins: 30,
            state_path: None,
        }
    }
}

impl EngineConfig {
    pub fn decay_tick(&self) -> Duration {
        Duration::from_millis(self.decay_tick_ms.max(1))
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn neglect_after(&self) -> Duration {
        Duration::from_secs(self.neglect_after_mins * 60)
    }
}

/// Thresholds of the stage transition table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StageGates {
    pub relaxed_min_scans: u32,
    pub relaxed_min_hours: i64,
    pub trusting_min_interactions: u32,
    pub trusting_min_care_events: u32,
    pub dependent_min_details: u32,
    pub dependent_min_days: i64,
}

impl Default for StageGates {
    fn default() -> Self {
        Self {
            relaxed_min_scans: 1,
            relaxed_min_hours: 24,
            trusting_min_interactions: 10,
            trusting_min_care_events: 3,
            dependent_min_details: 1,
            dependent_min_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_secs: f64,
    pub factor: f64,
    pub ceiling_secs: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_secs: 5.0,
            factor: 2.0,
            ceiling_secs: 300.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SensorToggle {
    pub enabled: bool,
    pub interval_secs: f64,
}

impl SensorToggle {
    fn every(interval_secs: f64) -> Self {
        Self {
            enabled: true,
            interval_secs,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs.max(0.1))
    }
}

impl Default for SensorToggle {
    fn default() -> Self {
        Self::every(30.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilesystemSensorConfig {
    pub enabled: bool,
    pub interval_secs: f64,
    pub watch_dir: Option<PathBuf>,
}

/// Desktop if the platform has one, else the home directory.
pub fn default_watch_dir() -> Option<PathBuf> {
    dirs::desktop_dir().or_else(dirs::home_dir)
}

impl Default for FilesystemSensorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60.0,
            watch_dir: default_watch_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeviceSensorConfig {
    pub enabled: bool,
    pub interval_secs: f64,
    pub power_supply_dir: PathBuf,
    pub low_battery_percent: u8,
}

impl Default for DeviceSensorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 120.0,
            power_supply_dir: PathBuf::from("/sys/class/power_supply"),
            low_battery_percent: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SensorsConfig {
    pub camera: SensorToggle,
    pub screen: SensorToggle,
    pub clock: SensorToggle,
    pub filesystem: FilesystemSensorConfig,
    pub device: DeviceSensorConfig,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            camera: SensorToggle::every(10.0),
            screen: SensorToggle::every(15.0),
            clock: SensorToggle::every(60.0),
            filesystem: FilesystemSensorConfig::default(),
            device: DeviceSensorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub active_start_hour: u32,
    pub active_end_hour: u32,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            active_start_hour: 8,
            active_end_hour: 23,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "template", "mock" or "ollama"
    pub provider: String,
    pub model: String,
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "template".to_string(),
            model: "qwen2.5:7b".to_string(),
            base_url: "http://localhost:11434".to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
