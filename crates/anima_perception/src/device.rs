use crate::probe::{bounded, DeviceProbe, DeviceReading};
use anima_core::{AnimaError, Observation, ObservationPayload, Sensor, SensorKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Load per CPU above which the machine counts as struggling.
const HIGH_LOAD: f32 = 1.5;

#[derive(Debug, Default)]
struct Warned {
    battery: bool,
    load: bool,
}

/// Battery and load watcher. Each warning fires once until the condition clears.
pub struct DeviceSensor {
    probe: Arc<dyn DeviceProbe>,
    base_interval: Duration,
    probe_timeout: Duration,
    low_battery_percent: u8,
    warned: Mutex<Warned>,
}

impl DeviceSensor {
    pub fn new(
        probe: Arc<dyn DeviceProbe>,
        base_interval: Duration,
        probe_timeout: Duration,
        low_battery_percent: u8,
    ) -> Self {
        Self {
            probe,
            base_interval,
            probe_timeout,
            low_battery_percent,
            warned: Mutex::new(Warned::default()),
        }
    }

    fn judge(&self, reading: DeviceReading) -> Option<ObservationPayload> {
        let mut warned = self.warned.lock().unwrap_or_else(|e| e.into_inner());

        let low = reading
            .battery_percent
            .filter(|p| !reading.charging && *p <= self.low_battery_percent);
        match low {
            Some(percent) if !warned.battery => {
                warned.battery = true;
                return Some(ObservationPayload::BatteryLow { percent });
            }
            Some(_) => {}
            None => warned.battery = false,
        }

        match reading.load.filter(|l| *l >= HIGH_LOAD) {
            Some(load) if !warned.load => {
                warned.load = true;
                Some(ObservationPayload::HighLoad { load })
            }
            Some(_) => None,
            None => {
                warned.load = false;
                None
            }
        }
    }
}

#[async_trait]
impl Sensor for DeviceSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Device
    }

    fn base_interval(&self) -> Duration {
        self.base_interval
    }

    async fn poll(&self) -> Result<Option<Observation>, AnimaError> {
        let reading = bounded(SensorKind::Device, self.probe_timeout, self.probe.read()).await?;
        Ok(self
            .judge(reading)
            .map(|p| Observation::new(SensorKind::Device, p)))
    }
}

// ============================================================================
// Linux sysfs probe
// ============================================================================

/// Reads `<power_supply_dir>/*/capacity` and `status`, plus `/proc/loadavg`.
///
/// A missing power-supply directory is an error. A directory without any
/// battery (desktops) reads as "no battery".
#[derive(Debug, Clone)]
pub struct SysfsBatteryProbe {
    power_supply_dir: PathBuf,
    loadavg_path: Option<PathBuf>,
}

impl SysfsBatteryProbe {
    pub fn new(power_supply_dir: impl Into<PathBuf>) -> Self {
        Self {
            power_supply_dir: power_supply_dir.into(),
            loadavg_path: Some(PathBuf::from("/proc/loadavg")),
        }
    }

    pub fn with_loadavg(mut self, path: Option<PathBuf>) -> Self {
        self.loadavg_path = path;
        self
    }

    async fn battery(&self) -> Result<Option<(u8, bool)>> {
        let mut entries = tokio::fs::read_dir(&self.power_supply_dir)
            .await
            .with_context(|| format!("Cannot read {}", self.power_supply_dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let dir = entry.path();
            let Some(capacity) = read_trimmed(&dir.join("capacity")).await else {
                continue;
            };
            let Ok(percent) = capacity.parse::<u8>() else {
                continue;
            };
            let status = read_trimmed(&dir.join("status")).await.unwrap_or_default();
            let charging = matches!(status.as_str(), "Charging" | "Full");
            return Ok(Some((percent.min(100), charging)));
        }
        Ok(None)
    }

    async fn load(&self) -> Option<f32> {
        let path = self.loadavg_path.as_ref()?;
        let content = read_trimmed(path).await?;
        let one_min: f32 = content.split_whitespace().next()?.parse().ok()?;
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1) as f32;
        Some(one_min / cpus)
    }
}

async fn read_trimmed(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path)
        .await
        .ok()
        .map(|s| s.trim().to_string())
}

#[async_trait]
impl DeviceProbe for SysfsBatteryProbe {
    async fn read(&self) -> Result<DeviceReading> {
        let battery = self.battery().await?;
        Ok(DeviceReading {
            battery_percent: battery.map(|(p, _)| p),
            charging: battery.map(|(_, c)| c).unwrap_or(false),
            load: self.load().await,
        })
    }
}
