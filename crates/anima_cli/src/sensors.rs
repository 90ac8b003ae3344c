use anima_core::config::SensorsConfig;
use anima_core::{Clock, Sensor};
use anima_perception::{
    ActivityPresenceProbe, CameraSensor, ClockSensor, DeviceSensor, FilesystemSensor,
    ScreenSensor, SysfsBatteryProbe, WindowTitleProbe,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Terminal activity stands in for a camera: typing means someone is there.
const IDLE_AFTER: Duration = Duration::from_secs(5 * 60);

pub struct SensorSet {
    pub sensors: Vec<Arc<dyn Sensor>>,
    pub presence: Arc<ActivityPresenceProbe>,
}

pub fn build_sensors(
    config: &SensorsConfig,
    clock: Arc<dyn Clock>,
    probe_timeout: Duration,
) -> SensorSet {
    let presence = Arc::new(ActivityPresenceProbe::new(IDLE_AFTER));
    let mut sensors: Vec<Arc<dyn Sensor>> = Vec::new();

    if config.camera.enabled {
        sensors.push(Arc::new(CameraSensor::new(
            presence.clone(),
            config.camera.interval(),
            probe_timeout,
        )));
    }
    if config.screen.enabled {
        sensors.push(Arc::new(ScreenSensor::new(
            Arc::new(WindowTitleProbe::default()),
            config.screen.interval(),
            probe_timeout,
        )));
    }
    if config.clock.enabled {
        sensors.push(Arc::new(ClockSensor::local(clock, config.clock.interval())));
    }
    if config.filesystem.enabled {
        match &config.filesystem.watch_dir {
            Some(dir) => sensors.push(Arc::new(FilesystemSensor::new(
                dir.clone(),
                Duration::from_secs_f64(config.filesystem.interval_secs.max(1.0)),
            ))),
            None => tracing::info!("No watch directory configured, filesystem sensor off"),
        }
    }
    if config.device.enabled {
        let probe = SysfsBatteryProbe::new(config.device.power_supply_dir.clone())
            .with_loadavg(Some(PathBuf::from("/proc/loadavg")));
        sensors.push(Arc::new(DeviceSensor::new(
            Arc::new(probe),
            Duration::from_secs_f64(config.device.interval_secs.max(1.0)),
            probe_timeout,
            config.device.low_battery_percent,
        )));
    }

    SensorSet { sensors, presence }
}
