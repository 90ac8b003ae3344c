//! # Anima Perception
//!
//! Sensor adapters behind the `anima_core::Sensor` capability. Each adapter
//! turns an external collaborator (presence detector, window manager,
//! filesystem, clock, power supply) into tagged `Observation`s. The engine
//! dispatches on the payload tag, never on the adapter type.
//!
//! "Nothing seen" is `Ok(None)`. Hard failures become `SensorUnavailable`
//! and the engine backs off before polling that sensor again.

pub mod backoff;
pub mod camera;
pub mod device;
pub mod filesystem;
pub mod probe;
pub mod screen;
pub mod scripted;
pub mod time_of_day;

pub use backoff::Backoff;
pub use camera::CameraSensor;
pub use device::{DeviceSensor, SysfsBatteryProbe};
pub use filesystem::FilesystemSensor;
pub use probe::{
    ActivityPresenceProbe, DeviceProbe, DeviceReading, PresenceProbe, PresenceReading,
    ScreenProbe, WindowTitleProbe,
};
pub use screen::ScreenSensor;
pub use scripted::ScriptedSensor;
pub use time_of_day::ClockSensor;
