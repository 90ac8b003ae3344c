//! Contracts for the external collaborators behind the sensors.
//!
//! Face/motion detection, window inspection and power readings are done
//! elsewhere; adapters only consume their labelled results.

use anima_core::{AnimaError, SensorKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresenceReading {
    pub face: bool,
    pub motion: bool,
    /// Who was recognized, if the detector knows.
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceReading {
    pub battery_percent: Option<u8>,
    pub charging: bool,
    /// One-minute load average divided by CPU count.
    pub load: Option<f32>,
}

#[async_trait]
pub trait PresenceProbe: Send + Sync {
    async fn read(&self) -> Result<PresenceReading>;
}

#[async_trait]
pub trait ScreenProbe: Send + Sync {
    /// Title of the focused window, `None` when nothing is focused.
    async fn active_window(&self) -> Result<Option<String>>;
}

#[async_trait]
pub trait DeviceProbe: Send + Sync {
    async fn read(&self) -> Result<DeviceReading>;
}

/// Run a probe call under `limit`, mapping errors and timeouts to `SensorUnavailable`.
pub(crate) async fn bounded<T, F>(kind: SensorKind, limit: Duration, fut: F) -> Result<T, AnimaError>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(AnimaError::sensor_unavailable(kind, format!("{:#}", e))),
        Err(_) => Err(AnimaError::sensor_unavailable(
            kind,
            format!("probe timed out after {:?}", limit),
        )),
    }
}

// ============================================================================
// Built-in probes
// ============================================================================

/// Presence inferred from user activity instead of a camera.
///
/// The user counts as present while they have done something within
/// `idle_after`. Front-ends call `touch` on every keystroke or command.
#[derive(Debug)]
pub struct ActivityPresenceProbe {
    last_activity: Mutex<Option<Instant>>,
    idle_after: Duration,
}

impl ActivityPresenceProbe {
    pub fn new(idle_after: Duration) -> Self {
        Self {
            last_activity: Mutex::new(None),
            idle_after,
        }
    }

    pub fn touch(&self) {
        *self.last_activity.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
    }
}

#[async_trait]
impl PresenceProbe for ActivityPresenceProbe {
    async fn read(&self) -> Result<PresenceReading> {
        let last = *self.last_activity.lock().unwrap_or_else(|e| e.into_inner());
        let face = last.is_some_and(|t| t.elapsed() < self.idle_after);
        Ok(PresenceReading {
            face,
            motion: false,
            label: None,
        })
    }
}

/// Focused window title from `xdotool` on X11 desktops.
#[derive(Debug, Clone)]
pub struct WindowTitleProbe {
    program: String,
}

impl Default for WindowTitleProbe {
    fn default() -> Self {
        Self {
            program: "xdotool".to_string(),
        }
    }
}

impl WindowTitleProbe {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl ScreenProbe for WindowTitleProbe {
    async fn active_window(&self) -> Result<Option<String>> {
        let output = tokio::process::Command::new(&self.program)
            .args(["getactivewindow", "getwindowname"])
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.program))?;
        if !output.status.success() {
            // No focused window is not an error.
            return Ok(None);
        }
        let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!title.is_empty()).then_some(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_activity_presence() {
        let probe = ActivityPresenceProbe::new(Duration::from_secs(60));
        assert!(!probe.read().await.unwrap().face);
        probe.touch();
        assert!(probe.read().await.unwrap().face);

        let probe = ActivityPresenceProbe::new(Duration::ZERO);
        probe.touch();
        assert!(!probe.read().await.unwrap().face);
    }

    #[tokio::test]
    async fn test_bounded_maps_errors() {
        let err = bounded::<(), _>(SensorKind::Screen, Duration::from_secs(1), async {
            anyhow::bail!("no display")
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "sensor screen unavailable: no display");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let err = bounded::<(), _>(SensorKind::Camera, Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AnimaError::SensorUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_missing_window_tool_is_error() {
        let probe = WindowTitleProbe::with_program("definitely-not-a-real-binary-anima");
        assert!(probe.active_window().await.is_err());
    }
}
