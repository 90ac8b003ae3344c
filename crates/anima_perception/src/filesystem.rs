use anima_core::{AnimaError, Observation, ObservationPayload, Sensor, SensorKind};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;

const KNOWN_EXTENSIONS: &[&str] = &[
    "txt", "md", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "csv", "json", "toml",
    "png", "jpg", "jpeg", "gif", "webp", "mp3", "mp4", "mkv", "zip", "tar", "gz", "rs", "py",
    "js", "html", "css", "lnk", "desktop",
];

pub fn is_known_type(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| KNOWN_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[derive(Default)]
struct ScanState {
    /// `None` until the first successful scan.
    seen: Option<HashSet<PathBuf>>,
    pending: VecDeque<PathBuf>,
}

/// Watches one directory (usually the desktop).
///
/// The first successful poll is the environmental survey and reports
/// `ScanCompleted`. Later polls report one new file at a time.
pub struct FilesystemSensor {
    dir: PathBuf,
    base_interval: Duration,
    state: Mutex<ScanState>,
}

impl FilesystemSensor {
    pub fn new(dir: impl Into<PathBuf>, base_interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            base_interval,
            state: Mutex::new(ScanState::default()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn list(&self) -> Result<Vec<PathBuf>, AnimaError> {
        let unavailable = |e: std::io::Error| {
            AnimaError::sensor_unavailable(
                SensorKind::Filesystem,
                format!("{}: {}", self.dir.display(), e),
            )
        };
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(unavailable)?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl Sensor for FilesystemSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Filesystem
    }

    fn base_interval(&self) -> Duration {
        self.base_interval
    }

    async fn poll(&self) -> Result<Option<Observation>, AnimaError> {
        let files = self.list().await?;
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let payload = match state.seen.as_mut() {
            None => {
                let unknown_files = files.iter().filter(|p| !is_known_type(p)).count();
                tracing::info!(
                    "Surveyed {}: {} files, {} unfamiliar",
                    self.dir.display(),
                    files.len(),
                    unknown_files
                );
                let files_seen = files.len();
                state.seen = Some(files.into_iter().collect());
                Some(ObservationPayload::ScanCompleted {
                    files_seen,
                    unknown_files,
                })
            }
            Some(seen) => {
                let fresh: Vec<PathBuf> = files.into_iter().filter(|p| seen.insert(p.clone())).collect();
                state.pending.extend(fresh);
                state.pending.pop_front().map(|path| ObservationPayload::NewFile {
                    known_type: is_known_type(&path),
                    path,
                })
            }
        };
        Ok(payload.map(|p| Observation::new(SensorKind::Filesystem, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_poll_is_survey_then_new_files() {
        let dir = tempfile::TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"hi").await.unwrap();
        tokio::fs::write(dir.path().join("blob.xyz"), b"??").await.unwrap();

        let fs = FilesystemSensor::new(dir.path(), Duration::from_secs(60));
        let first = fs.poll().await.unwrap().unwrap();
        assert_eq!(
            first.payload,
            ObservationPayload::ScanCompleted {
                files_seen: 2,
                unknown_files: 1
            }
        );
        assert!(fs.poll().await.unwrap().is_none());

        tokio::fs::write(dir.path().join("a.qqq"), b"").await.unwrap();
        tokio::fs::write(dir.path().join("b.png"), b"").await.unwrap();

        let obs = fs.poll().await.unwrap().unwrap();
        assert_eq!(
            obs.payload,
            ObservationPayload::NewFile {
                path: dir.path().join("a.qqq"),
                known_type: false
            }
        );
        let obs = fs.poll().await.unwrap().unwrap();
        assert_eq!(
            obs.payload,
            ObservationPayload::NewFile {
                path: dir.path().join("b.png"),
                known_type: true
            }
        );
        assert!(fs.poll().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_dir_is_unavailable() {
        let fs = FilesystemSensor::new("/definitely/not/here/anima", Duration::from_secs(60));
        assert!(matches!(
            fs.poll().await,
            Err(AnimaError::SensorUnavailable { sensor: SensorKind::Filesystem, .. })
        ));
    }
}
