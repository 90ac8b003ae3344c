//! JSON state file for resuming a companion across restarts.

use crate::tracker::TrackerSnapshot;
use anima_core::{AnimaError, EmotionSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub ledger: EmotionSnapshot,
    pub tracker: TrackerSnapshot,
    pub saved_at: DateTime<Utc>,
}

impl PersistedState {
    pub fn new(ledger: EmotionSnapshot, tracker: TrackerSnapshot, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: STATE_VERSION,
            ledger,
            tracker,
            saved_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state file. `Ok(None)` when there is none yet.
    pub async fn load(&self) -> Result<Option<PersistedState>, AnimaError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AnimaError::Persistence(format!(
                    "read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        let state: PersistedState = serde_json::from_slice(&bytes).map_err(|e| {
            AnimaError::Persistence(format!("parse {}: {}", self.path.display(), e))
        })?;
        if state.version != STATE_VERSION {
            return Err(AnimaError::Persistence(format!(
                "unsupported state version {} (expected {})",
                state.version, STATE_VERSION
            )));
        }
        Ok(Some(state))
    }

    /// Write through a temp file and rename, so a crash never leaves half a file.
    pub async fn save(&self, state: &PersistedState) -> Result<(), AnimaError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AnimaError::Persistence(format!("create {}: {}", parent.display(), e)))?;
        }
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| AnimaError::Persistence(format!("serialize: {}", e)))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| AnimaError::Persistence(format!("write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AnimaError::Persistence(format!("rename {}: {}", tmp.display(), e)))?;
        tracing::debug!("State saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FragmentCatalog, MemoryStageTracker};
    use anima_core::config::StageGates;

    fn sample() -> PersistedState {
        let now = Utc::now();
        let mut tracker = MemoryStageTracker::new(FragmentCatalog::builtin(), StageGates::default(), now);
        tracker.record_interaction();
        PersistedState::new(EmotionSnapshot::at_rest(), tracker.snapshot(), now)
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("anima.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("anima.json"));
        let state = sample();
        store.save(&state).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, state);
        assert!(!dir.path().join("nested").join("anima.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_rejects_garbage_and_wrong_version() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("anima.json");
        let store = StateStore::new(&path);

        tokio::fs::write(&path, b"{not json").await.unwrap();
        assert!(matches!(store.load().await, Err(AnimaError::Persistence(_))));

        let mut state = sample();
        state.version = 99;
        tokio::fs::write(&path, serde_json::to_vec(&state).unwrap())
            .await
            .unwrap();
        assert!(matches!(store.load().await, Err(AnimaError::Persistence(_))));
    }
}
