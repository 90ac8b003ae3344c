use anima_core::config::StageGates;
use anima_core::AnimaError;
use anima_limbic::EmotionLedger;
use anima_memory::{FragmentCatalog, MemoryStageTracker, PersistedState, StateStore};
use chrono::{DateTime, Utc};

/// Resume the saved session, or start a fresh one when nothing was saved.
///
/// A corrupt or incompatible state file is an error rather than a silent
/// restart, so the user's progress is never overwritten by accident.
pub async fn load_session(
    store: Option<&StateStore>,
    catalog: FragmentCatalog,
    gates: StageGates,
    now: DateTime<Utc>,
) -> Result<(EmotionLedger, MemoryStageTracker), AnimaError> {
    let saved = match store {
        Some(store) => store.load().await?,
        None => None,
    };
    match saved {
        Some(PersistedState {
            ledger, tracker, saved_at, ..
        }) => {
            let tracker = MemoryStageTracker::restore(tracker, catalog, gates)?;
            tracing::info!(
                "Resumed session saved at {} ({})",
                saved_at.format("%Y-%m-%d %H:%M"),
                tracker.summary()
            );
            Ok((EmotionLedger::from_snapshot(&ledger), tracker))
        }
        None => {
            tracing::info!("Starting a new session");
            Ok((EmotionLedger::new(), MemoryStageTracker::new(catalog, gates, now)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::MemoryStage;

    #[tokio::test]
    async fn test_fresh_session_without_store() {
        let (ledger, tracker) = load_session(
            None,
            FragmentCatalog::builtin(),
            StageGates::default(),
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(tracker.stage(), MemoryStage::Anxious);
        assert!(ledger.trigger_log().is_empty());
    }

    #[tokio::test]
    async fn test_saved_session_is_resumed() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let now = Utc::now();

        let mut tracker = MemoryStageTracker::new(FragmentCatalog::builtin(), StageGates::default(), now);
        tracker.record_interaction();
        tracker.advance_to(MemoryStage::Relaxed, now).unwrap();
        let state = PersistedState::new(EmotionLedger::new().snapshot(), tracker.snapshot(), now);
        store.save(&state).await.unwrap();

        let (_, resumed) = load_session(Some(&store), FragmentCatalog::builtin(), StageGates::default(), now)
            .await
            .unwrap();
        assert_eq!(resumed.stage(), MemoryStage::Relaxed);
        assert_eq!(resumed.interaction_count(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_state_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let store = StateStore::new(&path);
        let result = load_session(Some(&store), FragmentCatalog::builtin(), StageGates::default(), Utc::now()).await;
        assert!(matches!(result, Err(AnimaError::Persistence(_))));
    }
}
