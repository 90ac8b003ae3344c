//! Memory Stage Tracker
//!
//! Strictly ordered state machine Anxious -> Relaxed -> Trusting -> Dependent.
//! Each step needs a counter threshold, and the first and last steps also
//! need a minimum elapsed time since the session started, so trust cannot
//! escalate in a single burst of activity.

use crate::catalog::FragmentCatalog;
use crate::fragment::MemoryFragment;
use anima_core::config::StageGates;
use anima_core::{AnimaError, MemoryStage};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tracker shared between the engine loops.
pub type SharedTracker = Arc<Mutex<MemoryStageTracker>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockCause {
    /// Unlocked when the tracker was created
    Initial,
    /// Unlocked by entering its stage
    StageEntry,
    /// Unlocked by a detail the user supplied
    UserDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub fragment_id: String,
    pub stage: MemoryStage,
    pub cause: UnlockCause,
    pub at: DateTime<Utc>,
}

/// Result of a successful `evaluate_transition`.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTransition {
    pub from: MemoryStage,
    pub to: MemoryStage,
    pub at: DateTime<Utc>,
    /// Fragments unlocked by entering `to`.
    pub unlocked: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockedFragment {
    pub id: String,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub user_detail: Option<String>,
}

/// Persistable tracker state. Fragment definitions come from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub stage: MemoryStage,
    pub interaction_count: u32,
    pub care_event_count: u32,
    pub completed_scans: u32,
    pub qualifying_details: u32,
    pub session_started_at: DateTime<Utc>,
    pub stage_entered_at: DateTime<Utc>,
    pub unlocked: Vec<UnlockedFragment>,
    #[serde(default)]
    pub recovery_log: Vec<RecoveryRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerSummary {
    pub stage: MemoryStage,
    pub unlocked: usize,
    pub total: usize,
    pub interaction_count: u32,
    pub care_event_count: u32,
    pub completed_scans: u32,
    pub qualifying_details: u32,
}

impl fmt::Display for TrackerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stage {} | memories {}/{} | interactions {} | care {} | scans {} | details {}",
            self.stage,
            self.unlocked,
            self.total,
            self.interaction_count,
            self.care_event_count,
            self.completed_scans,
            self.qualifying_details
        )
    }
}

#[derive(Debug, Clone)]
pub struct MemoryStageTracker {
    stage: MemoryStage,
    interaction_count: u32,
    care_event_count: u32,
    completed_scans: u32,
    qualifying_details: u32,
    session_started_at: DateTime<Utc>,
    stage_entered_at: DateTime<Utc>,
    gates: StageGates,
    fragments: Vec<MemoryFragment>,
    recovery_log: Vec<RecoveryRecord>,
}

impl MemoryStageTracker {
    /// Fresh session at Anxious. Undetailed Anxious fragments unlock immediately.
    pub fn new(catalog: FragmentCatalog, gates: StageGates, now: DateTime<Utc>) -> Self {
        let mut tracker = Self {
            stage: MemoryStage::Anxious,
            interaction_count: 0,
            care_event_count: 0,
            completed_scans: 0,
            qualifying_details: 0,
            session_started_at: now,
            stage_entered_at: now,
            gates,
            fragments: catalog.into_fragments(),
            recovery_log: Vec::new(),
        };
        tracker.unlock_stage_fragments(MemoryStage::Anxious, UnlockCause::Initial, now);
        tracker
    }

    /// Rebuild from persisted state against the current catalog.
    ///
    /// Fails with `UnknownFragment` if the snapshot names a fragment the
    /// catalog does not carry.
    pub fn restore(
        snapshot: TrackerSnapshot,
        catalog: FragmentCatalog,
        gates: StageGates,
    ) -> Result<Self, AnimaError> {
        let mut fragments = catalog.into_fragments();
        for saved in &snapshot.unlocked {
            let fragment = fragments
                .iter_mut()
                .find(|f| f.id == saved.id)
                .ok_or_else(|| AnimaError::UnknownFragment(saved.id.clone()))?;
            fragment.unlock(saved.unlocked_at.unwrap_or(snapshot.stage_entered_at));
            fragment.user_detail = saved.user_detail.clone();
        }

        let mut tracker = Self {
            stage: snapshot.stage,
            interaction_count: snapshot.interaction_count,
            care_event_count: snapshot.care_event_count,
            completed_scans: snapshot.completed_scans,
            qualifying_details: snapshot.qualifying_details,
            session_started_at: snapshot.session_started_at,
            stage_entered_at: snapshot.stage_entered_at,
            gates,
            fragments,
            recovery_log: snapshot.recovery_log,
        };

        // Catalog may have grown since the save.
        let at = tracker.stage_entered_at;
        let current = tracker.stage;
        for stage in MemoryStage::ALL.into_iter().filter(|s| *s <= current) {
            tracker.unlock_stage_fragments(stage, UnlockCause::StageEntry, at);
        }
        Ok(tracker)
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            stage: self.stage,
            interaction_count: self.interaction_count,
            care_event_count: self.care_event_count,
            completed_scans: self.completed_scans,
            qualifying_details: self.qualifying_details,
            session_started_at: self.session_started_at,
            stage_entered_at: self.stage_entered_at,
            unlocked: self
                .fragments
                .iter()
                .filter(|f| f.is_unlocked())
                .map(|f| UnlockedFragment {
                    id: f.id.clone(),
                    unlocked_at: f.unlocked_at,
                    user_detail: f.user_detail.clone(),
                })
                .collect(),
            recovery_log: self.recovery_log.clone(),
        }
    }

    // ========================================================================
    // Counters
    // ========================================================================

    pub fn record_interaction(&mut self) {
        self.interaction_count = self.interaction_count.saturating_add(1);
    }

    pub fn record_care_event(&mut self) {
        self.care_event_count = self.care_event_count.saturating_add(1);
    }

    pub fn record_scan_completed(&mut self) {
        self.completed_scans = self.completed_scans.saturating_add(1);
    }

    /// Accept a user-supplied detail for a fragment.
    ///
    /// Returns `Ok(true)` when the detail unlocked the fragment, `Ok(false)`
    /// when the fragment was already unlocked and only its detail changed.
    pub fn record_user_detail(
        &mut self,
        fragment_id: &str,
        detail: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, AnimaError> {
        let stage = self.stage;
        let fragment = self
            .fragments
            .iter_mut()
            .find(|f| f.id == fragment_id)
            .ok_or_else(|| AnimaError::UnknownFragment(fragment_id.to_string()))?;

        if !fragment.requires_user_detail {
            return Err(AnimaError::PrematureDetail {
                fragment_id: fragment_id.to_string(),
                reason: "fragment does not take user details".to_string(),
            });
        }
        if stage < fragment.stage_required {
            return Err(AnimaError::PrematureDetail {
                fragment_id: fragment_id.to_string(),
                reason: format!(
                    "requires stage {}, currently {}",
                    fragment.stage_required, stage
                ),
            });
        }
        let detail = detail.trim();
        if detail.is_empty() {
            return Err(AnimaError::PrematureDetail {
                fragment_id: fragment_id.to_string(),
                reason: "empty detail".to_string(),
            });
        }

        fragment.user_detail = Some(detail.to_string());
        if !fragment.unlock(at) {
            return Ok(false);
        }
        self.qualifying_details = self.qualifying_details.saturating_add(1);
        self.recovery_log.push(RecoveryRecord {
            fragment_id: fragment_id.to_string(),
            stage,
            cause: UnlockCause::UserDetail,
            at,
        });
        tracing::info!("Memory fragment '{}' recovered from user detail", fragment_id);
        Ok(true)
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn gate_open(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now - self.session_started_at;
        let g = &self.gates;
        match self.stage {
            MemoryStage::Anxious => {
                self.completed_scans >= g.relaxed_min_scans
                    && elapsed >= Duration::hours(g.relaxed_min_hours)
            }
            MemoryStage::Relaxed => {
                self.interaction_count >= g.trusting_min_interactions
                    && self.care_event_count >= g.trusting_min_care_events
            }
            MemoryStage::Trusting => {
                self.qualifying_details >= g.dependent_min_details
                    && elapsed >= Duration::days(g.dependent_min_days)
            }
            MemoryStage::Dependent => false,
        }
    }

    /// Advance at most one stage if the current gate is open.
    pub fn evaluate_transition(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<StageTransition>, AnimaError> {
        if !self.gate_open(now) {
            return Ok(None);
        }
        match self.stage.next() {
            Some(next) => self.advance_to(next, now).map(Some),
            None => Ok(None),
        }
    }

    /// Move to `to`, which must be exactly the next stage.
    ///
    /// Anything else is a `StageInvariantViolation`; the tracker is left
    /// untouched.
    pub fn advance_to(
        &mut self,
        to: MemoryStage,
        at: DateTime<Utc>,
    ) -> Result<StageTransition, AnimaError> {
        let from = self.stage;
        if from.next() != Some(to) {
            return Err(AnimaError::StageInvariantViolation { from, to });
        }
        self.stage = to;
        self.stage_entered_at = at;
        let unlocked = self.unlock_stage_fragments(to, UnlockCause::StageEntry, at);
        tracing::info!(
            "Memory stage {} -> {} ({} fragments unlocked)",
            from,
            to,
            unlocked.len()
        );
        Ok(StageTransition {
            from,
            to,
            at,
            unlocked,
        })
    }

    fn unlock_stage_fragments(
        &mut self,
        stage: MemoryStage,
        cause: UnlockCause,
        at: DateTime<Utc>,
    ) -> Vec<String> {
        let mut unlocked = Vec::new();
        for f in self
            .fragments
            .iter_mut()
            .filter(|f| f.stage_required == stage && !f.requires_user_detail)
        {
            if f.unlock(at) {
                tracing::debug!("Unlocked fragment '{}' ({:?})", f.id, cause);
                unlocked.push(f.id.clone());
                self.recovery_log.push(RecoveryRecord {
                    fragment_id: f.id.clone(),
                    stage,
                    cause,
                    at,
                });
            }
        }
        unlocked
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn stage(&self) -> MemoryStage {
        self.stage
    }

    pub fn interaction_count(&self) -> u32 {
        self.interaction_count
    }

    pub fn care_event_count(&self) -> u32 {
        self.care_event_count
    }

    pub fn completed_scans(&self) -> u32 {
        self.completed_scans
    }

    pub fn session_started_at(&self) -> DateTime<Utc> {
        self.session_started_at
    }

    pub fn stage_entered_at(&self) -> DateTime<Utc> {
        self.stage_entered_at
    }

    pub fn fragment(&self, id: &str) -> Option<&MemoryFragment> {
        self.fragments.iter().find(|f| f.id == id)
    }

    pub fn fragments(&self) -> &[MemoryFragment] {
        &self.fragments
    }

    pub fn unlocked_ids(&self) -> HashSet<String> {
        self.fragments
            .iter()
            .filter(|f| f.is_unlocked())
            .map(|f| f.id.clone())
            .collect()
    }

    pub fn recovery_log(&self) -> &[RecoveryRecord] {
        &self.recovery_log
    }

    /// Unlocked fragments mentioned by keyword in `text`.
    pub fn recall(&self, text: &str) -> Vec<&MemoryFragment> {
        self.fragments
            .iter()
            .filter(|f| f.is_unlocked() && f.mentioned_in(text))
            .collect()
    }

    /// Rendered contents of every unlocked fragment, for prompts.
    pub fn context_lines(&self) -> Vec<String> {
        self.fragments
            .iter()
            .filter(|f| f.is_unlocked())
            .map(|f| f.render())
            .collect()
    }

    pub fn summary(&self) -> TrackerSummary {
        TrackerSummary {
            stage: self.stage,
            unlocked: self.fragments.iter().filter(|f| f.is_unlocked()).count(),
            total: self.fragments.len(),
            interaction_count: self.interaction_count,
            care_event_count: self.care_event_count,
            completed_scans: self.completed_scans,
            qualifying_details: self.qualifying_details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_at(start: DateTime<Utc>) -> MemoryStageTracker {
        MemoryStageTracker::new(FragmentCatalog::builtin(), StageGates::default(), start)
    }

    #[test]
    fn test_initial_unlocks_only_undetailed_anxious() {
        let t = tracker_at(Utc::now());
        let ids = t.unlocked_ids();
        assert!(ids.contains("basic_identity"));
        assert!(ids.contains("combat_instinct"));
        assert!(!ids.contains("companion_impression"));
        assert_eq!(ids.len(), 2);
        assert!(t
            .recovery_log()
            .iter()
            .all(|r| r.cause == UnlockCause::Initial));
    }

    #[test]
    fn test_relaxed_needs_scan_and_time() {
        let start = Utc::now();
        let mut t = tracker_at(start);

        assert!(t.evaluate_transition(start + Duration::hours(25)).unwrap().is_none());
        t.record_scan_completed();
        assert!(t.evaluate_transition(start + Duration::hours(23)).unwrap().is_none());

        let tr = t
            .evaluate_transition(start + Duration::hours(24))
            .unwrap()
            .unwrap();
        assert_eq!(tr.from, MemoryStage::Anxious);
        assert_eq!(tr.to, MemoryStage::Relaxed);
        assert_eq!(tr.unlocked, vec!["rest_memories".to_string()]);
    }

    #[test]
    fn test_trusting_exactly_once() {
        let start = Utc::now();
        let mut t = tracker_at(start);
        t.advance_to(MemoryStage::Relaxed, start).unwrap();
        for _ in 0..10 {
            t.record_interaction();
        }
        for _ in 0..3 {
            t.record_care_event();
        }
        let first = t.evaluate_transition(start).unwrap();
        assert_eq!(first.map(|tr| tr.to), Some(MemoryStage::Trusting));
        assert!(t.evaluate_transition(start).unwrap().is_none());
        assert!(t.evaluate_transition(start).unwrap().is_none());
        assert_eq!(t.stage(), MemoryStage::Trusting);
    }

    #[test]
    fn test_regression_is_violation() {
        let start = Utc::now();
        let mut t = tracker_at(start);
        t.advance_to(MemoryStage::Relaxed, start).unwrap();
        let err = t.advance_to(MemoryStage::Anxious, start).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(t.stage(), MemoryStage::Relaxed);

        let err = t.advance_to(MemoryStage::Dependent, start).unwrap_err();
        assert!(matches!(err, AnimaError::StageInvariantViolation { .. }));
    }

    #[test]
    fn test_detail_gating() {
        let start = Utc::now();
        let mut t = tracker_at(start);

        let err = t.record_user_detail("core_bond", "you saved me", start).unwrap_err();
        assert!(matches!(err, AnimaError::PrematureDetail { .. }));
        assert!(!t.fragment("core_bond").unwrap().is_unlocked());

        let err = t.record_user_detail("basic_identity", "x", start).unwrap_err();
        assert!(matches!(err, AnimaError::PrematureDetail { .. }));

        let err = t.record_user_detail("nope", "x", start).unwrap_err();
        assert!(matches!(err, AnimaError::UnknownFragment(_)));

        assert!(t
            .record_user_detail("companion_impression", "We sorted books.", start)
            .unwrap());
        assert!(!t
            .record_user_detail("companion_impression", "We sorted photos.", start)
            .unwrap());
        assert_eq!(t.summary().qualifying_details, 1);
        assert_eq!(
            t.fragment("companion_impression").unwrap().render(),
            "A blurry impression of someone who used to tidy things up with me. We sorted photos."
        );
    }

    #[test]
    fn test_dependent_needs_detail_and_week() {
        let start = Utc::now();
        let mut t = tracker_at(start);
        t.advance_to(MemoryStage::Relaxed, start).unwrap();
        t.advance_to(MemoryStage::Trusting, start).unwrap();

        assert!(t.evaluate_transition(start + Duration::days(8)).unwrap().is_none());
        t.record_user_detail("core_bond", "the bridge", start).unwrap();
        assert!(t.evaluate_transition(start + Duration::days(6)).unwrap().is_none());
        let tr = t.evaluate_transition(start + Duration::days(7)).unwrap().unwrap();
        assert_eq!(tr.to, MemoryStage::Dependent);
        assert!(t.unlocked_ids().contains("complete_bond"));
        assert!(!t.unlocked_ids().contains("exclusive_memories"));
        assert!(t.evaluate_transition(start + Duration::days(70)).unwrap().is_none());
    }

    #[test]
    fn test_snapshot_restore() {
        let start = Utc::now();
        let mut t = tracker_at(start);
        t.record_interaction();
        t.record_user_detail("companion_impression", "books", start).unwrap();
        let snap = t.snapshot();

        let restored =
            MemoryStageTracker::restore(snap.clone(), FragmentCatalog::builtin(), StageGates::default())
                .unwrap();
        assert_eq!(restored.snapshot(), snap);

        let mut bad = snap;
        bad.unlocked.push(UnlockedFragment {
            id: "ghost".into(),
            unlocked_at: None,
            user_detail: None,
        });
        let err = MemoryStageTracker::restore(bad, FragmentCatalog::builtin(), StageGates::default())
            .unwrap_err();
        assert!(matches!(err, AnimaError::UnknownFragment(_)));
    }

    #[test]
    fn test_restore_unlocks_fragments_added_since_save() {
        let start = Utc::now();
        let mut t = tracker_at(start);
        t.advance_to(MemoryStage::Relaxed, start).unwrap();
        let mut snap = t.snapshot();
        // saved before rest_memories existed
        snap.unlocked.retain(|f| f.id != "rest_memories");

        let restored =
            MemoryStageTracker::restore(snap, FragmentCatalog::builtin(), StageGates::default())
                .unwrap();
        assert_eq!(restored.stage(), MemoryStage::Relaxed);
        assert!(restored.unlocked_ids().contains("rest_memories"));
        assert!(!restored.unlocked_ids().contains("companion_impression"));
    }

    #[test]
    fn test_recall_and_context() {
        let t = tracker_at(Utc::now());
        assert_eq!(t.recall("is there a knight here?").len(), 1);
        assert!(t.recall("let's make stew").is_empty());
        assert_eq!(t.context_lines().len(), 2);
        assert!(t.summary().to_string().contains("memories 2/9"));
    }
}
