//! # Anima Memory
//!
//! Long-term memory of the companion, recovered in stages. The
//! [`MemoryStageTracker`] owns the trust stage, the counters that gate it, and
//! the unlock state of every [`MemoryFragment`]. Fragments refer to stages by
//! value only; the tracker looks them up, never the other way round.
//!
//! Stage entry emotions are not applied here. The tracker reports a
//! [`StageTransition`] and the engine forwards it to the emotion ledger.

mod catalog;
mod fragment;
mod signals;
mod store;
mod tracker;

pub use catalog::FragmentCatalog;
pub use fragment::MemoryFragment;
pub use signals::UtteranceSignals;
pub use store::{PersistedState, StateStore, STATE_VERSION};
pub use tracker::{
    MemoryStageTracker, RecoveryRecord, SharedTracker, StageTransition, TrackerSnapshot,
    TrackerSummary, UnlockCause, UnlockedFragment,
};
