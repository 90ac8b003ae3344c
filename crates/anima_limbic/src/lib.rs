//! # Anima Limbic System
//!
//! The affective half of the companion. Owns the Emotion Ledger: eight
//! discrete channels, each with an intensity in [0, 1] and a linear,
//! channel-specific decay rate.
//!
//! ## Mutation
//!
//! The ledger changes through exactly two doors:
//! 1. `apply_trigger` adds a signed delta to one channel and clamps it
//! 2. `tick_decay` drains every channel by `rate * elapsed`, floored at 0
//!
//! Everything else (named affect events, stage-entry emotions) is sugar over
//! `apply_trigger`, so every change lands in the append-only trigger log.
//!
//! ## Time Scales
//!
//! - Fast (seconds to minutes): surprised, excited, angry
//! - Medium (tens of minutes): happy, curious, calm
//! - Slow (hours): sad, lonely

mod events;
mod heartbeat;
mod ledger;
mod profile;

pub use events::{stage_entry_deltas, AffectEvent};
pub use heartbeat::HeartbeatConfig;
pub use ledger::{EmotionLedger, SharedLedger, TriggerRecord, TriggerSource};
pub use profile::{default_profiles, ChannelProfile};
