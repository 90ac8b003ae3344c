//! Anima expression: the autonomous scheduler and everything between an
//! observation and an emitted action.
//!
//! - `classify`: fixed observation → intent rules
//! - `presence`: quiet hours
//! - `render`: generator with template fallback
//! - `sink`: bounded, per-channel outbound queue
//! - `scheduler`: the loops tying sensors, emotions and memory together

pub mod classify;
pub mod presence;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod sink;

pub use classify::classify;
pub use presence::PresenceFilter;
pub use render::{Rendered, Renderer};
pub use scheduler::{
    AutonomousScheduler, DetailOutcome, EngineStatus, MessageOutcome, SchedulerHandle,
    SchedulerParts,
};
pub use session::load_session;
pub use sink::{ActionSink, PushOutcome};
