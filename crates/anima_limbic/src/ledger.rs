//! The Emotion Ledger
//!
//! Per-channel intensities with clamped triggers, linear decay and an
//! append-only trigger log. The ledger has no clock of its own: trigger
//! timestamps come from the caller and decay takes an explicit elapsed time.

use crate::events::{stage_entry_deltas, AffectEvent};
use crate::profile::{default_profiles, sanitize_rate, ChannelProfile};
use anima_core::emotion::dominant_of;
use anima_core::{
    AnimaError, EmotionChannel, EmotionSnapshot, EmotionState, IntentKind, MemoryStage,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Ledger shared between the engine loops.
pub type SharedLedger = Arc<RwLock<EmotionLedger>>;

/// What caused a trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TriggerSource {
    Intent(IntentKind),
    Event(AffectEvent),
    StageEntry(MemoryStage),
    UserMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub channel: EmotionChannel,
    /// Delta as requested, before clamping.
    pub delta: f32,
    /// Intensity after the clamp.
    pub resulting: f32,
    pub source: TriggerSource,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EmotionLedger {
    /// One entry per channel, in channel order.
    states: Vec<EmotionState>,
    trigger_log: Vec<TriggerRecord>,
}

impl Default for EmotionLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl EmotionLedger {
    /// Ledger over all eight channels at their default starting intensities.
    pub fn new() -> Self {
        Self::with_profiles(default_profiles())
    }

    /// Ledger over an explicit set of channels.
    ///
    /// Triggers for channels outside this set fail with `InvalidChannel`.
    pub fn with_profiles(profiles: impl IntoIterator<Item = (EmotionChannel, ChannelProfile)>) -> Self {
        let mut states: Vec<EmotionState> = Vec::new();
        for (channel, profile) in profiles {
            if states.iter().any(|s| s.channel == channel) {
                continue;
            }
            states.push(EmotionState {
                channel,
                intensity: profile.initial,
                decay_rate: profile.decay_rate,
                last_triggered_at: None,
            });
        }
        states.sort_by_key(|s| s.channel);
        Self {
            states,
            trigger_log: Vec::new(),
        }
    }

    /// Rebuild from a persisted snapshot.
    ///
    /// Out-of-range intensities are clamped and bad decay rates replaced;
    /// channels missing from the snapshot start at their defaults.
    pub fn from_snapshot(snapshot: &EmotionSnapshot) -> Self {
        let mut ledger = Self::new();
        for restored in &snapshot.states {
            if let Some(state) = ledger.state_mut(restored.channel) {
                state.intensity = clamp_unit(restored.intensity);
                state.decay_rate = sanitize_rate(restored.decay_rate);
                state.last_triggered_at = restored.last_triggered_at;
            }
        }
        ledger
    }

    fn state_mut(&mut self, channel: EmotionChannel) -> Option<&mut EmotionState> {
        self.states.iter_mut().find(|s| s.channel == channel)
    }

    /// Add `delta` to a channel, clamp to [0, 1], and log the trigger.
    ///
    /// Returns the resulting intensity. A NaN delta is treated as zero.
    pub fn apply_trigger(
        &mut self,
        channel: EmotionChannel,
        delta: f32,
        source: TriggerSource,
        at: DateTime<Utc>,
    ) -> Result<f32, AnimaError> {
        let state = self
            .state_mut(channel)
            .ok_or_else(|| AnimaError::InvalidChannel(channel.to_string()))?;

        let applied = if delta.is_nan() { 0.0 } else { delta };
        state.intensity = clamp_unit(state.intensity + applied);
        state.last_triggered_at = Some(at);
        let resulting = state.intensity;

        tracing::debug!(
            "Trigger {} {:+.2} -> {:.2} ({:?})",
            channel,
            applied,
            resulting,
            source
        );
        self.trigger_log.push(TriggerRecord {
            channel,
            delta,
            resulting,
            source,
            at,
        });
        Ok(resulting)
    }

    /// Apply every delta of a named event.
    pub fn apply_event(&mut self, event: AffectEvent, at: DateTime<Utc>) -> Result<(), AnimaError> {
        for &(channel, delta) in event.deltas() {
            self.apply_trigger(channel, delta, TriggerSource::Event(event), at)?;
        }
        Ok(())
    }

    /// Apply the emotions that accompany entering `stage`.
    pub fn apply_stage_entry(&mut self, stage: MemoryStage, at: DateTime<Utc>) -> Result<(), AnimaError> {
        for &(channel, delta) in stage_entry_deltas(stage) {
            self.apply_trigger(channel, delta, TriggerSource::StageEntry(stage), at)?;
        }
        Ok(())
    }

    /// Drain every channel by `decay_rate * elapsed`, floored at 0.
    pub fn tick_decay(&mut self, elapsed: Duration) {
        let secs = elapsed.as_secs_f32();
        if secs <= 0.0 {
            return;
        }
        for state in &mut self.states {
            state.intensity = (state.intensity - state.decay_rate * secs).max(0.0);
        }
    }

    /// Strongest channel; ties broken by salience; calm when everything is at rest.
    pub fn dominant_emotion(&self) -> EmotionChannel {
        dominant_of(&self.states)
    }

    pub fn intensity(&self, channel: EmotionChannel) -> Option<f32> {
        self.states
            .iter()
            .find(|s| s.channel == channel)
            .map(|s| s.intensity)
    }

    pub fn decay_rate(&self, channel: EmotionChannel) -> Option<f32> {
        self.states
            .iter()
            .find(|s| s.channel == channel)
            .map(|s| s.decay_rate)
    }

    pub fn snapshot(&self) -> EmotionSnapshot {
        EmotionSnapshot {
            states: self.states.clone(),
            taken_at: Utc::now(),
        }
    }

    pub fn trigger_log(&self) -> &[TriggerRecord] {
        &self.trigger_log
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}
