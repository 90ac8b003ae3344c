//! Per-channel decay rates and starting intensities.

use anima_core::EmotionChannel;
use serde::{Deserialize, Serialize};

/// Smallest decay rate a channel may carry. Rates must stay strictly positive.
pub(crate) const MIN_DECAY_RATE: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfile {
    /// Intensity lost per second.
    pub decay_rate: f32,
    /// Intensity at session start.
    pub initial: f32,
}

impl ChannelProfile {
    pub fn new(decay_rate: f32, initial: f32) -> Self {
        Self {
            decay_rate: sanitize_rate(decay_rate),
            initial: if initial.is_finite() {
                initial.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }
}

pub(crate) fn sanitize_rate(rate: f32) -> f32 {
    if rate.is_finite() && rate >= MIN_DECAY_RATE {
        rate
    } else {
        tracing::warn!("Invalid decay rate {}, using minimum", rate);
        MIN_DECAY_RATE
    }
}

/// Default profile for a fresh session.
///
/// A newly woken companion starts uneasy: some loneliness and curiosity,
/// a trace of sadness. Surprise and excitement burn off within a minute or
/// two; loneliness takes hours.
pub fn default_profiles() -> Vec<(EmotionChannel, ChannelProfile)> {
    vec![
        (EmotionChannel::Happy, ChannelProfile::new(0.003, 0.1)),
        (EmotionChannel::Curious, ChannelProfile::new(0.004, 0.4)),
        (EmotionChannel::Lonely, ChannelProfile::new(0.0005, 0.5)),
        (EmotionChannel::Excited, ChannelProfile::new(0.01, 0.0)),
        (EmotionChannel::Sad, ChannelProfile::new(0.001, 0.2)),
        (EmotionChannel::Angry, ChannelProfile::new(0.005, 0.0)),
        (EmotionChannel::Surprised, ChannelProfile::new(0.02, 0.2)),
        (EmotionChannel::Calm, ChannelProfile::new(0.002, 0.2)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_profile(channel: EmotionChannel) -> ChannelProfile {
        default_profiles()
            .into_iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, p)| p)
            .unwrap()
    }

    #[test]
    fn test_defaults_cover_all_channels() {
        let profiles = default_profiles();
        for channel in EmotionChannel::ALL {
            assert!(profiles.iter().any(|(c, _)| *c == channel));
        }
    }

    #[test]
    fn test_loneliness_outlasts_surprise() {
        let lonely = default_profile(EmotionChannel::Lonely);
        let surprised = default_profile(EmotionChannel::Surprised);
        assert!(lonely.decay_rate < surprised.decay_rate);
    }

    #[test]
    fn test_new_sanitizes() {
        let p = ChannelProfile::new(-1.0, 3.0);
        assert!(p.decay_rate > 0.0);
        assert_eq!(p.initial, 1.0);

        let p = ChannelProfile::new(f32::NAN, f32::NAN);
        assert!(p.decay_rate > 0.0);
        assert_eq!(p.initial, 0.0);
    }
}
