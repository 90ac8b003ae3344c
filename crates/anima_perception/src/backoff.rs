//! Exponential backoff for unavailable sensors.

use anima_core::config::BackoffConfig;
use std::time::Duration;

/// Delay before re-polling a failing sensor.
///
/// Each consecutive failure multiplies the delay by `factor` until it
/// reaches `ceiling`, where it stays. A success resets it.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    factor: f64,
    ceiling: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(initial: Duration, factor: f64, ceiling: Duration) -> Self {
        let factor = if factor.is_finite() && factor > 1.0 {
            factor
        } else {
            tracing::warn!("Backoff factor {} must exceed 1.0, using 2.0", factor);
            2.0
        };
        let ceiling = ceiling.max(Duration::from_millis(1));
        Self {
            initial: initial.max(Duration::from_millis(1)).min(ceiling),
            factor,
            ceiling,
            failures: 0,
        }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(
            Duration::from_secs_f64(config.initial_secs.max(0.001)),
            config.factor,
            Duration::from_secs_f64(config.ceiling_secs.max(0.001)),
        )
    }

    /// Record a failure and return the delay before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        self.current()
    }

    /// Delay for the current failure count without recording a new one.
    pub fn current(&self) -> Duration {
        if self.failures == 0 {
            return Duration::ZERO;
        }
        let exp = (self.failures - 1).min(64) as i32;
        let secs = self.initial.as_secs_f64() * self.factor.powi(exp);
        if !secs.is_finite() || secs >= self.ceiling.as_secs_f64() {
            self.ceiling
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    pub fn reset(&mut self) {
        if self.failures > 0 {
            tracing::debug!("Backoff reset after {} failures", self.failures);
        }
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }
}
