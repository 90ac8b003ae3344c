//! Mock generator: deterministic output for tests and offline runs.

use anima_core::{DialogueGenerator, StageAndEmotionContext};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    delay: Duration,
    fail: bool,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before answering, to exercise generation timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Always return an error.
    pub fn failing() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: true,
        }
    }
}

#[async_trait]
impl DialogueGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, context: &StageAndEmotionContext) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            anyhow::bail!("mock generator configured to fail");
        }
        Ok(format!(
            "(Mock {} {} {}) {}",
            context.stage, context.dominant, context.intent, context.situation
        ))
    }
}
