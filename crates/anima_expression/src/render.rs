//! Turn an approved intent into the words that go out.
//!
//! The generator gets a bounded amount of time. On timeout, error or an empty
//! reply the phrase book answers instead; error text never reaches the user.

use anima_core::{AnimaError, DialogueGenerator, StageAndEmotionContext};
use anima_reasoning::templates;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub used_fallback: bool,
}

#[derive(Clone)]
pub struct Renderer {
    generator: Arc<dyn DialogueGenerator>,
    timeout: Duration,
}

impl Renderer {
    pub fn new(generator: Arc<dyn DialogueGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn render(&self, context: &StageAndEmotionContext) -> Rendered {
        match tokio::time::timeout(self.timeout, self.generator.generate(context)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                return Rendered {
                    text: text.trim().to_string(),
                    used_fallback: false,
                }
            }
            Ok(Ok(_)) => {
                tracing::warn!("{} returned an empty reply, using template", self.generator.name());
            }
            Ok(Err(e)) => {
                tracing::warn!("{} failed: {:#}, using template", self.generator.name(), e);
            }
            Err(_) => {
                let err = AnimaError::GenerationTimeout(self.timeout);
                tracing::warn!("{}: {}, using template", self.generator.name(), err);
            }
        }
        Rendered {
            text: templates::render(
                context.stage,
                context.intent,
                context.dominant,
                &context.situation,
            ),
            used_fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::{EmotionSnapshot, IntentKind, MemoryStage, Persona};
    use anima_reasoning::MockGenerator;

    fn ctx() -> StageAndEmotionContext {
        StageAndEmotionContext::new(
            Persona::default(),
            MemoryStage::Anxious,
            EmotionSnapshot::at_rest(),
            vec![],
            IntentKind::BatteryWarning,
            "battery at 9%",
        )
    }

    #[tokio::test]
    async fn test_generator_output_is_used() {
        let r = Renderer::new(Arc::new(MockGenerator::new()), Duration::from_secs(1));
        let out = r.render(&ctx()).await;
        assert!(!out.used_fallback);
        assert!(out.text.starts_with("(Mock anxious"));
    }

    #[tokio::test]
    async fn test_failure_falls_back_without_leaking_error() {
        let r = Renderer::new(Arc::new(MockGenerator::failing()), Duration::from_secs(1));
        let out = r.render(&ctx()).await;
        assert!(out.used_fallback);
        assert!(!out.text.contains("configured to fail"));
        assert!(out.text.contains("charger"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let slow = MockGenerator::new().with_delay(Duration::from_secs(30));
        let r = Renderer::new(Arc::new(slow), Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        let out = r.render(&ctx()).await;
        assert!(out.used_fallback);
        assert!(started.elapsed() < Duration::from_secs(30));
    }
}
