//! Dialogue generation behind `anima_core::DialogueGenerator`.
//!
//! The engine never depends on a model being reachable: the template
//! phrase book doubles as the fallback for every other provider.

pub mod prompts;
pub mod providers;
pub mod templates;

pub use providers::mock::MockGenerator;
pub use providers::ollama::OllamaGenerator;
pub use templates::TemplateGenerator;

use anima_core::config::LlmConfig;
use anima_core::DialogueGenerator;
use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;

/// Build the configured provider. `timeout` bounds each HTTP request.
pub fn build_generator(config: &LlmConfig, timeout: Duration) -> Result<Arc<dyn DialogueGenerator>> {
    let generator: Arc<dyn DialogueGenerator> = match config.provider.to_ascii_lowercase().as_str() {
        "template" => Arc::new(TemplateGenerator::new()),
        "mock" => Arc::new(MockGenerator::new()),
        "ollama" => Arc::new(OllamaGenerator::new(&config.base_url, &config.model, timeout)?),
        other => bail!("Unknown LLM provider: {}", other),
    };
    tracing::info!("Dialogue provider: {}", generator.name());
    Ok(generator)
}
