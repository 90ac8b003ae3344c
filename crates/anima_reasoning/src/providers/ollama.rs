//! Ollama provider using the native `/api/generate` endpoint, non-streaming.

use crate::prompts::{build_prompt, clean_reply};
use anima_core::{DialogueGenerator, StageAndEmotionContext};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl DialogueGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, context: &StageAndEmotionContext) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "prompt": build_prompt(context),
            "stream": false,
        });
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let err_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama error {}: {}", status, err_text);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Unexpected Ollama response body")?;
        clean_reply(&body.response).context("Ollama returned an empty reply")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::{EmotionSnapshot, IntentKind, MemoryStage, Persona};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ctx() -> StageAndEmotionContext {
        StageAndEmotionContext::new(
            Persona::default(),
            MemoryStage::Relaxed,
            EmotionSnapshot::at_rest(),
            vec![],
            IntentKind::MealReminder,
            "it is lunch time",
        )
    }

    #[tokio::test]
    async fn test_generate_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({"model": "qwen2.5:7b", "stream": false})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"response": " \"Lunch time!\" "})),
            )
            .mount(&server)
            .await;

        let gen = OllamaGenerator::new(&server.uri(), "qwen2.5:7b", Duration::from_secs(5)).unwrap();
        assert_eq!(gen.generate(&ctx()).await.unwrap(), "Lunch time!");
    }

    #[tokio::test]
    async fn test_generate_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let gen = OllamaGenerator::new(&server.uri(), "m", Duration::from_secs(5)).unwrap();
        let err = gen.generate(&ctx()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_generate_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "   "})))
            .mount(&server)
            .await;

        let gen = OllamaGenerator::new(&server.uri(), "m", Duration::from_secs(5)).unwrap();
        assert!(gen.generate(&ctx()).await.is_err());
    }
}
