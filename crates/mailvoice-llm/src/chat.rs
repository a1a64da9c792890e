//! Chat-completions text model
//!
//! Backs the two free-text extraction branches. Speaks the OpenAI-style
//! `/chat/completions` shape with bearer auth, so it works against hosted
//! and self-hosted gateways alike.
//!
//! # Features
//!
//! - Async HTTP with per-request timeout
//! - Retry with exponential backoff on transient failures
//! - Configurable endpoint, model, and system prompt

use crate::LlmError;
use async_trait::async_trait;
use mailvoice_domain::traits::TextModel;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default timeout for a single completion request (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts before giving up
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Chat-completions provider for the text branches
pub struct ChatTextModel {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

impl ChatTextModel {
    /// Create a provider for the given endpoint, API key, and model.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("reqwest client with static configuration");

        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Set the maximum number of attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);

        let request_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: 0.0,
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed: ChatResponse = response.json().await.map_err(|e| {
                            LlmError::InvalidResponse(format!(
                                "failed to parse completion: {}",
                                e
                            ))
                        })?;
                        let content = parsed
                            .choices
                            .into_iter()
                            .next()
                            .map(|c| c.message.content)
                            .ok_or_else(|| {
                                LlmError::InvalidResponse("empty choices".to_string())
                            })?;
                        debug!(reply_len = content.len(), "completion received");
                        return Ok(content);
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(self.model.clone()));
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(LlmError::RateLimitExceeded);
                    } else {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "unknown error".to_string());
                        last_error = Some(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error =
                        Some(LlmError::Communication(format!("request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, ...
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("max retries exceeded".to_string())))
    }
}

#[async_trait]
impl TextModel for ChatTextModel {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.complete(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let model = ChatTextModel::new("http://localhost:8000/v1", "key", "gpt-4o");
        assert_eq!(model.endpoint, "http://localhost:8000/v1");
        assert_eq!(model.model, "gpt-4o");
        assert_eq!(model.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_with_max_retries() {
        let model =
            ChatTextModel::new("http://localhost:8000/v1", "key", "gpt-4o").with_max_retries(5);
        assert_eq!(model.max_retries, 5);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_communication_error() {
        let model = ChatTextModel::new("http://127.0.0.1:1/v1", "key", "gpt-4o")
            .with_max_retries(1);

        let result = model.generate("test").await;
        match result {
            Err(LlmError::Communication(_)) => {}
            other => panic!("expected Communication error, got {:?}", other.err()),
        }
    }
}
