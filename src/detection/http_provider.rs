//! HTTP model provider speaking the OpenAI-compatible chat API
//!
//! Sends the task text to a chat-completions endpoint and expects a strict
//! JSON object back. Retries are bounded with exponential backoff and
//! jitter; unbounded retrying belongs nowhere in this pipeline.

use super::models::ProviderContext;
use super::provider::{ModelProvider, ProviderError};
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for one HTTP detection provider
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    pub name: String,
    pub endpoint: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub timeout: Duration,
    pub max_retries: usize,
    pub retry_backoff: Duration,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            name: "primary".to_string(),
            endpoint: "http://localhost:8080/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(5),
            max_retries: 2,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

/// Context-detection client for an OpenAI-compatible endpoint
pub struct HttpModelProvider {
    client: Client,
    config: HttpProviderConfig,
}

impl HttpModelProvider {
    pub fn new(config: HttpProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Api(format!("Failed to build client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn build_prompt(&self, text: &str) -> String {
        format!(
            "Classify the following software task. Respond with a single JSON object \
            with fields: layer (one of 1-presentation, 2-application, 3-domain, \
            4-persistence, 5-infrastructure, or * when unclear), topics (array of \
            domain topic slugs), keywords (array of salient words), technologies \
            (array of technology slugs), confidence (number 0..1). No prose.\n\n\
            Task: {}",
            text
        )
    }

    /// Strip markdown code fences some models wrap around JSON output
    fn extract_json(content: &str) -> &str {
        let trimmed = content.trim();
        let trimmed = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .unwrap_or(trimmed);
        trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
    }

    async fn request_once(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ProviderContext, ProviderError> {
        let mut req = self.client.post(&self.config.endpoint).json(request);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key.expose_secret()));
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.config.timeout.as_millis() as u64)
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("HTTP {}: {}", status, body)));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Invalid completion: {}", e)))?;

        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".to_string()))?;

        let context: ProviderContext = serde_json::from_str(Self::extract_json(content))
            .map_err(|e| ProviderError::MalformedResponse(format!("Invalid context JSON: {}", e)))?;

        Ok(context.normalized())
    }
}

#[async_trait]
impl ModelProvider for HttpModelProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn is_available(&self) -> bool {
        !self.config.endpoint.is_empty()
    }

    async fn detect_context(&self, text: &str) -> Result<ProviderContext, ProviderError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You are a precise task classifier. Output strict JSON only."
                        .to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: self.build_prompt(text),
                },
            ],
            max_tokens: Some(300),
            temperature: Some(0.0),
        };

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self.config.retry_backoff * (1u32 << (attempt as u32 - 1));
                let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..50));
                debug!(
                    "Retry attempt {} for provider '{}' after {:?}",
                    attempt,
                    self.config.name,
                    backoff + jitter
                );
                tokio::time::sleep(backoff + jitter).await;
            }

            match self.request_once(&request).await {
                Ok(context) => {
                    debug!(
                        "Provider '{}' detected layer={} confidence={:.2}",
                        self.config.name, context.layer, context.confidence
                    );
                    return Ok(context);
                }
                Err(e) => {
                    warn!("Provider '{}' attempt {} failed: {}", self.config.name, attempt, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ProviderError::Unavailable))
    }
}

// OpenAI-compatible API types
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
