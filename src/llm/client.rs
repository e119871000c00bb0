//! HTTP client for OpenAI-compatible chat completion endpoints

use crate::error::ScreenerError;
use crate::llm::{ChatRequest, ChatResponse, ReasoningClient, TokenUsage};
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Reasoning client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Default model, overridable per request.
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Transport-level timeout; the engine applies its own per-request
    /// deadline on top.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "google/gemini-2.5-flash".to_string(),
            temperature: 0.2,
            max_tokens: 4000,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Chat completions client for OpenRouter (or any OpenAI-compatible API).
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    config: ClientConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl OpenRouterClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ScreenerError::InvalidParameter {
                name: "api_key".to_string(),
                reason: "API key is required".to_string(),
            });
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ReasoningClient for OpenRouterClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let model = request.model.as_deref().unwrap_or(&self.config.model);
        let temperature = request.temperature.unwrap_or(self.config.temperature);
        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);

        let body = serde_json::json!({
            "model": model,
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": request.user_prompt},
            ],
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ScreenerError::Reasoning(format!(
                "status {status}: {text}"
            )));
        }

        let completion: CompletionResponse = response.json().await?;
        let latency = started.elapsed();

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ScreenerError::Reasoning("empty response".to_string()))?;

        Ok(ChatResponse {
            content: choice.message.content,
            model: if completion.model.is_empty() {
                model.to_string()
            } else {
                completion.model
            },
            usage: TokenUsage {
                prompt_tokens: completion.usage.prompt_tokens,
                completion_tokens: completion.usage.completion_tokens,
                total_tokens: completion.usage.total_tokens,
            },
            latency,
        })
    }
}
