pub mod error;
pub mod structured;

pub use error::{ModelError, ModelResult};
pub use structured::invoke_structured;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the model service
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("MODEL_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: std::env::var("MODEL_NAME").unwrap_or_else(|_| "gpt-4o".to_string()),
            temperature: 0.0,
            timeout: Duration::from_secs(120),
        }
    }
}

/// The external model service boundary. One call per invocation; retry,
/// rate limiting and backoff are the provider's concern, not ours.
#[async_trait]
pub trait ModelService: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> ModelResult<String>;
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Chat-completions client for any OpenAI-compatible endpoint
#[derive(Clone)]
pub struct OpenAiChatClient {
    client: reqwest::Client,
    config: ModelConfig,
}

impl OpenAiChatClient {
    pub fn new(config: ModelConfig) -> ModelResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> ModelResult<Self> {
        Self::new(ModelConfig::default())
    }
}

#[async_trait]
impl ModelService for OpenAiChatClient {
    async fn complete(&self, system: &str, user: &str) -> ModelResult<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage { role: "system", content: system.to_string() },
                ChatMessage { role: "user", content: user.to_string() },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::ServiceUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        let result = response.json::<ChatResponse>().await?;
        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ModelError::MalformedResponse("completion had no message content".to_string())
            })?;

        tracing::debug!(chars = content.len(), "model completion received");
        Ok(content)
    }
}
