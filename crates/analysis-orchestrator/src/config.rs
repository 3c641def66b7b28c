use anyhow::Result;
use std::env;
use std::time::Duration;

use model_client::ModelConfig;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    // Model service
    pub model_api_base: String,
    pub model_api_key: String,
    pub model_name: String,
    pub model_temperature: f64,
    pub model_timeout_secs: u64,

    // Batch parameters
    pub default_sample_size: usize,
    /// Extraction pipeline concurrency; None = available parallelism
    pub max_concurrency: Option<usize>,
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self> {
        // Best effort; a missing .env file is fine
        dotenvy::dotenv().ok();

        let config = Self {
            model_api_base: env::var("MODEL_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            model_name: env::var("MODEL_NAME").unwrap_or_else(|_| "gpt-4o".to_string()),
            model_temperature: env::var("MODEL_TEMPERATURE")
                .unwrap_or_else(|_| "0.0".to_string())
                .parse()?,
            model_timeout_secs: env::var("MODEL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()?,
            default_sample_size: env::var("SAMPLE_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            max_concurrency: env::var("MAX_CONCURRENCY")
                .ok()
                .map(|v| v.parse())
                .transpose()?,
        };

        Ok(config)
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            base_url: self.model_api_base.clone(),
            api_key: self.model_api_key.clone(),
            model: self.model_name.clone(),
            temperature: self.model_temperature,
            timeout: Duration::from_secs(self.model_timeout_secs),
        }
    }
}
