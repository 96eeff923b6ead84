//! OpenRouter answer provider.
//!
//! Implements [`AnswerProvider`] for the OpenRouter chat completions API
//! (<https://openrouter.ai/>), which fronts many hosted models behind one
//! endpoint.

use super::{
    Attempt, DEFAULT_TIMEOUTS_SECS, build_prompt, classify_send_error, is_retryable_status,
    with_retries,
};
use crate::assistant::AnswerProvider;
use crate::config::AnalysisConfig;
use anyhow::{Result, anyhow};
use polars::prelude::DataFrame;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// Default OpenRouter API endpoint.
const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model for short dataset answers.
const DEFAULT_MODEL: &str = "deepseek/deepseek-chat";

/// Default temperature for model responses.
const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Default max tokens for responses.
const DEFAULT_MAX_TOKENS: u32 = 300;

#[derive(Debug, Serialize)]
struct OpenRouterRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

impl OpenRouterResponse {
    fn into_text(self) -> Option<String> {
        self.choices?
            .into_iter()
            .next()?
            .message
            .map(|message| message.content)
    }
}

/// Configuration for the OpenRouter provider.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// The model to use (e.g., "deepseek/deepseek-chat", "openai/gpt-4o-mini").
    pub model: String,
    /// Temperature for response generation (0.0 - 2.0).
    pub temperature: f32,
    /// Maximum tokens in the response.
    pub max_tokens: u32,
    /// Per-attempt request timeouts in seconds.
    pub timeouts_secs: Vec<u64>,
    /// Base URL for the API (useful for proxies or custom endpoints).
    pub base_url: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeouts_secs: DEFAULT_TIMEOUTS_SECS.to_vec(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl OpenRouterConfig {
    /// Create a new configuration builder.
    pub fn builder() -> OpenRouterConfigBuilder {
        OpenRouterConfigBuilder::default()
    }
}

/// Builder for [`OpenRouterConfig`].
#[derive(Default)]
pub struct OpenRouterConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeouts_secs: Option<Vec<u64>>,
    base_url: Option<String>,
}

impl OpenRouterConfigBuilder {
    /// Set the model to use.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature (0.0 - 2.0).
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the per-attempt timeout schedule in seconds.
    pub fn timeouts_secs(mut self, timeouts: Vec<u64>) -> Self {
        self.timeouts_secs = Some(timeouts);
        self
    }

    /// Set a custom base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenRouterConfig {
        OpenRouterConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeouts_secs: self
                .timeouts_secs
                .unwrap_or_else(|| DEFAULT_TIMEOUTS_SECS.to_vec()),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// OpenRouter provider for free-form dataset questions.
pub struct OpenRouterProvider {
    api_key: String,
    config: OpenRouterConfig,
    client: Client,
}

impl OpenRouterProvider {
    /// Create a new OpenRouter provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, OpenRouterConfig::default())
    }

    /// Create a new OpenRouter provider with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: OpenRouterConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            api_key: api_key.into(),
            config,
            client,
        })
    }

    fn call_api(&self, prompt: &str) -> Result<String> {
        let request = OpenRouterRequest {
            model: self.config.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let result: OpenRouterResponse =
            with_retries("OpenRouter", &self.config.timeouts_secs, |timeout| {
                let response = match self
                    .client
                    .post(&self.config.base_url)
                    .timeout(timeout)
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .header("Content-Type", "application/json")
                    .header("X-Title", "dataviz-analytics")
                    .json(&request)
                    .send()
                {
                    Ok(response) => response,
                    Err(err) => return classify_send_error(err),
                };

                let status = response.status();
                if is_retryable_status(status) {
                    return Ok(Attempt::Retry(format!("OpenRouter API returned {}", status)));
                }
                if !status.is_success() {
                    return Err(anyhow!(
                        "OpenRouter API Error {}: {}",
                        status,
                        response.text()?
                    ));
                }
                Ok(Attempt::Done(response.json()?))
            })?;

        result
            .into_text()
            .ok_or_else(|| anyhow!("No response content from OpenRouter API"))
    }
}

impl AnswerProvider for OpenRouterProvider {
    fn generate(
        &self,
        question: &str,
        context: &str,
        dataset: &DataFrame,
        config: &AnalysisConfig,
    ) -> Result<String> {
        let prompt = build_prompt(question, context, dataset, config);
        Ok(self.call_api(&prompt)?.trim().to_string())
    }

    fn name(&self) -> &str {
        "OpenRouter"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.config.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_response_structure() {
        let json = r#"{
            "choices": [{
                "message": {"role": "assistant", "content": "Yes, prices rise."}
            }]
        }"#;
        let response: OpenRouterResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_text().as_deref(), Some("Yes, prices rise."));
    }

    #[test]
    fn test_parse_response_with_empty_choices() {
        let response: OpenRouterResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(response.into_text().is_none());
    }

    #[test]
    fn test_parse_response_missing_message() {
        let response: OpenRouterResponse =
            serde_json::from_str(r#"{"choices": [{"message": null}]}"#).unwrap();
        assert!(response.into_text().is_none());
    }

    #[test]
    fn test_parse_malformed_json() {
        assert!(serde_json::from_str::<OpenRouterResponse>("not json").is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = OpenRouterConfig::builder()
            .model("openai/gpt-4o-mini")
            .max_tokens(50)
            .build();
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.max_tokens, 50);
        assert_eq!(config.timeouts_secs, vec![15, 25]);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_provider_identity() {
        let provider = OpenRouterProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "OpenRouter");
        assert_eq!(provider.model(), Some(DEFAULT_MODEL));
    }
}
