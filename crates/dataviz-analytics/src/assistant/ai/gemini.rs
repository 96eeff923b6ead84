//! Google Gemini answer provider.
//!
//! Implements [`AnswerProvider`] against the Gemini `generateContent`
//! endpoint (<https://ai.google.dev/>).

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

/// Default Gemini API endpoint.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models/";

/// Default model for short dataset answers.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default temperature for model responses (low for factual answers).
const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Default max tokens for responses.
const DEFAULT_MAX_TOKENS: u32 = 300;

// Gemini API request structures
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

// Gemini API response structures
#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<Part>>,
}

impl GeminiResponse {
    /// Text of the first candidate, unless it was blocked by safety filters.
    fn into_text(self) -> Option<String> {
        let candidate = self.candidates?.into_iter().next()?;
        if let Some(reason) = &candidate.finish_reason
            && (reason == "SAFETY" || reason == "BLOCKED")
        {
            return None;
        }
        let part = candidate.content?.parts?.into_iter().next()?;
        Some(part.text)
    }
}

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// The model to use (e.g., "gemini-2.5-flash", "gemini-flash-lite-latest").
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

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeouts_secs: DEFAULT_TIMEOUTS_SECS.to_vec(),
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

impl GeminiConfig {
    /// Create a new configuration builder.
    pub fn builder() -> GeminiConfigBuilder {
        GeminiConfigBuilder::default()
    }
}

/// Builder for [`GeminiConfig`].
#[derive(Default)]
pub struct GeminiConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeouts_secs: Option<Vec<u64>>,
    base_url: Option<String>,
}

impl GeminiConfigBuilder {
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
    pub fn build(self) -> GeminiConfig {
        GeminiConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeouts_secs: self
                .timeouts_secs
                .unwrap_or_else(|| DEFAULT_TIMEOUTS_SECS.to_vec()),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        }
    }
}

/// Google Gemini provider for free-form dataset questions.
///
/// # Example
///
/// ```rust,ignore
/// use dataviz_analytics::assistant::ai::{GeminiConfig, GeminiProvider};
///
/// // Simple usage with defaults
/// let provider = GeminiProvider::new("your-api-key")?;
///
/// // With custom configuration
/// let config = GeminiConfig::builder()
///     .model("gemini-flash-lite-latest")
///     .timeouts_secs(vec![10, 20])
///     .build();
/// let provider = GeminiProvider::with_config("your-api-key", config)?;
/// ```
pub struct GeminiProvider {
    api_key: String,
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, GeminiConfig::default())
    }

    /// Create a new Gemini provider with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_config(api_key: impl Into<String>, config: GeminiConfig) -> Result<Self> {
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
        let request = GeminiRequest {
            contents: vec![Content {
                role: "user".to_owned(),
                parts: vec![Part {
                    text: prompt.to_owned(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
            },
        };

        // Build URL: {base_url}{model}:generateContent?key={api_key}
        let url = format!(
            "{}{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.api_key
        );

        let result: GeminiResponse = with_retries("Gemini", &self.config.timeouts_secs, |timeout| {
            let response = match self
                .client
                .post(&url)
                .timeout(timeout)
                .header("Content-Type", "application/json")
                .json(&request)
                .send()
            {
                Ok(response) => response,
                Err(err) => return classify_send_error(err),
            };

            let status = response.status();
            if is_retryable_status(status) {
                return Ok(Attempt::Retry(format!("Gemini API returned {}", status)));
            }
            if !status.is_success() {
                return Err(anyhow!("Gemini API error {}: {}", status, response.text()?));
            }
            Ok(Attempt::Done(response.json()?))
        })?;

        result
            .into_text()
            .ok_or_else(|| anyhow!("No response content from Gemini API"))
    }
}

impl AnswerProvider for GeminiProvider {
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
        "Gemini"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.config.model)
    }
}

// ============================================================================
// Tests
// ============================================================================
