//! Reference [`AnswerProvider`](super::AnswerProvider) implementations.
//!
//! Both providers use a blocking `reqwest` client and the same retry
//! schedule: one attempt per entry of `timeouts_secs` (15 s then 25 s by
//! default). Only a timeout or an HTTP 503 (model still loading) moves on
//! to the next attempt; anything else fails immediately.
//!
//! - [`GeminiProvider`] - Google Gemini API
//! - [`OpenRouterProvider`] - OpenRouter chat completions API
//!
//! # Example
//!
//! ```rust,ignore
//! use dataviz_analytics::assistant::{ChatAssistant, ai::GeminiProvider};
//!
//! let provider = GeminiProvider::new(std::env::var("GOOGLE_API_KEY")?)?;
//! let assistant = ChatAssistant::builder().provider(Box::new(provider)).build();
//! ```

mod gemini;
mod openrouter;

pub use gemini::{GeminiConfig, GeminiConfigBuilder, GeminiProvider};
pub use openrouter::{OpenRouterConfig, OpenRouterConfigBuilder, OpenRouterProvider};

use super::render_advanced_context;
use crate::config::AnalysisConfig;
use anyhow::{Result, anyhow};
use polars::prelude::DataFrame;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-attempt timeouts, in seconds.
pub(crate) const DEFAULT_TIMEOUTS_SECS: [u64; 2] = [15, 25];

/// Outcome of one request attempt.
pub(crate) enum Attempt<T> {
    Done(T),
    /// Worth retrying with the next timeout.
    Retry(String),
}

/// Classify a send error: timeouts are retried, everything else fails.
pub(crate) fn classify_send_error<T>(err: reqwest::Error) -> Result<Attempt<T>> {
    if err.is_timeout() {
        Ok(Attempt::Retry(format!("request timed out: {}", err)))
    } else {
        Err(err.into())
    }
}

/// Statuses worth another attempt (the model is still loading).
pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::SERVICE_UNAVAILABLE
}

/// Run `attempt` once per timeout until it succeeds or fails for good.
pub(crate) fn with_retries<T>(
    provider: &str,
    timeouts_secs: &[u64],
    mut attempt: impl FnMut(Duration) -> Result<Attempt<T>>,
) -> Result<T> {
    let mut last_reason = String::from("no attempt made");
    for (index, secs) in timeouts_secs.iter().enumerate() {
        debug!(provider, attempt = index + 1, timeout_secs = secs, "calling answer service");
        match attempt(Duration::from_secs(*secs))? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Retry(reason) => {
                warn!(provider, attempt = index + 1, %reason, "answer service attempt failed");
                last_reason = reason;
            }
        }
    }
    Err(anyhow!(
        "{} gave up after {} attempts: {}",
        provider,
        timeouts_secs.len(),
        last_reason
    ))
}

/// Brief-answer prompt built from the dataset.
///
/// Uses the advanced context, rendered with `config`, when it can be
/// rendered and the compact `context` block otherwise.
pub(crate) fn build_prompt(
    question: &str,
    context: &str,
    dataset: &DataFrame,
    config: &AnalysisConfig,
) -> String {
    let data_context = if dataset.height() == 0 {
        context.to_string()
    } else {
        render_advanced_context(dataset, config)
            .unwrap_or_else(|_| context.to_string())
    };

    format!(
        "Answer EXTREMELY BRIEFLY, in one or two sentences at most.\n\
         No explanations, no details, no advice.\n\
         Just the direct answer to the question.\n\n\
         {}\n\n\
         Question: {}\n\n\
         Ultra-short answer (1-2 sentences MAX):",
        data_context, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_with_retries_returns_first_success() {
        let mut calls = Vec::new();
        let result = with_retries("test", &[15, 25], |timeout| {
            calls.push(timeout.as_secs());
            Ok(Attempt::Done("ok"))
        });
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls, vec![15]);
    }

    #[test]
    fn test_with_retries_retries_with_longer_timeout() {
        let mut calls = Vec::new();
        let result = with_retries("test", &[15, 25], |timeout| {
            calls.push(timeout.as_secs());
            if timeout.as_secs() == 15 {
                Ok(Attempt::Retry("503".to_string()))
            } else {
                Ok(Attempt::Done(42))
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, vec![15, 25]);
    }

    #[test]
    fn test_with_retries_gives_up() {
        let result: Result<()> =
            with_retries("test", &[15, 25], |_| Ok(Attempt::Retry("timeout".to_string())));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("gave up after 2 attempts"));
        assert!(message.contains("timeout"));
    }

    #[test]
    fn test_with_retries_stops_on_hard_error() {
        let mut calls = 0;
        let result: Result<()> = with_retries("test", &[15, 25], |_| {
            calls += 1;
            Err(anyhow!("401 unauthorized"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_only_503_is_retryable() {
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_build_prompt_uses_dataset() {
        let df = df!["price" => [1.0, 2.0, 3.0]].unwrap();
        let prompt = build_prompt(
            "what is the max?",
            "fallback block",
            &df,
            &AnalysisConfig::default(),
        );
        assert!(prompt.contains("Question: what is the max?"));
        assert!(prompt.contains("DESCRIPTIVE STATISTICS"));
        assert!(!prompt.contains("fallback block"));
    }

    #[test]
    fn test_build_prompt_empty_dataset_uses_block() {
        let prompt = build_prompt(
            "hi",
            "fallback block",
            &DataFrame::empty(),
            &AnalysisConfig::default(),
        );
        assert!(prompt.contains("fallback block"));
    }

    #[test]
    fn test_build_prompt_follows_config() {
        let df = df!["x" => ["1", "2", "3", "n/a"]].unwrap();

        let prompt = build_prompt("hi", "fallback block", &df, &AnalysisConfig::default());
        assert!(!prompt.contains("CATEGORICAL COLUMNS"));

        let strict = AnalysisConfig::builder()
            .mixed_numeric_ratio(0.9)
            .build()
            .unwrap();
        let prompt = build_prompt("hi", "fallback block", &df, &strict);
        assert!(prompt.contains("x: 4 unique categories"));
    }
}
