//! Chat assistant: rule cascade first, then an external provider, then a
//! local insight.
//!
//! The provider trait is always available for custom implementations. The
//! reference providers in [`ai`] require the `ai` feature flag (enabled by
//! default).
//!
//! ```toml
//! # Disable the HTTP providers for a smaller binary
//! dataviz-analytics = { version = "0.1", default-features = false }
//! ```

mod context;
mod insight;
mod provider;

#[cfg(feature = "ai")]
pub mod ai;

pub use context::{render_advanced_context, render_context_block};
pub use insight::generate_local_insight;
pub use provider::AnswerProvider;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::matcher::{AnswerContext, Intent, QuestionMatcher};
use polars::prelude::DataFrame;
use serde::Serialize;
use static_assertions::assert_impl_all;
use tracing::{debug, warn};

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum AnswerSource {
    /// Templated answer from the rule cascade.
    Matcher(Intent),
    /// Text from the named external provider.
    External(String),
    /// Deterministic insight computed from the dataset.
    LocalInsight,
}

/// Answer to one chat question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub text: String,
    pub source: AnswerSource,
}

/// Answers free-text questions about a dataset.
///
/// Asking never mutates the dataset and always produces text.
pub struct ChatAssistant {
    matcher: QuestionMatcher,
    provider: Option<Box<dyn AnswerProvider>>,
    config: AnalysisConfig,
}

assert_impl_all!(ChatAssistant: Send, Sync);
assert_impl_all!(ChatReply: Send, Sync);

impl Default for ChatAssistant {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ChatAssistant {
    pub fn builder() -> ChatAssistantBuilder {
        ChatAssistantBuilder::default()
    }

    /// Name of the configured external provider, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().map(|p| p.name())
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Answer `question` about `df`.
    pub fn ask(&self, question: &str, df: &DataFrame) -> ChatReply {
        let context = match AnswerContext::from_dataset(df, &self.config) {
            Ok(context) => context,
            Err(err) => {
                warn!(error = %err, "could not build answer context");
                return self.local_reply(question, df);
            }
        };

        match self.matcher.answer(question, &context) {
            Ok(matched) => {
                return ChatReply {
                    text: matched.text,
                    source: AnswerSource::Matcher(matched.intent),
                };
            }
            Err(unrecognized) => debug!(%unrecognized, "falling back"),
        }

        if let Some(provider) = &self.provider {
            let block = render_context_block(&context.summary);
            match provider.generate(question, &block, df, &self.config) {
                Ok(text) if !text.trim().is_empty() => {
                    return ChatReply {
                        text,
                        source: AnswerSource::External(provider.name().to_string()),
                    };
                }
                Ok(_) => warn!(provider = provider.name(), "provider returned blank text"),
                Err(err) => {
                    let err = AnalysisError::ExternalUnavailable(format!("{}: {:#}", provider.name(), err));
                    warn!(code = err.error_code(), error = %err, "falling back to local insight");
                }
            }
        }

        self.local_reply(question, df)
    }

    fn local_reply(&self, question: &str, df: &DataFrame) -> ChatReply {
        ChatReply {
            text: generate_local_insight(question, df, &self.config),
            source: AnswerSource::LocalInsight,
        }
    }
}

/// Builder for [`ChatAssistant`].
#[derive(Default)]
pub struct ChatAssistantBuilder {
    config: Option<AnalysisConfig>,
    provider: Option<Box<dyn AnswerProvider>>,
}

impl ChatAssistantBuilder {
    /// Use `config` for matching thresholds and statistics.
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Call `provider` for questions the rule cascade declines.
    pub fn provider(mut self, provider: Box<dyn AnswerProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn build(self) -> ChatAssistant {
        let config = self.config.unwrap_or_default();
        ChatAssistant {
            matcher: QuestionMatcher::new(&config),
            provider: self.provider,
            config,
        }
    }
}
