//! Provider trait for the external answer service.
//!
//! [`AnswerProvider`] is the seam between the chat assistant and a hosted
//! text-generation service. The assistant calls it only for questions the
//! rule cascade could not classify, and recovers from every failure by
//! falling back to the local insight.
//!
//! # Implementing a New Provider
//!
//! 1. Create a new file in `src/assistant/ai/` (e.g., `ollama.rs`)
//! 2. Implement [`AnswerProvider`] for your provider struct
//! 3. Export the provider in `src/assistant/ai/mod.rs`

use crate::config::AnalysisConfig;
use anyhow::Result;
use polars::prelude::DataFrame;

/// A hosted service that can answer free-form questions about a dataset.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one provider can serve
/// several sessions.
///
/// # Error Handling
///
/// Return any failure as an `anyhow` error. The assistant logs it at warn
/// level and answers locally instead, so errors never reach the user.
pub trait AnswerProvider: Send + Sync {
    /// Answer `question`.
    ///
    /// `context` is the compact dataset block rendered by
    /// [`render_context_block`](super::render_context_block). `dataset` is
    /// the working data and `config` the assistant's settings, for providers
    /// that build a richer prompt.
    fn generate(
        &self,
        question: &str,
        context: &str,
        dataset: &DataFrame,
        config: &AnalysisConfig,
    ) -> Result<String>;

    /// Provider name for logging and reply attribution.
    fn name(&self) -> &str;

    /// Model used by this provider, if it has one.
    fn model(&self) -> Option<&str> {
        None
    }
}
