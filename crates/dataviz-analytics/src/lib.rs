//! Tabular Data Analysis Library
//!
//! Profiling, cleaning and question answering for tabular datasets, built on
//! Polars.
//!
//! # Overview
//!
//! - **Profiling**: every column is classified as quantitative or qualitative
//!   and described with the statistics that apply to its kind
//! - **Summaries**: completeness, duplicates, per-column missing values,
//!   numeric statistics and correlations
//! - **Cleaning**: duplicate removal, missing value filling, IQR outlier removal
//! - **Estimation**: advisory count of the rows a full cleaning pass keeps
//! - **Chat**: a bilingual rule cascade answers common questions, with an
//!   optional hosted model and a local insight as fallbacks
//! - **Reports and export**: text, HTML and JSON reports; CSV export with a
//!   summary sheet
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dataviz_analytics::{AnalysisConfig, AnalysisSession, ChatAssistant, CleaningAction, FillMethod};
//!
//! let mut session = AnalysisSession::open("sales.csv", AnalysisConfig::default())?;
//!
//! let step = session.apply(CleaningAction::RemoveDuplicates)?;
//! println!("{}", step.message);
//! session.apply(CleaningAction::FillMissing(FillMethod::Median))?;
//!
//! let reply = session.ask(&ChatAssistant::default(), "combien de lignes ?");
//! println!("{}", reply.text);
//! ```
//!
//! # Answer providers
//!
//! Questions the rule cascade declines go to an [`AnswerProvider`] when one is
//! configured. With the `ai` feature (on by default) the crate ships
//! [`assistant::ai::GeminiProvider`] and [`assistant::ai::OpenRouterProvider`].

pub mod assistant;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod estimator;
pub mod export;
pub mod loader;
pub mod matcher;
pub mod profiler;
pub mod reporting;
pub mod session;
pub mod summary;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use assistant::{AnswerProvider, AnswerSource, ChatAssistant, ChatReply};
pub use cleaner::{FillMethod, OutlierBounds, fill_missing, remove_duplicates, remove_outliers};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError};
pub use error::{AnalysisError, Result, ResultExt};
pub use estimator::estimate_post_cleaning_rows;
pub use export::{ExportInfo, summary_sheet, to_csv_string, write_export};
pub use loader::{load_csv_bytes, load_dataset};
pub use matcher::{AnswerContext, Intent, MatchedAnswer, QuestionMatcher, Unrecognized, similarity};
pub use profiler::{ColumnProfiler, profile};
pub use reporting::{AnalysisReport, ReportFormat, ReportGenerator};
pub use session::{AnalysisSession, CleaningAction};
pub use summary::{CorrelationMatrix, NumericStatsRow, correlation_matrix, summarize};
pub use types::{
    ActionType, CleaningEstimate, CleaningStep, ColumnKind, ColumnMissing, ColumnProfile,
    DatasetProfile, DatasetSummary, NumericStatistics, NumericSummary, Trend,
};
