//! Error types for profiling, cleaning and question answering.
//!
//! Errors are serializable so they can be forwarded to a frontend as a
//! `{ code, message }` pair. Data-quality findings (contaminated or empty
//! columns) are never errors; they are reported as data on the profile.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for analysis operations.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// An unknown imputation method was requested.
    #[error("Invalid fill method '{0}' (expected mean, median or forward-fill)")]
    InvalidMethod(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// The column is qualitative or could not be converted to numbers.
    #[error("Column '{0}' is not quantitative")]
    NotQuantitative(String),

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The loader could not read the given file format.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The external answer service could not be reached or returned garbage.
    #[error("External answer service unavailable: {0}")]
    ExternalUnavailable(String),

    /// Report rendering or writing failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error (only with "ai" feature).
    #[cfg(feature = "ai")]
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidMethod(_) => "INVALID_METHOD",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NotQuantitative(_) => "NOT_QUANTITATIVE",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::ExternalUnavailable(_) => "EXTERNAL_UNAVAILABLE",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            #[cfg(feature = "ai")]
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Invalid-argument errors reject a single call and leave the session usable.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Self::InvalidMethod(_)
            | Self::ColumnNotFound(_)
            | Self::NotQuantitative(_)
            | Self::NoValidValues(_)
            | Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_invalid_argument(),
            _ => false,
        }
    }

    /// Check if this error is recoverable (i.e., not a fundamental failure).
    ///
    /// The external answer service being down is recovered by the local
    /// insight path, so it counts as recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ExternalUnavailable(_) => true,
            #[cfg(feature = "ai")]
            Self::HttpRequest(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            other => other.is_invalid_argument(),
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            AnalysisError::InvalidMethod("mode".to_string()).error_code(),
            "INVALID_METHOD"
        );
        assert_eq!(
            AnalysisError::ColumnNotFound("test".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            AnalysisError::UnsupportedFormat("xlsx".to_string()).error_code(),
            "UNSUPPORTED_FORMAT"
        );
    }

    #[test]
    fn test_invalid_argument_classification() {
        assert!(AnalysisError::NotQuantitative("city".to_string()).is_invalid_argument());
        assert!(AnalysisError::NoValidValues("x".to_string()).is_invalid_argument());
        assert!(!AnalysisError::Internal("boom".to_string()).is_invalid_argument());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(AnalysisError::ExternalUnavailable("timeout".to_string()).is_recoverable());
        assert!(AnalysisError::ColumnNotFound("x".to_string()).is_recoverable());
        assert!(!AnalysisError::Internal("error".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let error = AnalysisError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context() {
        let error =
            AnalysisError::NotQuantitative("city".to_string()).with_context("Removing outliers");
        assert!(error.to_string().contains("Removing outliers"));
        assert_eq!(error.error_code(), "NOT_QUANTITATIVE");
        assert!(error.is_invalid_argument());
    }
}
