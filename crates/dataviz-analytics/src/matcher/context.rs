//! Dataset facts the matcher's answer templates draw from.

use super::Question;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::profiler::ColumnProfiler;
use crate::summary::summarize_with;
use crate::types::{DatasetProfile, DatasetSummary, NumericSummary};
use polars::prelude::*;

/// Snapshot of a dataset built once per question.
#[derive(Debug, Clone)]
pub struct AnswerContext {
    pub summary: DatasetSummary,
    /// Quantitative columns with computed statistics, in column order.
    pub numeric: Vec<(String, NumericSummary)>,
}

impl AnswerContext {
    pub fn new(summary: DatasetSummary, profile: &DatasetProfile) -> Self {
        let numeric = profile
            .computed_numeric()
            .map(|(name, stats)| (name.to_string(), stats.clone()))
            .collect();
        Self { summary, numeric }
    }

    /// Build the context straight from a dataset.
    pub fn from_dataset(df: &DataFrame, config: &AnalysisConfig) -> Result<Self> {
        let summary = summarize_with(df, config)?;
        let profile = ColumnProfiler::new(config).profile(df)?;
        Ok(Self::new(summary, &profile))
    }

    pub fn rows(&self) -> usize {
        self.summary.rows
    }

    pub fn columns(&self) -> usize {
        self.summary.columns
    }

    /// Column with the most missing values; ties go to the earlier column.
    pub fn most_missing(&self) -> Option<(&str, usize)> {
        self.summary
            .missing_by_column
            .iter()
            .filter(|c| c.missing > 0)
            .fold(None, |best: Option<(&str, usize)>, c| match best {
                Some((_, n)) if n >= c.missing => best,
                _ => Some((c.column.as_str(), c.missing)),
            })
    }

    /// The quantitative column the question names, preferring the longest
    /// name when several appear.
    pub fn mentioned_numeric(&self, question: &Question) -> Option<&(String, NumericSummary)> {
        self.numeric
            .iter()
            .filter(|(name, _)| question.mentions(name))
            .fold(None, |best: Option<&(String, NumericSummary)>, candidate| match best {
                Some(current) if current.0.len() >= candidate.0.len() => best,
                _ => Some(candidate),
            })
    }
}
