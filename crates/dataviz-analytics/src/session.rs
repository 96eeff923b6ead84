//! Working state of one analysis.
//!
//! An [`AnalysisSession`] owns the dataset as loaded, the working copy that
//! cleaning actions replace, and the history of applied steps. Read-only
//! operations (profiling, summaries, reports, chat) always look at the
//! working copy.

use crate::assistant::{ChatAssistant, ChatReply};
use crate::cleaner::{
    FillMethod, fill_missing_with, inlier_mask, remove_duplicates, remove_outliers_with,
};
use crate::config::AnalysisConfig;
use crate::error::{Result, ResultExt};
use crate::estimator::estimate_post_cleaning_rows_with;
use crate::loader::load_dataset;
use crate::profiler::ColumnProfiler;
use crate::reporting::AnalysisReport;
use crate::summary::summarize_with;
use crate::types::{ActionType, CleaningEstimate, CleaningStep, DatasetProfile, DatasetSummary};
use crate::utils;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;
use std::path::Path;
use tracing::info;

const DATASET_TARGET: &str = "dataset";

/// A cleaning operation requested on a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "argument", rename_all = "snake_case")]
pub enum CleaningAction {
    RemoveDuplicates,
    FillMissing(FillMethod),
    /// Remove IQR outliers from one column, or from every quantitative
    /// column in turn when `None`.
    RemoveOutliers(Option<String>),
}

/// One dataset under analysis.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    source_name: String,
    original: DataFrame,
    data: DataFrame,
    steps: Vec<CleaningStep>,
    config: AnalysisConfig,
}

assert_impl_all!(AnalysisSession: Send, Sync);

impl AnalysisSession {
    pub fn new(source_name: impl Into<String>, df: DataFrame) -> Self {
        Self::with_config(source_name, df, AnalysisConfig::default())
    }

    pub fn with_config(source_name: impl Into<String>, df: DataFrame, config: AnalysisConfig) -> Self {
        Self {
            source_name: source_name.into(),
            original: df.clone(),
            data: df,
            steps: Vec::new(),
            config,
        }
    }

    /// Load `path` and open a session named after its file name.
    pub fn open(path: impl AsRef<Path>, config: AnalysisConfig) -> Result<Self> {
        let path = path.as_ref();
        let df = load_dataset(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::with_config(name, df, config))
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// The working dataset.
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    /// The dataset as it was loaded.
    pub fn original(&self) -> &DataFrame {
        &self.original
    }

    pub fn steps(&self) -> &[CleaningStep] {
        &self.steps
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Hand the working dataset over, for export.
    pub fn into_data(self) -> DataFrame {
        self.data
    }

    /// Apply `action` to the working dataset and record the step.
    ///
    /// A failed action leaves the session unchanged. An action with nothing
    /// to do is recorded as [`ActionType::NoChange`] with an explanatory
    /// message.
    pub fn apply(&mut self, action: CleaningAction) -> Result<CleaningStep> {
        let rows_before = self.data.height();
        let (data, step) = match action {
            CleaningAction::RemoveDuplicates => self.dedup(rows_before)?,
            CleaningAction::FillMissing(method) => self.fill(method, rows_before)?,
            CleaningAction::RemoveOutliers(Some(column)) => {
                let data = remove_outliers_with(&self.data, &column, &self.config)?;
                let removed = rows_before - data.height();
                let step = CleaningStep::new(
                    ActionType::OutliersRemoved,
                    column.as_str(),
                    format!("removed {} outlier rows from '{}'", removed, column),
                    rows_before,
                    data.height(),
                );
                (Some(data), step)
            }
            CleaningAction::RemoveOutliers(None) => self.remove_all_outliers(rows_before)?,
        };

        if let Some(data) = data {
            self.data = data;
        }
        info!(
            action = step.action_type.display_name(),
            target = %step.target,
            rows_before = step.rows_before,
            rows_after = step.rows_after,
            "{}",
            step.message
        );
        self.steps.push(step.clone());
        Ok(step)
    }

    /// Discard every applied step and return to the loaded dataset.
    pub fn reset(&mut self) {
        self.data = self.original.clone();
        self.steps.clear();
        info!("Session '{}' reset to the loaded dataset", self.source_name);
    }

    fn dedup(&self, rows_before: usize) -> Result<(Option<DataFrame>, CleaningStep)> {
        let (data, removed) = remove_duplicates(&self.data)?;
        if removed == 0 {
            return Ok((None, no_change("no duplicate rows found", rows_before)));
        }
        let step = CleaningStep::new(
            ActionType::DuplicatesRemoved,
            DATASET_TARGET,
            format!("removed {} duplicate rows", removed),
            rows_before,
            data.height(),
        );
        Ok((Some(data), step))
    }

    fn fill(&self, method: FillMethod, rows_before: usize) -> Result<(Option<DataFrame>, CleaningStep)> {
        let missing_before = missing_total(&self.data)?;
        if missing_before == 0 {
            return Ok((None, no_change("no missing values to fill", rows_before)));
        }

        let data = fill_missing_with(&self.data, method, &self.config)?;
        let filled = missing_before - missing_total(&data)?;
        let step = CleaningStep::new(
            ActionType::ValuesImputed,
            DATASET_TARGET,
            format!("filled {} missing values ({})", filled, method),
            rows_before,
            data.height(),
        );
        Ok((Some(data), step))
    }

    fn remove_all_outliers(&self, rows_before: usize) -> Result<(Option<DataFrame>, CleaningStep)> {
        let columns: Vec<String> = self
            .profile()?
            .computed_numeric()
            .filter(|(_, stats)| stats.count > 0)
            .map(|(name, _)| name.to_string())
            .collect();
        if columns.is_empty() {
            return Ok((
                None,
                no_change("no quantitative columns available for outlier removal", rows_before),
            ));
        }

        // Bounds come from the working copy as it stands, one mask per column.
        let mut keep = vec![true; self.data.height()];
        for column in &columns {
            let series = self.data.column(column)?.as_materialized_series();
            let Some((_, mask)) = inlier_mask(series, self.config.iqr_multiplier)
                .context(format!("removing outliers from '{}'", column))?
            else {
                continue;
            };
            for (kept, inside) in keep.iter_mut().zip(mask) {
                *kept &= inside;
            }
        }
        let data = self
            .data
            .filter(&BooleanChunked::from_slice("mask".into(), &keep))?;

        let step = CleaningStep::new(
            ActionType::OutliersRemoved,
            columns.join(", "),
            format!(
                "removed {} outlier rows across {} columns",
                rows_before - data.height(),
                columns.len()
            ),
            rows_before,
            data.height(),
        );
        Ok((Some(data), step))
    }

    pub fn profile(&self) -> Result<DatasetProfile> {
        ColumnProfiler::new(&self.config).profile(&self.data)
    }

    pub fn summary(&self) -> Result<DatasetSummary> {
        summarize_with(&self.data, &self.config)
    }

    pub fn estimate(&self) -> Result<CleaningEstimate> {
        estimate_post_cleaning_rows_with(&self.data, &self.config)
    }

    /// Report on the working dataset, including the cleaning history.
    pub fn report(&self) -> Result<AnalysisReport> {
        Ok(AnalysisReport::build(self.source_name.as_str(), &self.data, &self.config)?
            .with_steps(&self.steps))
    }

    /// Ask `assistant` about the working dataset.
    pub fn ask(&self, assistant: &ChatAssistant, question: &str) -> ChatReply {
        assistant.ask(question, &self.data)
    }
}

fn no_change(message: &str, rows: usize) -> CleaningStep {
    CleaningStep::new(ActionType::NoChange, DATASET_TARGET, message, rows, rows)
}

fn missing_total(df: &DataFrame) -> Result<usize> {
    let mut total = 0;
    for column in df.get_columns() {
        total += utils::missing_count(column.as_materialized_series())?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::AnswerSource;
    use crate::error::AnalysisError;
    use crate::matcher::Intent;
    use pretty_assertions::assert_eq;

    fn session() -> AnalysisSession {
        let df = df![
            "prix" => [Some(10.0), Some(12.0), Some(11.0), Some(13.0), Some(1000.0), Some(10.0), None],
            "ville" => [Some("Paris"), Some("Lyon"), Some("Nice"), Some("Lille"), Some("Metz"), Some("Paris"), None],
        ]
        .unwrap();
        AnalysisSession::new("ventes.csv", df)
    }

    // ==================== duplicate tests ====================

    #[test]
    fn test_remove_duplicates_step() {
        let mut session = session();
        let step = session.apply(CleaningAction::RemoveDuplicates).unwrap();
        assert_eq!(step.action_type, ActionType::DuplicatesRemoved);
        assert_eq!(step.rows_removed(), 1);
        assert_eq!(session.data().height(), 6);

        let again = session.apply(CleaningAction::RemoveDuplicates).unwrap();
        assert_eq!(again.action_type, ActionType::NoChange);
        assert_eq!(again.message, "no duplicate rows found");
        assert_eq!(session.steps().len(), 2);
    }

    // ==================== fill tests ====================

    #[test]
    fn test_fill_missing_step() {
        let mut session = session();
        let step = session
            .apply(CleaningAction::FillMissing(FillMethod::Median))
            .unwrap();
        assert_eq!(step.action_type, ActionType::ValuesImputed);
        assert_eq!(step.message, "filled 2 missing values (median)");
        assert_eq!(session.summary().unwrap().missing_total, 0);

        let again = session
            .apply(CleaningAction::FillMissing(FillMethod::Mean))
            .unwrap();
        assert_eq!(again.action_type, ActionType::NoChange);
    }

    // ==================== outlier tests ====================

    #[test]
    fn test_remove_outliers_from_column() {
        let mut session = session();
        let step = session
            .apply(CleaningAction::RemoveOutliers(Some("prix".to_string())))
            .unwrap();
        assert_eq!(step.target, "prix");
        // The 1000 row and the row missing a price are dropped.
        assert_eq!(step.rows_after, 5);
    }

    #[test]
    fn test_remove_outliers_from_all_columns() {
        let mut session = session();
        let step = session.apply(CleaningAction::RemoveOutliers(None)).unwrap();
        assert_eq!(step.action_type, ActionType::OutliersRemoved);
        assert_eq!(step.target, "prix");
        assert_eq!(session.data().height(), 5);
    }

    #[test]
    fn test_remove_outliers_bounds_use_unfiltered_columns() {
        let df = df![
            "a" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), None],
            "b" => [None, None, None, None, Some(5.0)],
        ]
        .unwrap();
        let mut session = AnalysisSession::new("v.csv", df);

        let step = session.apply(CleaningAction::RemoveOutliers(None)).unwrap();
        assert_eq!(step.action_type, ActionType::OutliersRemoved);
        assert_eq!(step.target, "a, b");
        assert_eq!(step.rows_before, 5);
        // Every row is missing a value in one of the two columns.
        assert_eq!(session.data().height(), 0);
    }

    #[test]
    fn test_remove_outliers_across_two_columns() {
        let df = df![
            "x" => [10.0, 12.0, 11.0, 13.0, 1000.0, 12.0],
            "y" => [5.0, -900.0, 6.0, 5.5, 6.5, 6.0],
        ]
        .unwrap();
        let mut session = AnalysisSession::new("v.csv", df);

        let step = session.apply(CleaningAction::RemoveOutliers(None)).unwrap();
        assert_eq!(step.rows_removed(), 2);
        assert_eq!(step.message, "removed 2 outlier rows across 2 columns");
    }

    #[test]
    fn test_remove_outliers_without_quantitative_columns() {
        let mut session = AnalysisSession::new("v.csv", df!["ville" => ["Paris", "Lyon"]].unwrap());
        let step = session.apply(CleaningAction::RemoveOutliers(None)).unwrap();
        assert_eq!(step.action_type, ActionType::NoChange);
        assert_eq!(
            step.message,
            "no quantitative columns available for outlier removal"
        );
    }

    #[test]
    fn test_failed_action_leaves_session_unchanged() {
        let mut session = session();
        let err = session
            .apply(CleaningAction::RemoveOutliers(Some("ville".to_string())))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NotQuantitative(_)));
        assert!(session.steps().is_empty());
        assert_eq!(session.data().height(), 7);
    }

    // ==================== session tests ====================

    #[test]
    fn test_reset_restores_loaded_dataset() {
        let mut session = session();
        session.apply(CleaningAction::RemoveDuplicates).unwrap();
        session.reset();
        assert_eq!(session.data().height(), 7);
        assert!(session.steps().is_empty());
        assert_eq!(session.original().height(), 7);
    }

    #[test]
    fn test_report_includes_steps() {
        let mut session = session();
        session.apply(CleaningAction::RemoveDuplicates).unwrap();
        let report = session.report().unwrap();
        assert_eq!(report.source_name, "ventes.csv");
        assert_eq!(report.summary.rows, 6);
        assert_eq!(report.cleaning_steps.len(), 1);
    }

    #[test]
    fn test_ask_does_not_mutate() {
        let session = session();
        let reply = session.ask(&ChatAssistant::default(), "combien de lignes ?");
        assert_eq!(reply.source, AnswerSource::Matcher(Intent::RowCount));
        assert!(reply.text.contains('7'));
        assert_eq!(session.data().height(), 7);
    }

    #[test]
    fn test_estimate_uses_working_data() {
        let estimate = session().estimate().unwrap();
        assert_eq!(estimate.original, 7);
        assert_eq!(estimate.duplicates, 1);
    }

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_string(&CleaningAction::FillMissing(FillMethod::ForwardFill)).unwrap();
        assert_eq!(json, r#"{"action":"fill_missing","argument":"forward-fill"}"#);
    }
}
