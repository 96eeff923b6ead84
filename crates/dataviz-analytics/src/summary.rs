//! Dataset-level aggregates: shape, completeness, duplicates, type histogram,
//! plus the per-column statistics table and correlation matrix used by
//! reports and chat context.

use crate::cleaner::duplicate_count;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::profiler::{ColumnProfiler, statistics};
use crate::types::{ColumnKind, ColumnMissing, DatasetProfile, DatasetSummary, TypeHistogram};
use crate::utils;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Summarize a dataset with default settings.
pub fn summarize(df: &DataFrame) -> Result<DatasetSummary> {
    summarize_with(df, &AnalysisConfig::default())
}

/// Summarize a dataset.
///
/// Completeness and missing percentages are `None` when the dataset has no
/// cells (zero rows or zero columns).
pub fn summarize_with(df: &DataFrame, config: &AnalysisConfig) -> Result<DatasetSummary> {
    let rows = df.height();
    let columns = df.width();
    let profiler = ColumnProfiler::new(config);

    let mut missing_by_column = Vec::with_capacity(columns);
    let mut type_histogram = TypeHistogram::default();
    let mut dtype_counts = BTreeMap::new();

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let missing = utils::missing_count(series)?;
        missing_by_column.push(ColumnMissing {
            column: series.name().to_string(),
            missing,
            percentage: percentage(missing, rows).unwrap_or(0.0),
        });

        match profiler.column_kind(series)? {
            ColumnKind::Quantitative => type_histogram.quantitative += 1,
            ColumnKind::Qualitative => type_histogram.qualitative += 1,
        }
        *dtype_counts.entry(series.dtype().to_string()).or_insert(0) += 1;
    }

    let missing_total: usize = missing_by_column.iter().map(|c| c.missing).sum();
    let missing_pct = percentage(missing_total, rows * columns);

    Ok(DatasetSummary {
        rows,
        columns,
        column_names: df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        missing_by_column,
        missing_total,
        duplicate_rows: duplicate_count(df)?,
        completeness_pct: missing_pct.map(|pct| 100.0 - pct),
        missing_pct,
        type_histogram,
        dtype_counts,
        memory_usage_mb: df.estimated_size() as f64 / BYTES_PER_MB,
    })
}

fn percentage(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64 * 100.0)
    }
}

// ============================================================================
// Statistics table
// ============================================================================

/// One row of the descriptive statistics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStatsRow {
    pub column: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub q1: Option<f64>,
    pub q3: Option<f64>,
}

/// Descriptive statistics for every computed quantitative column.
pub fn numeric_statistics(profile: &DatasetProfile) -> Vec<NumericStatsRow> {
    profile
        .computed_numeric()
        .map(|(name, s)| NumericStatsRow {
            column: name.to_string(),
            min: s.min,
            max: s.max,
            mean: s.mean,
            median: s.median,
            std: s.std,
            q1: s.q1,
            q3: s.q3,
        })
        .collect()
}

// ============================================================================
// Correlations
// ============================================================================

/// Symmetric Pearson correlation matrix over quantitative columns.
///
/// Entries are `None` when fewer than two complete pairs exist or one side
/// is constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// A pair of columns and their correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub first: String,
    pub second: String,
    pub coefficient: f64,
}

impl CorrelationPair {
    /// Wording for `|r|`: very strong above 0.7, strong above 0.5, moderate
    /// otherwise. Only notable pairs are worded, so there is no "weak".
    pub fn strength(&self) -> &'static str {
        let r = self.coefficient.abs();
        if r > 0.7 {
            "very strong"
        } else if r > 0.5 {
            "strong"
        } else {
            "moderate"
        }
    }

    pub fn direction(&self) -> &'static str {
        if self.coefficient >= 0.0 {
            "positive"
        } else {
            "negative"
        }
    }
}

impl CorrelationMatrix {
    pub fn get(&self, first: &str, second: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == first)?;
        let j = self.columns.iter().position(|c| c == second)?;
        self.values[i][j]
    }

    /// Off-diagonal pairs with `|r| > threshold`, strongest first.
    pub fn notable_pairs(&self, threshold: f64) -> Vec<CorrelationPair> {
        let mut pairs = Vec::new();
        for (i, first) in self.columns.iter().enumerate() {
            for (j, second) in self.columns.iter().enumerate().skip(i + 1) {
                if let Some(r) = self.values[i][j]
                    && r.abs() > threshold
                {
                    pairs.push(CorrelationPair {
                        first: first.clone(),
                        second: second.clone(),
                        coefficient: r,
                    });
                }
            }
        }
        pairs.sort_by(|a, b| b.coefficient.abs().total_cmp(&a.coefficient.abs()));
        pairs
    }
}

/// Correlation matrix over the computed quantitative columns of `profile`.
///
/// Returns `None` when fewer than two such columns exist.
pub fn correlation_matrix(
    df: &DataFrame,
    profile: &DatasetProfile,
) -> Result<Option<CorrelationMatrix>> {
    let columns: Vec<String> = profile
        .computed_numeric()
        .map(|(name, _)| name.to_string())
        .collect();
    if columns.len() < 2 {
        return Ok(None);
    }

    let mut data = Vec::with_capacity(columns.len());
    for name in &columns {
        data.push(utils::numeric_values(
            df.column(name)?.as_materialized_series(),
        )?);
    }

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = if i == j {
                statistics::pearson(&data[i], &data[j]).map(|_| 1.0)
            } else {
                statistics::pearson(&data[i], &data[j])
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(Some(CorrelationMatrix { columns, values }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler::profile;
    use pretty_assertions::assert_eq;

    // ==================== summarize tests ====================

    #[test]
    fn test_complete_dataset_is_fully_complete() {
        let df = df![
            "a" => [1i64, 2, 3],
            "b" => ["x", "y", "z"],
        ]
        .unwrap();

        let summary = summarize(&df).unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.columns, 2);
        assert_eq!(summary.missing_total, 0);
        assert_eq!(summary.completeness_pct, Some(100.0));
        assert_eq!(summary.missing_pct, Some(0.0));
        assert_eq!(summary.type_histogram.quantitative, 1);
        assert_eq!(summary.type_histogram.qualitative, 1);
        assert_eq!(summary.column_names, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_counts() {
        let df = df![
            "a" => [Some(1.0), None, Some(f64::NAN), Some(4.0)],
            "b" => [Some("x"), Some("y"), None, Some("z")],
        ]
        .unwrap();

        let summary = summarize(&df).unwrap();
        assert_eq!(summary.missing_total, 3);
        assert_eq!(summary.missing_by_column[0].missing, 2);
        assert_eq!(summary.missing_by_column[0].percentage, 50.0);
        assert_eq!(summary.missing_by_column[1].missing, 1);
        assert_eq!(summary.completeness_pct, Some(62.5));
        assert_eq!(summary.columns_with_missing().count(), 2);
    }

    #[test]
    fn test_empty_dataset_has_no_completeness() {
        let summary = summarize(&DataFrame::empty()).unwrap();
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.columns, 0);
        assert_eq!(summary.completeness_pct, None);
        assert_eq!(summary.missing_pct, None);
    }

    #[test]
    fn test_zero_row_dataset_has_no_completeness() {
        let df = df!["a" => Vec::<f64>::new()].unwrap();
        let summary = summarize(&df).unwrap();
        assert_eq!(summary.columns, 1);
        assert_eq!(summary.completeness_pct, None);
        assert_eq!(summary.missing_by_column[0].percentage, 0.0);
    }

    #[test]
    fn test_duplicates_counted() {
        let df = df![
            "a" => [1i64, 1, 2],
            "b" => ["x", "x", "y"],
        ]
        .unwrap();
        let summary = summarize(&df).unwrap();
        assert_eq!(summary.duplicate_rows, 1);
        assert!((summary.duplicate_pct() - 100.0 / 3.0).abs() < 1e-9);
    }

    // ==================== statistics table tests ====================

    #[test]
    fn test_numeric_statistics_skips_text() {
        let df = df![
            "a" => [1.0, 2.0, 3.0],
            "b" => ["x", "y", "z"],
        ]
        .unwrap();
        let rows = numeric_statistics(&profile(&df).unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].column, "a");
        assert_eq!(rows[0].median, Some(2.0));
    }

    // ==================== correlation tests ====================

    #[test]
    fn test_correlation_matrix() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 4.0],
            "y" => [2.0, 4.0, 6.0, 8.0],
            "z" => [4.0, 3.0, 2.0, 1.0],
        ]
        .unwrap();
        let matrix = correlation_matrix(&df, &profile(&df).unwrap())
            .unwrap()
            .unwrap();

        assert!((matrix.get("x", "y").unwrap() - 1.0).abs() < 1e-12);
        assert!((matrix.get("x", "z").unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(matrix.get("x", "x"), Some(1.0));

        let pairs = matrix.notable_pairs(0.3);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].strength(), "very strong");
    }

    #[test]
    fn test_correlation_strength_wording() {
        let pair = |coefficient: f64| CorrelationPair {
            first: "a".to_string(),
            second: "b".to_string(),
            coefficient,
        };
        assert_eq!(pair(-0.71).strength(), "very strong");
        assert_eq!(pair(0.7).strength(), "strong");
        assert_eq!(pair(0.51).strength(), "strong");
        assert_eq!(pair(0.5).strength(), "moderate");
        assert_eq!(pair(-0.2).direction(), "negative");
    }

    #[test]
    fn test_correlation_needs_two_columns() {
        let df = df!["x" => [1.0, 2.0]].unwrap();
        assert!(
            correlation_matrix(&df, &profile(&df).unwrap())
                .unwrap()
                .is_none()
        );
    }
}
