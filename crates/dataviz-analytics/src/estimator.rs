//! Advisory estimate of how many rows survive a full cleaning pass.
//!
//! Nothing here mutates the dataset. The numbers feed the chat answer to
//! "how many rows will remain after cleaning?" and the CLI `estimate`
//! command.

use crate::cleaner::{count_outliers, duplicate_count};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::profiler::ColumnProfiler;
use crate::types::CleaningEstimate;
use crate::utils;
use polars::prelude::*;
use tracing::debug;

/// Estimate post-cleaning row counts with default settings.
pub fn estimate_post_cleaning_rows(df: &DataFrame) -> Result<CleaningEstimate> {
    estimate_post_cleaning_rows_with(df, &AnalysisConfig::default())
}

/// Estimate post-cleaning row counts.
///
/// Stages:
/// 1. exact duplicates are removed
/// 2. rows whose missing share exceeds `sparse_row_threshold` are presumed
///    dropped (counted on the original rows)
/// 3. `outlier_damping_factor` times the total IQR-outlier count across
///    quantitative columns is subtracted, and the result is rounded down
///
/// The damped outlier estimate stays fractional until that last step. The
/// final figure is never below 1 unless the dataset has no rows.
pub fn estimate_post_cleaning_rows_with(
    df: &DataFrame,
    config: &AnalysisConfig,
) -> Result<CleaningEstimate> {
    let original = df.height();
    let duplicates = duplicate_count(df)?;
    let after_dedup = original - duplicates;

    let sparse_rows = count_sparse_rows(df, config.sparse_row_threshold)?;
    let after_missing_handling = after_dedup.saturating_sub(sparse_rows);

    let outlier_values = count_outlier_values(df, config)?;
    let estimated_outlier_rows = outlier_values as f64 * config.outlier_damping_factor;

    let after_outliers = if original == 0 {
        0
    } else {
        (after_missing_handling as f64 - estimated_outlier_rows)
            .floor()
            .max(1.0) as usize
    };

    debug!(
        original,
        duplicates, sparse_rows, outlier_values, after_outliers, "estimated cleaning impact"
    );

    Ok(CleaningEstimate {
        original,
        duplicates,
        after_dedup,
        sparse_rows,
        after_missing_handling,
        estimated_outlier_rows,
        after_outliers,
    })
}

fn count_sparse_rows(df: &DataFrame, threshold: f64) -> Result<usize> {
    let width = df.width();
    if width == 0 {
        return Ok(0);
    }
    Ok(utils::row_missing_counts(df)?
        .into_iter()
        .filter(|missing| *missing as f64 / width as f64 > threshold)
        .count())
}

fn count_outlier_values(df: &DataFrame, config: &AnalysisConfig) -> Result<usize> {
    let profile = ColumnProfiler::new(config).profile(df)?;
    let mut total = 0;
    for (name, _) in profile.computed_numeric() {
        let values =
            utils::present_numeric_values(df.column(name)?.as_materialized_series())?;
        total += count_outliers(&values, config.iqr_multiplier);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_dataset_keeps_every_row() {
        let df = df![
            "a" => [1.0, 2.0, 3.0, 4.0],
            "b" => ["w", "x", "y", "z"],
        ]
        .unwrap();
        let estimate = estimate_post_cleaning_rows(&df).unwrap();
        assert_eq!(estimate.original, 4);
        assert_eq!(estimate.duplicates, 0);
        assert_eq!(estimate.sparse_rows, 0);
        assert_eq!(estimate.estimated_outlier_rows, 0.0);
        assert_eq!(estimate.after_outliers, 4);
    }

    #[test]
    fn test_stages_accumulate() {
        let df = df![
            "a" => [Some(1.0), Some(1.0), None, Some(3.0), Some(4.0)],
            "b" => [Some("x"), Some("x"), None, Some("y"), Some("z")],
            "c" => [Some(1i64), Some(1), Some(5), Some(2), Some(3)],
        ]
        .unwrap();

        let estimate = estimate_post_cleaning_rows(&df).unwrap();
        assert_eq!(estimate.duplicates, 1);
        assert_eq!(estimate.after_dedup, 4);
        // Row 2 is missing 2 of 3 cells.
        assert_eq!(estimate.sparse_rows, 1);
        assert_eq!(estimate.after_missing_handling, 3);
    }

    #[test]
    fn test_outlier_damping() {
        let mut values: Vec<f64> = (0..20).map(|i| 10.0 + (i % 4) as f64).collect();
        values.extend([1000.0; 10]);
        values.extend([-1000.0; 10]);
        let df = df!["x" => values].unwrap();

        let config = AnalysisConfig::builder().iqr_multiplier(0.1).build().unwrap();
        let estimate = estimate_post_cleaning_rows_with(&df, &config).unwrap();
        assert!(estimate.estimated_outlier_rows > 0.0);
        assert!(estimate.after_outliers < estimate.after_missing_handling);
    }

    #[test]
    fn test_floor_of_one_row() {
        let df = df!["a" => [None::<f64>, None], "b" => [None::<&str>, None]].unwrap();
        let estimate = estimate_post_cleaning_rows(&df).unwrap();
        assert_eq!(estimate.duplicates, 1);
        assert_eq!(estimate.sparse_rows, 2);
        assert_eq!(estimate.after_missing_handling, 0);
        assert_eq!(estimate.after_outliers, 1);
    }

    #[test]
    fn test_empty_dataset_estimates_zero() {
        let estimate = estimate_post_cleaning_rows(&DataFrame::empty()).unwrap();
        assert_eq!(estimate.original, 0);
        assert_eq!(estimate.after_outliers, 0);
    }

    #[test]
    fn test_damping_factor_zero_ignores_outliers() {
        let df = df!["x" => [10.0, 12.0, 11.0, 13.0, 1000.0]].unwrap();
        let config = AnalysisConfig::builder()
            .outlier_damping_factor(0.0)
            .build()
            .unwrap();
        let estimate = estimate_post_cleaning_rows_with(&df, &config).unwrap();
        assert_eq!(estimate.estimated_outlier_rows, 0.0);
        assert_eq!(estimate.after_outliers, 5);
    }

    #[test]
    fn test_fractional_outlier_estimate_is_subtracted() {
        // Each column holds a single outlier: 5 * 0.1 = 0.5 rows.
        let column: Vec<f64> = (1..=9).map(f64::from).chain([1000.0]).collect();
        let df = df![
            "a" => column.clone(),
            "b" => column.clone(),
            "c" => column.clone(),
            "d" => column.clone(),
            "e" => column,
        ]
        .unwrap();

        let estimate = estimate_post_cleaning_rows(&df).unwrap();
        assert_eq!(estimate.duplicates, 0);
        assert_eq!(estimate.after_missing_handling, 10);
        assert_eq!(estimate.estimated_outlier_rows, 0.5);
        assert_eq!(estimate.after_outliers, 9);
    }
}
