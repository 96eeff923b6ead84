//! IQR-based outlier removal.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::profiler::{ColumnProfiler, statistics};
use crate::utils;
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Inclusive IQR bounds of a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    /// Bounds `[Q1 - k*IQR, Q3 + k*IQR]`, or `None` when there are no values.
    pub fn compute(values: &[f64], multiplier: f64) -> Option<Self> {
        let sorted = statistics::sorted(values);
        let q1 = statistics::quantile(&sorted, 0.25)?;
        let q3 = statistics::quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Number of `values` outside their own IQR bounds.
pub fn count_outliers(values: &[f64], multiplier: f64) -> usize {
    match OutlierBounds::compute(values, multiplier) {
        Some(bounds) => values.iter().filter(|v| !bounds.contains(**v)).count(),
        None => 0,
    }
}

/// Row mask of the present values of `series` that lie inside its IQR bounds.
///
/// Missing values map to `false`. Returns `None` when the column has no
/// values to compute bounds from.
pub fn inlier_mask(series: &Series, multiplier: f64) -> Result<Option<(OutlierBounds, Vec<bool>)>> {
    let values = utils::numeric_values(series)?;
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let Some(bounds) = OutlierBounds::compute(&present, multiplier) else {
        return Ok(None);
    };
    let mask = values
        .iter()
        .map(|v| v.is_some_and(|x| bounds.contains(x)))
        .collect();
    Ok(Some((bounds, mask)))
}

/// Remove outlier rows from `column` with the default multiplier (1.5).
pub fn remove_outliers(df: &DataFrame, column: &str) -> Result<DataFrame> {
    remove_outliers_with(df, column, &AnalysisConfig::default())
}

/// Keep only rows whose value in `column` is present and inside the IQR bounds.
///
/// Bounds are computed from the column's non-missing values before any row
/// is dropped. Rows missing a value in `column` are dropped as well.
///
/// # Errors
/// - `ColumnNotFound` if the column does not exist
/// - `NotQuantitative` if the column is qualitative or contaminated
/// - `NoValidValues` if the column has no non-missing values
pub fn remove_outliers_with(
    df: &DataFrame,
    column: &str,
    config: &AnalysisConfig,
) -> Result<DataFrame> {
    let series = df
        .column(column)
        .map_err(|_| AnalysisError::ColumnNotFound(column.to_string()))?
        .as_materialized_series();

    let profile = ColumnProfiler::new(config).profile_series(series)?;
    if profile.numeric_summary().is_none() {
        return Err(AnalysisError::NotQuantitative(column.to_string()));
    }

    let (bounds, mask) = inlier_mask(series, config.iqr_multiplier)?
        .ok_or_else(|| AnalysisError::NoValidValues(column.to_string()))?;
    let filtered = df.filter(&BooleanChunked::from_slice("mask".into(), &mask))?;

    debug!(
        column,
        lower = bounds.lower,
        upper = bounds.upper,
        removed = df.height() - filtered.height(),
        "removed outlier rows"
    );
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        utils::numeric_values(df.column(name).unwrap().as_materialized_series()).unwrap()
    }

    #[test]
    fn test_bounds_and_count() {
        let values = [10.0, 12.0, 11.0, 13.0, 1000.0];
        let bounds = OutlierBounds::compute(&values, 1.5).unwrap();
        assert_eq!(bounds.lower, 8.0);
        assert_eq!(bounds.upper, 16.0);
        assert!(bounds.contains(16.0));
        assert_eq!(count_outliers(&values, 1.5), 1);
        assert_eq!(count_outliers(&[], 1.5), 0);
    }

    #[test]
    fn test_remove_outliers_drops_extreme_row() {
        let df = df![
            "value" => [10i64, 12, 11, 13, 1000],
            "label" => ["a", "b", "c", "d", "e"],
        ]
        .unwrap();

        let cleaned = remove_outliers(&df, "value").unwrap();
        assert_eq!(cleaned.height(), 4);
        assert_eq!(
            column_values(&cleaned, "value"),
            vec![Some(10.0), Some(12.0), Some(11.0), Some(13.0)]
        );
    }

    #[test]
    fn test_kept_values_within_original_bounds() {
        let data = [1.0, 2.0, 2.5, 3.0, 3.5, 4.0, -40.0, 55.0, 3.2];
        let df = df!["x" => data].unwrap();
        let bounds = OutlierBounds::compute(&data, 1.5).unwrap();

        let cleaned = remove_outliers(&df, "x").unwrap();
        for value in column_values(&cleaned, "x").into_iter().flatten() {
            assert!(bounds.contains(value));
        }
        assert_eq!(cleaned.height(), 7);
    }

    #[test]
    fn test_missing_values_dropped() {
        let df = df!["x" => [Some(1.0), None, Some(2.0), Some(3.0)]].unwrap();
        let cleaned = remove_outliers(&df, "x").unwrap();
        assert_eq!(cleaned.height(), 3);
    }

    #[test]
    fn test_unknown_column() {
        let df = df!["x" => [1.0, 2.0]].unwrap();
        let err = remove_outliers(&df, "y").unwrap_err();
        assert!(matches!(err, AnalysisError::ColumnNotFound(ref c) if c == "y"));
    }

    #[test]
    fn test_qualitative_column_rejected() {
        let df = df!["city" => ["Paris", "Lyon"]].unwrap();
        let err = remove_outliers(&df, "city").unwrap_err();
        assert!(matches!(err, AnalysisError::NotQuantitative(_)));
    }

    #[test]
    fn test_contaminated_column_rejected() {
        let df = df!["age" => ["1", "2", "x", "4"]].unwrap();
        let err = remove_outliers(&df, "age").unwrap_err();
        assert!(matches!(err, AnalysisError::NotQuantitative(_)));
    }

    #[test]
    fn test_all_missing_column_rejected() {
        let df = df!["x" => [None::<f64>, None]].unwrap();
        let err = remove_outliers(&df, "x").unwrap_err();
        assert!(matches!(err, AnalysisError::NoValidValues(_)));
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_numeric_text_column_filtered() {
        let df = df!["x" => ["10", "12", "11", "13", "1000"]].unwrap();
        let cleaned = remove_outliers(&df, "x").unwrap();
        assert_eq!(cleaned.height(), 4);
    }
}
