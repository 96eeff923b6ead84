//! Exact row-wise deduplication.

use crate::error::{Result, ResultExt};
use polars::prelude::*;
use tracing::debug;

/// Distinct rows in first-occurrence order.
fn distinct_rows(df: &DataFrame) -> Result<DataFrame> {
    if df.width() == 0 || df.height() < 2 {
        return Ok(df.clone());
    }
    df.unique_stable(None, UniqueKeepStrategy::First, None)
        .context("Computing distinct rows")
}

/// Number of rows that repeat an earlier row exactly.
pub fn duplicate_count(df: &DataFrame) -> Result<usize> {
    Ok(df.height() - distinct_rows(df)?.height())
}

/// Drop exact duplicate rows, keeping the first occurrence in original order.
///
/// Two missing values in the same column compare equal, as do `0.0` and
/// `-0.0`. Returns the cleaned dataset and the number of rows removed.
pub fn remove_duplicates(df: &DataFrame) -> Result<(DataFrame, usize)> {
    let cleaned = distinct_rows(df)?;
    let removed = df.height() - cleaned.height();
    if removed == 0 {
        return Ok((df.clone(), 0));
    }

    debug!(removed, remaining = cleaned.height(), "removed duplicate rows");
    Ok((cleaned, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_remove_duplicates_keeps_first() {
        let df = df![
            "a" => [1i64, 1, 2],
            "b" => ["x", "x", "y"],
        ]
        .unwrap();

        let (cleaned, removed) = remove_duplicates(&df).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(cleaned.height(), 2);
        assert_eq!(df.height(), 3);

        let b: Vec<Option<&str>> = cleaned
            .column("b")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(b, vec![Some("x"), Some("y")]);
    }

    #[test]
    fn test_remove_duplicates_is_idempotent() {
        let df = df![
            "a" => [1i64, 2, 1, 3, 2],
            "b" => ["x", "y", "x", "z", "y"],
        ]
        .unwrap();

        let (once, removed_once) = remove_duplicates(&df).unwrap();
        let (twice, removed_twice) = remove_duplicates(&once).unwrap();
        assert_eq!(removed_once, 2);
        assert_eq!(removed_twice, 0);
        assert_eq!(once.height(), twice.height());
    }

    #[test]
    fn test_remove_duplicates_preserves_order() {
        let df = df!["a" => [3i64, 1, 3, 2, 1]].unwrap();
        let (cleaned, _) = remove_duplicates(&df).unwrap();
        let values: Vec<Option<i64>> = cleaned
            .column("a")
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn test_missing_values_compare_equal() {
        let df = df![
            "a" => [None, None, Some(1i64)],
            "b" => [Some("x"), Some("x"), Some("x")],
        ]
        .unwrap();
        assert_eq!(duplicate_count(&df).unwrap(), 1);
    }

    #[test]
    fn test_signed_zero_rows_are_duplicates() {
        let df = df!["a" => [0.0f64, -0.0]].unwrap();
        assert_eq!(duplicate_count(&df).unwrap(), 1);

        let (cleaned, removed) = remove_duplicates(&df).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(cleaned.height(), 1);
    }

    #[test]
    fn test_empty_dataset() {
        let df = DataFrame::empty();
        let (cleaned, removed) = remove_duplicates(&df).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(cleaned.height(), 0);
    }
}
