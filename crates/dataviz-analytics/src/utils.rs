//! Shared helpers for reading column values out of polars Series.
//!
//! Missing means a polars null, plus `NaN` in float columns. Everything that
//! counts or skips missing values goes through these helpers so the rule is
//! applied the same way in every module.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a float type (the only kind that can hold NaN).
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType stores text.
#[inline]
pub fn is_text_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(_, _))
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Parse a trimmed string as a finite `f64`.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(parse_numeric_string(" 42.5 "), Some(42.5));
/// assert_eq!(parse_numeric_string("abc"), None);
/// ```
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Missing Values
// =============================================================================

/// Per-row missing flags: null, or NaN for float columns.
pub fn missing_mask(series: &Series) -> PolarsResult<Vec<bool>> {
    if is_float_dtype(series.dtype()) {
        let floats = series.cast(&DataType::Float64)?;
        Ok(floats
            .f64()?
            .into_iter()
            .map(|v| v.is_none_or(f64::is_nan))
            .collect())
    } else {
        Ok(series
            .is_null()
            .into_iter()
            .map(|v| v.unwrap_or(false))
            .collect())
    }
}

/// Number of missing values in a Series.
pub fn missing_count(series: &Series) -> PolarsResult<usize> {
    if is_float_dtype(series.dtype()) {
        Ok(missing_mask(series)?.into_iter().filter(|m| *m).count())
    } else {
        Ok(series.null_count())
    }
}

// =============================================================================
// Value Extraction
// =============================================================================

/// Row-aligned numeric view of a Series.
///
/// Numeric columns are cast to `f64` with NaN mapped to `None`. Text columns
/// are parsed value by value; unparseable text becomes `None`. Any other
/// dtype yields all `None`.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let dtype = series.dtype();
    if is_numeric_dtype(dtype) {
        let floats = series.cast(&DataType::Float64)?;
        return Ok(floats
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect());
    }
    if is_text_dtype(dtype) {
        return Ok(text_values(series)?
            .into_iter()
            .map(|v| v.as_deref().and_then(parse_numeric_string))
            .collect());
    }
    Ok(vec![None; series.len()])
}

/// Non-missing numeric values of a Series, in row order.
pub fn present_numeric_values(series: &Series) -> PolarsResult<Vec<f64>> {
    Ok(numeric_values(series)?.into_iter().flatten().collect())
}

/// Row-aligned text view of a Series (nulls stay `None`).
pub fn text_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let as_text = series.cast(&DataType::String)?;
    Ok(as_text
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Counts of (parseable, non-missing) trimmed values in a text Series, plus
/// the first value that failed to parse.
pub fn numeric_parse_stats(series: &Series) -> PolarsResult<(usize, usize, Option<String>)> {
    let mut parsed = 0;
    let mut total = 0;
    let mut first_bad = None;

    for value in text_values(series)?.into_iter().flatten() {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        total += 1;
        if parse_numeric_string(trimmed).is_some() {
            parsed += 1;
        } else if first_bad.is_none() {
            first_bad = Some(trimmed.to_string());
        }
    }

    Ok((parsed, total, first_bad))
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Most frequent non-missing text value; ties go to the value seen first.
pub fn string_mode(series: &Series) -> PolarsResult<Option<String>> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, value) in text_values(series)?.into_iter().flatten().enumerate() {
        counts.entry(value).or_insert((0, position)).0 += 1;
    }

    Ok(counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, _)| value))
}

/// Number of distinct non-missing values.
pub fn unique_non_missing(series: &Series) -> PolarsResult<usize> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return Ok(0);
    }
    non_null.n_unique()
}

// =============================================================================
// Row Utilities
// =============================================================================

/// Number of missing cells in each row.
pub fn row_missing_counts(df: &DataFrame) -> PolarsResult<Vec<usize>> {
    let mut counts = vec![0usize; df.height()];
    for column in df.get_columns() {
        let mask = missing_mask(column.as_materialized_series())?;
        for (count, missing) in counts.iter_mut().zip(mask) {
            if missing {
                *count += 1;
            }
        }
    }
    Ok(counts)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float32));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("  -3.5 "), Some(-3.5));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("abc"), None);
        assert_eq!(parse_numeric_string("inf"), None);
    }

    #[test]
    fn test_missing_mask_counts_nan() {
        let series = Series::new("x".into(), &[Some(1.0), None, Some(f64::NAN)]);
        assert_eq!(missing_mask(&series).unwrap(), vec![false, true, true]);
        assert_eq!(missing_count(&series).unwrap(), 2);
    }

    #[test]
    fn test_missing_count_text() {
        let series = Series::new("x".into(), &[Some("a"), None, Some("b")]);
        assert_eq!(missing_count(&series).unwrap(), 1);
    }

    #[test]
    fn test_numeric_values_from_text() {
        let series = Series::new("x".into(), &[Some("1.5"), Some("abc"), None, Some(" 3 ")]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(1.5), None, None, Some(3.0)]);
    }

    #[test]
    fn test_numeric_parse_stats() {
        let series = Series::new("x".into(), &[Some("1"), Some("2"), Some("n/a"), None]);
        let (parsed, total, bad) = numeric_parse_stats(&series).unwrap();
        assert_eq!(parsed, 2);
        assert_eq!(total, 3);
        assert_eq!(bad.as_deref(), Some("n/a"));
    }

    #[test]
    fn test_string_mode_tie_prefers_first_seen() {
        let series = Series::new("x".into(), &["b", "a", "a", "b", "c"]);
        assert_eq!(string_mode(&series).unwrap(), Some("b".to_string()));
    }

    #[test]
    fn test_string_mode_empty() {
        let series = Series::new("x".into(), &[None::<&str>, None]);
        assert_eq!(string_mode(&series).unwrap(), None);
    }

    #[test]
    fn test_row_missing_counts() {
        let df = df![
            "a" => [Some(1.0), None, Some(f64::NAN)],
            "b" => [Some("x"), None, Some("y")],
        ]
        .unwrap();
        assert_eq!(row_missing_counts(&df).unwrap(), vec![0, 2, 1]);
    }
}
