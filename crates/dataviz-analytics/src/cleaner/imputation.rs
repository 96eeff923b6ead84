//! Missing-value imputation.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result, ResultExt};
use crate::profiler::{ColumnProfiler, statistics};
use crate::utils;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Strategy for filling missing values in numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillMethod {
    /// Mean of the non-missing values.
    Mean,
    /// Median of the non-missing values.
    Median,
    /// Most recent prior non-missing value.
    ForwardFill,
}

impl FillMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::ForwardFill => "forward-fill",
        }
    }
}

impl fmt::Display for FillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FillMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "forward-fill" | "forward_fill" | "ffill" => Ok(Self::ForwardFill),
            other => Err(AnalysisError::InvalidMethod(other.to_string())),
        }
    }
}

/// Fill missing values with default settings.
pub fn fill_missing(df: &DataFrame, method: FillMethod) -> Result<DataFrame> {
    fill_missing_with(df, method, &AnalysisConfig::default())
}

/// Fill missing values.
///
/// Quantitative columns with at least one missing value are filled according
/// to `method`. A text column whose values all parse as numbers counts as
/// quantitative and comes back as Float64. Qualitative and contaminated text
/// columns are filled with `config.missing_sentinel` whatever the method.
/// Columns of any other dtype are returned unchanged.
pub fn fill_missing_with(
    df: &DataFrame,
    method: FillMethod,
    config: &AnalysisConfig,
) -> Result<DataFrame> {
    let profiler = ColumnProfiler::new(config);
    let mut out = df.clone();

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let name = series.name().to_string();
        if utils::missing_count(series)? == 0 {
            continue;
        }

        let dtype = series.dtype();
        let filled = if utils::is_numeric_dtype(dtype) {
            fill_numeric(series, method, dtype)?
        } else if utils::is_text_dtype(dtype) {
            let profile = profiler
                .profile_series(series)
                .context(format!("Profiling column '{}'", name))?;
            if profile.numeric_summary().is_some() {
                fill_numeric(series, method, &DataType::Float64)?
            } else {
                Some(fill_text(series, &config.missing_sentinel)?)
            }
        } else {
            None
        };

        if let Some(filled) = filled {
            debug!(column = %name, method = %method, dtype = %filled.dtype(), "filled missing values");
            out.replace(&name, filled)?;
        }
    }

    Ok(out)
}

fn fill_numeric(series: &Series, method: FillMethod, dtype: &DataType) -> Result<Option<Series>> {
    let values = utils::numeric_values(series)?;

    match method {
        FillMethod::Mean | FillMethod::Median => {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            let stat = match method {
                FillMethod::Mean => statistics::mean(&present),
                _ => statistics::median(&present),
            };
            // A column with no values at all stays missing.
            let Some(stat) = stat else {
                return Ok(None);
            };
            let filled: Vec<Option<f64>> = values.into_iter().map(|v| v.or(Some(stat))).collect();
            Ok(Some(Series::new(series.name().clone(), filled)))
        }
        FillMethod::ForwardFill => {
            let filled = Series::new(series.name().clone(), values)
                .fill_null(FillNullStrategy::Forward(None))?
                .cast(dtype)?;
            Ok(Some(filled))
        }
    }
}

fn fill_text(series: &Series, sentinel: &str) -> Result<Series> {
    let filled: Vec<String> = utils::text_values(series)?
        .into_iter()
        .map(|v| v.unwrap_or_else(|| sentinel.to_string()))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}
