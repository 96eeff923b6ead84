//! Column profiling.
//!
//! Each column is classified as quantitative or qualitative and described
//! with the statistics that apply to its kind:
//! - numeric dtypes are quantitative
//! - text columns whose values all parse as numbers are quantitative
//! - text columns that mostly parse are quantitative but contaminated
//! - everything else is qualitative

pub mod statistics;

use crate::config::AnalysisConfig;
use crate::error::{Result, ResultExt};
use crate::types::{
    ColumnKind, ColumnProfile, DatasetProfile, NumericStatistics, NumericSummary,
};
use crate::utils;
use polars::prelude::*;
use tracing::debug;

/// Profiler for analyzing column kinds and statistics.
pub struct ColumnProfiler {
    mixed_numeric_ratio: f64,
}

impl Default for ColumnProfiler {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl ColumnProfiler {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            mixed_numeric_ratio: config.mixed_numeric_ratio,
        }
    }

    /// Profile every column of a dataset, in column order.
    pub fn profile(&self, df: &DataFrame) -> Result<DatasetProfile> {
        let mut columns = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let profile = self
                .profile_series(series)
                .context(format!("Profiling column '{}'", series.name()))?;
            columns.push(profile);
        }
        Ok(DatasetProfile { columns })
    }

    /// Profile a single column.
    pub fn profile_series(&self, series: &Series) -> Result<ColumnProfile> {
        let name = series.name().to_string();
        let missing_count = utils::missing_count(series)?;

        match self.classify(series)? {
            Classification::Numeric => {
                let values = utils::numeric_values(series)?;
                Ok(ColumnProfile::Quantitative {
                    name,
                    missing_count,
                    statistics: NumericStatistics::Computed(summarize_values(&values)),
                })
            }
            Classification::Contaminated { example } => {
                debug!(column = %name, example = %example, "numeric column contains text values");
                Ok(ColumnProfile::Quantitative {
                    name,
                    missing_count,
                    statistics: NumericStatistics::Contaminated {
                        remark: format!(
                            "Column contains non-numeric values (e.g. '{}'); statistics unavailable",
                            example
                        ),
                    },
                })
            }
            Classification::Categorical => Ok(ColumnProfile::Qualitative {
                name,
                missing_count,
                unique_count: utils::unique_non_missing(series)?,
                most_frequent: utils::string_mode(series)?,
            }),
        }
    }

    /// Column kind without computing statistics.
    pub fn column_kind(&self, series: &Series) -> Result<ColumnKind> {
        Ok(match self.classify(series)? {
            Classification::Categorical => ColumnKind::Qualitative,
            _ => ColumnKind::Quantitative,
        })
    }

    fn classify(&self, series: &Series) -> Result<Classification> {
        let dtype = series.dtype();
        if utils::is_numeric_dtype(dtype) {
            return Ok(Classification::Numeric);
        }
        if !utils::is_text_dtype(dtype) {
            return Ok(Classification::Categorical);
        }

        let (parsed, total, first_bad) = utils::numeric_parse_stats(series)?;
        if total == 0 || parsed == 0 {
            return Ok(Classification::Categorical);
        }
        if parsed == total {
            return Ok(Classification::Numeric);
        }

        let ratio = parsed as f64 / total as f64;
        match first_bad {
            Some(example) if ratio >= self.mixed_numeric_ratio => {
                Ok(Classification::Contaminated { example })
            }
            _ => Ok(Classification::Categorical),
        }
    }
}

enum Classification {
    Numeric,
    Contaminated { example: String },
    Categorical,
}

/// Profile a dataset with default settings.
pub fn profile(df: &DataFrame) -> Result<DatasetProfile> {
    ColumnProfiler::default().profile(df)
}

/// Compute the numeric summary of row-aligned values.
pub fn summarize_values(values: &[Option<f64>]) -> NumericSummary {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let sorted = statistics::sorted(&present);

    NumericSummary {
        count: present.len(),
        min: sorted.first().copied(),
        max: sorted.last().copied(),
        mean: statistics::mean(&present),
        median: statistics::quantile(&sorted, 0.5),
        std: statistics::sample_std(&present),
        q1: statistics::quantile(&sorted, 0.25),
        q3: statistics::quantile(&sorted, 0.75),
        trend: statistics::trend(values),
    }
}
