//! Plain-text dataset descriptions handed to the external answer service.

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::profiler::ColumnProfiler;
use crate::summary::{CorrelationPair, correlation_matrix, summarize_with};
use crate::types::{ColumnProfile, DatasetSummary};
use polars::prelude::*;

/// Correlations at or below this magnitude are left out of the context.
const NOTABLE_CORRELATION: f64 = 0.3;
const MAX_CORRELATIONS: usize = 10;
const MAX_CATEGORICAL: usize = 3;

/// Compact block: shape, duplicates, missing values, memory and column names.
pub fn render_context_block(summary: &DatasetSummary) -> String {
    format!(
        "DATASET CONTEXT:\n\
         - Rows: {}\n\
         - Columns: {}\n\
         - Duplicate rows: {}\n\
         - Missing values: {}\n\
         - Memory: {:.2} MB\n\
         - Column names: {}",
        summary.rows,
        summary.columns,
        summary.duplicate_rows,
        summary.missing_total,
        summary.memory_usage_mb,
        summary.column_names.join(", "),
    )
}

/// Detailed block used to prompt the reference providers.
///
/// Covers descriptive statistics with coefficient of variation and trend
/// per quantitative column, correlations with `|r| > 0.3`, data-quality
/// figures and up to three categorical columns.
pub fn render_advanced_context(df: &DataFrame, config: &AnalysisConfig) -> Result<String> {
    let summary = summarize_with(df, config)?;
    let profile = ColumnProfiler::new(config).profile(df)?;

    let mut lines = vec![
        "DATASET CONTEXT:".to_string(),
        format!("- Total rows: {}", summary.rows),
        format!("- Columns: {}", summary.columns),
    ];

    let numeric: Vec<_> = profile.computed_numeric().collect();
    if !numeric.is_empty() {
        lines.push(format!(
            "\nDESCRIPTIVE STATISTICS ({} numeric columns):",
            numeric.len()
        ));
        for (name, stats) in &numeric {
            let (Some(min), Some(max), Some(mean), Some(median)) =
                (stats.min, stats.max, stats.mean, stats.median)
            else {
                continue;
            };
            let std = stats.std.unwrap_or(0.0);
            let cv = if mean != 0.0 { std / mean * 100.0 } else { 0.0 };
            let q1 = stats.q1.unwrap_or(min);
            let q3 = stats.q3.unwrap_or(max);

            lines.push(format!("\n  {}:", name));
            lines.push(format!(
                "     - Range: {:.2} to {:.2} (spread = {:.2})",
                min,
                max,
                max - min
            ));
            lines.push(format!("     - Mean: {:.2} ± {:.2} (std dev)", mean, std));
            lines.push(format!("     - Median: {:.2}", median));
            lines.push(format!(
                "     - Quartiles: Q1={:.2}, Q3={:.2} (IQR={:.2})",
                q1,
                q3,
                q3 - q1
            ));
            lines.push(format!("     - Variability: {:.1}% (coef. of variation)", cv));
            lines.push(format!("     - Trend: {}", stats.trend));
        }
    }

    if let Some(matrix) = correlation_matrix(df, &profile)? {
        lines.push("\nCORRELATIONS:".to_string());
        let pairs = matrix.notable_pairs(NOTABLE_CORRELATION);
        if pairs.is_empty() {
            lines.push(format!(
                "  - No notable correlations (|r| > {})",
                NOTABLE_CORRELATION
            ));
        }
        for pair in pairs.iter().take(MAX_CORRELATIONS) {
            lines.push(format!(
                "  - {} <-> {}: {:.3} ({} {})",
                pair.first,
                pair.second,
                pair.coefficient,
                context_strength(pair),
                pair.direction()
            ));
        }
    }

    if summary.missing_total > 0 || summary.duplicate_rows > 0 {
        lines.push("\nDATA QUALITY:".to_string());
        if summary.missing_total > 0 {
            lines.push(format!(
                "  - Missing values: {} ({:.1}%)",
                summary.missing_total,
                summary.missing_pct.unwrap_or(0.0)
            ));
        }
        if summary.duplicate_rows > 0 {
            lines.push(format!("  - Duplicates: {} rows", summary.duplicate_rows));
        }
    }

    let categorical: Vec<_> = profile
        .iter()
        .filter_map(|p| match p {
            ColumnProfile::Qualitative {
                name, unique_count, ..
            } => Some((name, unique_count)),
            _ => None,
        })
        .take(MAX_CATEGORICAL)
        .collect();
    if !categorical.is_empty() {
        lines.push("\nCATEGORICAL COLUMNS:".to_string());
        for (name, unique) in categorical {
            lines.push(format!("  - {}: {} unique categories", name, unique));
        }
    }

    Ok(lines.join("\n"))
}

/// Finer four-step scale than [`CorrelationPair::strength`].
fn context_strength(pair: &CorrelationPair) -> &'static str {
    let r = pair.coefficient.abs();
    if r > 0.8 {
        "very strong"
    } else if r > 0.6 {
        "strong"
    } else if r > 0.4 {
        "moderate"
    } else {
        "weak"
    }
}
