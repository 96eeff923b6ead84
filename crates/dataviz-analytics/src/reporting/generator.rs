use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::profiler::ColumnProfiler;
use crate::summary::{
    CorrelationMatrix, NumericStatsRow, correlation_matrix, numeric_statistics, summarize_with,
};
use crate::types::{ColumnMissing, ColumnProfile, CleaningStep, DatasetSummary, NumericStatistics};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

const RULE_WIDTH: usize = 80;

// ============================================================================
// Report Types
// ============================================================================

/// Output format of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Html,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            other => Err(AnalysisError::InvalidConfig(format!(
                "unknown report format '{}' (expected text, html or json)",
                other
            ))),
        }
    }
}

/// Everything a report shows about one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Name of the source file
    pub source_name: String,
    pub summary: DatasetSummary,
    /// Missing values for every column, in dataset order
    pub missing_analysis: Vec<ColumnMissing>,
    pub columns: Vec<ColumnProfile>,
    /// `None` when the dataset has no computed quantitative column
    pub numeric_statistics: Option<Vec<NumericStatsRow>>,
    /// `None` with fewer than two computed quantitative columns
    pub correlations: Option<CorrelationMatrix>,
    /// Cleaning steps applied before the report was built
    pub cleaning_steps: Vec<CleaningStep>,
}

impl AnalysisReport {
    /// Profile and summarize `df` into a report.
    pub fn build(
        source_name: impl Into<String>,
        df: &DataFrame,
        config: &AnalysisConfig,
    ) -> Result<Self> {
        let summary = summarize_with(df, config)?;
        let profile = ColumnProfiler::new(config).profile(df)?;
        let stats = numeric_statistics(&profile);
        let correlations = correlation_matrix(df, &profile)?;

        Ok(Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            source_name: source_name.into(),
            missing_analysis: summary.missing_by_column.clone(),
            summary,
            columns: profile.columns,
            numeric_statistics: (!stats.is_empty()).then_some(stats),
            correlations,
            cleaning_steps: Vec::new(),
        })
    }

    /// Attach the cleaning history.
    pub fn with_steps(mut self, steps: &[CleaningStep]) -> Self {
        self.cleaning_steps = steps.to_vec();
        self
    }
}

// ============================================================================
// Generator
// ============================================================================

pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self {
            output_dir,
            output_name,
        }
    }

    /// Render `report` in `format`.
    pub fn render(report: &AnalysisReport, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(Self::render_text(report)),
            ReportFormat::Html => Ok(Self::render_html(report)),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        }
    }

    /// Plain-text report with fixed-width sections.
    pub fn render_text(report: &AnalysisReport) -> String {
        let summary = &report.summary;
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "{heavy}\nDATA ANALYSIS REPORT\n{heavy}\n");
        let _ = writeln!(out, "File: {}", report.source_name);
        let _ = writeln!(out, "Date: {}\n", report.generated_at);

        let _ = writeln!(out, "{light}\nGENERAL INFORMATION\n{light}");
        let _ = writeln!(out, "Rows: {}", summary.rows);
        let _ = writeln!(out, "Columns: {}", summary.columns);
        let _ = writeln!(
            out,
            "Missing values (total): {} ({})",
            summary.missing_total,
            fmt_pct(summary.missing_pct)
        );
        let _ = writeln!(out, "Completeness: {}", fmt_pct(summary.completeness_pct));
        let _ = writeln!(out, "Duplicate rows: {}\n", summary.duplicate_rows);

        let _ = writeln!(out, "{light}\nDATA TYPES\n{light}");
        for (dtype, count) in &summary.dtype_counts {
            let _ = writeln!(out, "{}: {} column(s)", dtype, count);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "{light}\nMISSING VALUES BY COLUMN\n{light}");
        let width = name_width(report.missing_analysis.iter().map(|m| m.column.as_str()));
        let _ = writeln!(out, "{:<width$}  {:>8}  {:>9}", "Column", "Missing", "Percent");
        for missing in &report.missing_analysis {
            let _ = writeln!(
                out,
                "{:<width$}  {:>8}  {:>8.2}%",
                missing.column, missing.missing, missing.percentage
            );
        }
        let _ = writeln!(out);

        if let Some(stats) = &report.numeric_statistics {
            let _ = writeln!(out, "{light}\nNUMERIC STATISTICS\n{light}");
            let width = name_width(stats.iter().map(|s| s.column.as_str()));
            let _ = writeln!(
                out,
                "{:<width$}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}",
                "Column", "Min", "Max", "Mean", "Median", "Std", "Q1", "Q3"
            );
            for row in stats {
                let _ = writeln!(
                    out,
                    "{:<width$}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}",
                    row.column,
                    fmt_num(row.min),
                    fmt_num(row.max),
                    fmt_num(row.mean),
                    fmt_num(row.median),
                    fmt_num(row.std),
                    fmt_num(row.q1),
                    fmt_num(row.q3)
                );
            }
            let _ = writeln!(out);
        }

        let remarks: Vec<_> = report.columns.iter().filter_map(contamination_remark).collect();
        if !remarks.is_empty() {
            let _ = writeln!(out, "{light}\nDATA QUALITY REMARKS\n{light}");
            for (name, remark) in remarks {
                let _ = writeln!(out, "{}: {}", name, remark);
            }
            let _ = writeln!(out);
        }

        if let Some(matrix) = &report.correlations {
            let _ = writeln!(out, "{light}\nCORRELATIONS (|r| > 0.3)\n{light}");
            let pairs = matrix.notable_pairs(0.3);
            if pairs.is_empty() {
                let _ = writeln!(out, "No notable correlation");
            }
            for pair in pairs {
                let _ = writeln!(
                    out,
                    "{} <-> {}: {:.3} ({} {})",
                    pair.first,
                    pair.second,
                    pair.coefficient,
                    pair.strength(),
                    pair.direction()
                );
            }
            let _ = writeln!(out);
        }

        if !report.cleaning_steps.is_empty() {
            let _ = writeln!(out, "{light}\nCLEANING STEPS\n{light}");
            for (i, step) in report.cleaning_steps.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {} ({} -> {} rows): {}",
                    i + 1,
                    step.action_type.display_name(),
                    step.rows_before,
                    step.rows_after,
                    step.message
                );
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "{heavy}\nEND OF REPORT\n{heavy}");
        out
    }

    /// Standalone HTML page. Every dataset-derived string is escaped.
    pub fn render_html(report: &AnalysisReport) -> String {
        let summary = &report.summary;
        let title = escape_html(&report.source_name);
        let mut body = String::new();

        let _ = write!(
            body,
            "<div class=\"section\"><h2>General information</h2><table>\
             <tr><th>Rows</th><td>{}</td></tr>\
             <tr><th>Columns</th><td>{}</td></tr>\
             <tr><th>Missing values</th><td>{} ({})</td></tr>\
             <tr><th>Completeness</th><td>{}</td></tr>\
             <tr><th>Duplicate rows</th><td>{}</td></tr>\
             <tr><th>Memory</th><td>{:.2} MB</td></tr>\
             </table></div>",
            summary.rows,
            summary.columns,
            summary.missing_total,
            fmt_pct(summary.missing_pct),
            fmt_pct(summary.completeness_pct),
            summary.duplicate_rows,
            summary.memory_usage_mb
        );

        body.push_str("<div class=\"section\"><h2>Data types</h2><table>");
        for (dtype, count) in &summary.dtype_counts {
            let _ = write!(
                body,
                "<tr><th>{}</th><td>{}</td></tr>",
                escape_html(dtype),
                count
            );
        }
        body.push_str("</table></div>");

        body.push_str(
            "<div class=\"section\"><h2>Missing values</h2><table>\
             <tr><th>Column</th><th>Missing</th><th>Percent</th></tr>",
        );
        for missing in &report.missing_analysis {
            let _ = write!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{:.2}%</td></tr>",
                escape_html(&missing.column),
                missing.missing,
                missing.percentage
            );
        }
        body.push_str("</table></div>");

        if let Some(stats) = &report.numeric_statistics {
            body.push_str(
                "<div class=\"section\"><h2>Numeric statistics</h2><table><tr>\
                 <th>Column</th><th>Min</th><th>Max</th><th>Mean</th><th>Median</th>\
                 <th>Std</th><th>Q1</th><th>Q3</th></tr>",
            );
            for row in stats {
                let _ = write!(
                    body,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
                     <td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(&row.column),
                    fmt_num(row.min),
                    fmt_num(row.max),
                    fmt_num(row.mean),
                    fmt_num(row.median),
                    fmt_num(row.std),
                    fmt_num(row.q1),
                    fmt_num(row.q3)
                );
            }
            body.push_str("</table></div>");
        }

        if let Some(matrix) = &report.correlations {
            body.push_str("<div class=\"section\"><h2>Correlations</h2><table><tr><th></th>");
            for name in &matrix.columns {
                let _ = write!(body, "<th>{}</th>", escape_html(name));
            }
            body.push_str("</tr>");
            for (name, row) in matrix.columns.iter().zip(&matrix.values) {
                let _ = write!(body, "<tr><th>{}</th>", escape_html(name));
                for value in row {
                    let cell = value.map_or_else(|| "n/a".to_string(), |r| format!("{:.3}", r));
                    let _ = write!(body, "<td>{}</td>", cell);
                }
                body.push_str("</tr>");
            }
            body.push_str("</table></div>");
        }

        if !report.cleaning_steps.is_empty() {
            body.push_str("<div class=\"section\"><h2>Cleaning steps</h2><ol>");
            for step in &report.cleaning_steps {
                let _ = write!(
                    body,
                    "<li><strong>{}</strong>: {}</li>",
                    step.action_type.display_name(),
                    escape_html(&step.message)
                );
            }
            body.push_str("</ol></div>");
        }

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
             <title>Analysis report - {title}</title>\n<style>\n\
             body {{ font-family: sans-serif; margin: 2em; color: #222; }}\n\
             .section {{ margin-bottom: 2em; }}\n\
             table {{ border-collapse: collapse; }}\n\
             th, td {{ border: 1px solid #ccc; padding: 4px 8px; text-align: left; }}\n\
             </style>\n</head>\n<body>\n\
             <h1>Data analysis report</h1>\n\
             <p>File: {title}<br>Generated: {date}</p>\n{body}\n</body>\n</html>\n",
            title = title,
            date = escape_html(&report.generated_at),
            body = body
        )
    }

    /// Write `report` as `<name>_report.<ext>` in the output directory.
    ///
    /// The name is the configured output name, or the stem of the source name.
    pub fn write_report(&self, report: &AnalysisReport, format: ReportFormat) -> Result<PathBuf> {
        let rendered = Self::render(report, format)?;
        let base = self.output_name.clone().unwrap_or_else(|| {
            Path::new(&report.source_name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "dataset".to_string())
        });

        fs::create_dir_all(&self.output_dir)?;
        let report_path = self
            .output_dir
            .join(format!("{}_report.{}", base, format.extension()));
        fs::write(&report_path, rendered).map_err(|e| {
            AnalysisError::ReportGenerationFailed(format!("{}: {}", report_path.display(), e))
        })?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}

fn contamination_remark(profile: &ColumnProfile) -> Option<(&str, &str)> {
    match profile {
        ColumnProfile::Quantitative {
            name,
            statistics: NumericStatistics::Contaminated { remark },
            ..
        } => Some((name.as_str(), remark.as_str())),
        _ => None,
    }
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
        .max("Column".len())
}

fn fmt_num(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
