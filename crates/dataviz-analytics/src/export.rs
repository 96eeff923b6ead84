//! Export of cleaned datasets.

use crate::error::{AnalysisError, Result};
use crate::summary::summarize;
use crate::types::DatasetSummary;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Figures describing an exported dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportInfo {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    /// Column name to dtype name.
    pub dtypes: BTreeMap<String, String>,
    pub missing_total: usize,
    /// Rounded to two decimals; `None` for an empty dataset.
    pub missing_pct: Option<f64>,
    pub duplicates: usize,
    pub completeness_pct: Option<f64>,
}

impl ExportInfo {
    pub fn new(df: &DataFrame, summary: &DatasetSummary) -> Self {
        Self {
            rows: summary.rows,
            columns: summary.columns,
            column_names: summary.column_names.clone(),
            dtypes: df
                .get_columns()
                .iter()
                .map(|c| (c.name().to_string(), c.dtype().to_string()))
                .collect(),
            missing_total: summary.missing_total,
            missing_pct: summary.missing_pct.map(round2),
            duplicates: summary.duplicate_rows,
            completeness_pct: summary.completeness_pct.map(round2),
        }
    }
}

/// Paths written by [`write_export`].
#[derive(Debug, Clone, Serialize)]
pub struct ExportedFiles {
    pub data_path: PathBuf,
    pub summary_path: PathBuf,
    pub info: ExportInfo,
}

/// Serialize `df` as CSV with a header row.
pub fn to_csv_string(df: &DataFrame) -> Result<String> {
    let mut buffer = Vec::new();
    let mut df = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)?;
    String::from_utf8(buffer)
        .map_err(|e| AnalysisError::Internal(format!("CSV output is not UTF-8: {}", e)))
}

/// Two-column `Metric`/`Value` sheet with the headline figures of `summary`.
pub fn summary_sheet(summary: &DatasetSummary) -> Result<DataFrame> {
    let metrics = ["Rows", "Columns", "Missing values", "Completeness (%)"];
    let values = [
        Some(summary.rows as f64),
        Some(summary.columns as f64),
        Some(summary.missing_total as f64),
        summary.completeness_pct.map(round2),
    ];

    Ok(DataFrame::new(vec![
        Series::new("Metric".into(), metrics.as_slice()).into(),
        Series::new("Value".into(), values.as_slice()).into(),
    ])?)
}

/// Write `<name>.csv` and `<name>_summary.csv` into `dir`.
pub fn write_export(df: &DataFrame, dir: &Path, name: &str) -> Result<ExportedFiles> {
    let summary = summarize(df)?;
    fs::create_dir_all(dir)?;

    let data_path = dir.join(format!("{}.csv", name));
    write_csv(&mut df.clone(), &data_path)?;

    let summary_path = dir.join(format!("{}_summary.csv", name));
    write_csv(&mut summary_sheet(&summary)?, &summary_path)?;

    info!(
        "Exported {} rows to {} (summary: {})",
        df.height(),
        data_path.display(),
        summary_path.display()
    );

    Ok(ExportedFiles {
        data_path,
        summary_path,
        info: ExportInfo::new(df, &summary),
    })
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;
    Ok(())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df![
            "a" => [Some(1i64), Some(1), None],
            "b" => ["x", "x", "y"],
        ]
        .unwrap()
    }

    #[test]
    fn test_to_csv_string() {
        let csv = to_csv_string(&df!["a" => [1i64, 2], "b" => ["x", "y"]].unwrap()).unwrap();
        assert_eq!(csv, "a,b\n1,x\n2,y\n");
    }

    #[test]
    fn test_summary_sheet_rows() {
        let summary = summarize(&sample()).unwrap();
        let sheet = summary_sheet(&summary).unwrap();
        assert_eq!(sheet.shape(), (4, 2));

        let metrics = sheet.column("Metric").unwrap().str().unwrap();
        assert_eq!(metrics.get(3), Some("Completeness (%)"));

        let values = sheet.column("Value").unwrap().f64().unwrap();
        assert_eq!(values.get(0), Some(3.0));
        assert_eq!(values.get(2), Some(1.0));
        assert_eq!(values.get(3), Some(83.33));
    }

    #[test]
    fn test_export_info() {
        let df = sample();
        let info = ExportInfo::new(&df, &summarize(&df).unwrap());
        assert_eq!(info.rows, 3);
        assert_eq!(info.column_names, vec!["a", "b"]);
        assert_eq!(info.missing_total, 1);
        assert_eq!(info.missing_pct, Some(16.67));
        assert_eq!(info.completeness_pct, Some(83.33));
        assert_eq!(info.dtypes.get("b").map(String::as_str), Some("str"));
    }

    #[test]
    fn test_write_export_creates_both_files() {
        let dir = std::env::temp_dir().join(format!("dataviz-export-{}", std::process::id()));
        let files = write_export(&sample(), &dir, "cleaned").unwrap();

        assert_eq!(files.data_path, dir.join("cleaned.csv"));
        assert_eq!(files.summary_path, dir.join("cleaned_summary.csv"));
        let summary = fs::read_to_string(&files.summary_path).unwrap();
        assert!(summary.starts_with("Metric,Value\n"));
        assert!(summary.contains("Missing values,1"));
        fs::remove_dir_all(dir).unwrap();
    }
}
