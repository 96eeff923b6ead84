//! Dataset loading.
//!
//! CSV is the only readable format. Malformed files go through a series of
//! increasingly lenient read strategies before giving up.

use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

const SCHEMA_INFERENCE_ROWS: usize = 100;

/// Load the dataset at `path`, dispatching on the file extension.
///
/// # Errors
/// - `Io` if the file cannot be read
/// - `UnsupportedFormat` for Excel and unknown extensions, or when every CSV
///   strategy fails
pub fn load_dataset(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => {
            let bytes = fs::read(path)?;
            let df = load_csv_bytes(&bytes).map_err(|e| match e {
                AnalysisError::UnsupportedFormat(reason) => {
                    AnalysisError::UnsupportedFormat(format!("{}: {}", path.display(), reason))
                }
                other => other,
            })?;
            info!(
                "Loaded {} ({} rows x {} columns)",
                path.display(),
                df.height(),
                df.width()
            );
            Ok(df)
        }
        "xlsx" | "xls" => Err(AnalysisError::UnsupportedFormat(format!(
            "{}: Excel workbooks are not supported, export the sheet as CSV",
            path.display()
        ))),
        "" => Err(AnalysisError::UnsupportedFormat(format!(
            "{}: missing file extension",
            path.display()
        ))),
        other => Err(AnalysisError::UnsupportedFormat(format!(
            "{}: unknown extension '.{}'",
            path.display(),
            other
        ))),
    }
}

/// Parse CSV content already held in memory, such as an upload.
pub fn load_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    // Strategy 1: standard loading with quote handling
    match read_csv(bytes.to_vec(), true) {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    // Strategy 2: without quote handling
    match read_csv(bytes.to_vec(), false) {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Loading without quotes failed: {}", e),
    }

    // Strategy 3: pre-clean content
    let cleaned = clean_csv_content(&String::from_utf8_lossy(bytes));
    read_csv(cleaned.into_bytes(), true)
        .map_err(|e| AnalysisError::UnsupportedFormat(format!("unreadable CSV: {}", e)))
}

fn read_csv(content: Vec<u8>, quoted: bool) -> PolarsResult<DataFrame> {
    let mut options = CsvReadOptions::default()
        .with_infer_schema_length(Some(SCHEMA_INFERENCE_ROWS))
        .with_has_header(true);
    if !quoted {
        options = options.with_parse_options(CsvParseOptions::default().with_quote_char(None));
    }
    options.into_reader_with_file_handle(Cursor::new(content)).finish()
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
