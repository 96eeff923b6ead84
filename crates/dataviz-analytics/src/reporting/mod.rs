//! Report generation module.
//!
//! [`AnalysisReport`] is the serializable bundle of everything known about a
//! dataset: summary, per-column missing analysis, column profiles, the
//! numeric statistics table, the correlation matrix and the cleaning history.
//! [`ReportGenerator`] renders it as plain text, HTML or JSON and writes it
//! to disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use dataviz_analytics::reporting::{AnalysisReport, ReportFormat, ReportGenerator};
//!
//! let report = AnalysisReport::build("sales.csv", &df, &config)?;
//!
//! // Print as JSON
//! println!("{}", ReportGenerator::render(&report, ReportFormat::Json)?);
//!
//! // Or write to file
//! let generator = ReportGenerator::new(PathBuf::from("output"), None);
//! generator.write_report(&report, ReportFormat::Html)?;
//! ```

mod generator;

pub use generator::{AnalysisReport, ReportFormat, ReportGenerator};
