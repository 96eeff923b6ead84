use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Column profiles
// ============================================================================

/// Direction of a column's values between the first and second half of the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive statistics for a quantitative column.
///
/// Every statistic is `None` when it does not apply (no values, or a single
/// value for `std`). A constant column reports `std == Some(0.0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    /// Number of non-missing values the statistics were computed from.
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation (ddof = 1).
    pub std: Option<f64>,
    pub q1: Option<f64>,
    pub q3: Option<f64>,
    pub trend: Trend,
}

/// Statistics payload of a quantitative column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NumericStatistics {
    Computed(NumericSummary),
    /// Conversion to numbers failed for part of the column.
    Contaminated { remark: String },
}

/// Coarse kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Quantitative,
    Qualitative,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quantitative => "quantitative",
            Self::Qualitative => "qualitative",
        }
    }
}

/// Derived, read-only view of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnProfile {
    Quantitative {
        name: String,
        missing_count: usize,
        statistics: NumericStatistics,
    },
    Qualitative {
        name: String,
        missing_count: usize,
        unique_count: usize,
        most_frequent: Option<String>,
    },
}

impl ColumnProfile {
    pub fn name(&self) -> &str {
        match self {
            Self::Quantitative { name, .. } | Self::Qualitative { name, .. } => name,
        }
    }

    pub fn missing_count(&self) -> usize {
        match self {
            Self::Quantitative { missing_count, .. } | Self::Qualitative { missing_count, .. } => {
                *missing_count
            }
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Quantitative { .. } => ColumnKind::Quantitative,
            Self::Qualitative { .. } => ColumnKind::Qualitative,
        }
    }

    /// Statistics of a quantitative column, unless it is contaminated.
    pub fn numeric_summary(&self) -> Option<&NumericSummary> {
        match self {
            Self::Quantitative {
                statistics: NumericStatistics::Computed(summary),
                ..
            } => Some(summary),
            _ => None,
        }
    }

    pub fn is_contaminated(&self) -> bool {
        matches!(
            self,
            Self::Quantitative {
                statistics: NumericStatistics::Contaminated { .. },
                ..
            }
        )
    }
}

/// Ordered collection of column profiles, in dataset column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub columns: Vec<ColumnProfile>,
}

impl DatasetProfile {
    pub fn get(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|p| p.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Quantitative columns whose statistics could be computed.
    pub fn computed_numeric(&self) -> impl Iterator<Item = (&str, &NumericSummary)> {
        self.columns
            .iter()
            .filter_map(|p| p.numeric_summary().map(|s| (p.name(), s)))
    }
}

// ============================================================================
// Dataset summary
// ============================================================================

/// Missing-value count for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub column: String,
    pub missing: usize,
    /// Share of rows that are missing, in percent (0 for an empty dataset).
    pub percentage: f64,
}

/// Number of quantitative and qualitative columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeHistogram {
    pub quantitative: usize,
    pub qualitative: usize,
}

/// Aggregate view of a dataset used by reports, exports and chat context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub missing_by_column: Vec<ColumnMissing>,
    pub missing_total: usize,
    pub duplicate_rows: usize,
    /// `100 - missing_total / (rows * columns) * 100`; `None` for an empty dataset.
    pub completeness_pct: Option<f64>,
    /// Share of missing cells in percent; `None` for an empty dataset.
    pub missing_pct: Option<f64>,
    pub type_histogram: TypeHistogram,
    /// Physical dtype name to number of columns.
    pub dtype_counts: BTreeMap<String, usize>,
    pub memory_usage_mb: f64,
}

impl DatasetSummary {
    /// Share of duplicate rows in percent (0 for an empty dataset).
    pub fn duplicate_pct(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.duplicate_rows as f64 / self.rows as f64 * 100.0
        }
    }

    /// Columns with at least one missing value, in dataset order.
    pub fn columns_with_missing(&self) -> impl Iterator<Item = &ColumnMissing> {
        self.missing_by_column.iter().filter(|c| c.missing > 0)
    }
}

// ============================================================================
// Cleaning estimate
// ============================================================================

/// Row counts after each stage of a hypothetical full cleaning pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleaningEstimate {
    pub original: usize,
    pub duplicates: usize,
    pub after_dedup: usize,
    pub sparse_rows: usize,
    pub after_missing_handling: usize,
    /// Damped outlier count, kept fractional.
    pub estimated_outlier_rows: f64,
    pub after_outliers: usize,
}

impl CleaningEstimate {
    /// Estimated share of rows that survive, in percent.
    pub fn retention_pct(&self) -> f64 {
        if self.original == 0 {
            0.0
        } else {
            self.after_outliers as f64 / self.original as f64 * 100.0
        }
    }
}

// ============================================================================
// Cleaning history
// ============================================================================

/// Types of cleaning actions recorded on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    DuplicatesRemoved,
    ValuesImputed,
    OutliersRemoved,
    /// The action was accepted but had nothing to do.
    NoChange,
}

impl ActionType {
    /// Get a human-readable display name for the action type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DuplicatesRemoved => "Duplicates Removed",
            Self::ValuesImputed => "Values Imputed",
            Self::OutliersRemoved => "Outliers Removed",
            Self::NoChange => "No Change",
        }
    }
}

/// A single cleaning step applied to a session's working dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningStep {
    pub action_type: ActionType,
    /// Column name, or "dataset" for whole-table actions.
    pub target: String,
    /// User-facing message describing the outcome.
    pub message: String,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl CleaningStep {
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        message: impl Into<String>,
        rows_before: usize,
        rows_after: usize,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            message: message.into(),
            rows_before,
            rows_after,
        }
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn computed(name: &str) -> ColumnProfile {
        ColumnProfile::Quantitative {
            name: name.to_string(),
            missing_count: 1,
            statistics: NumericStatistics::Computed(NumericSummary {
                count: 3,
                min: Some(1.0),
                max: Some(3.0),
                mean: Some(2.0),
                median: Some(2.0),
                std: Some(1.0),
                q1: Some(1.5),
                q3: Some(2.5),
                trend: Trend::Increasing,
            }),
        }
    }

    #[test]
    fn test_column_profile_accessors() {
        let profile = computed("price");
        assert_eq!(profile.name(), "price");
        assert_eq!(profile.missing_count(), 1);
        assert_eq!(profile.kind(), ColumnKind::Quantitative);
        assert!(profile.numeric_summary().is_some());
        assert!(!profile.is_contaminated());
    }

    #[test]
    fn test_contaminated_profile_has_no_summary() {
        let profile = ColumnProfile::Quantitative {
            name: "age".to_string(),
            missing_count: 0,
            statistics: NumericStatistics::Contaminated {
                remark: "non-numeric".to_string(),
            },
        };
        assert!(profile.is_contaminated());
        assert!(profile.numeric_summary().is_none());
    }

    #[test]
    fn test_dataset_profile_lookup() {
        let profile = DatasetProfile {
            columns: vec![
                computed("price"),
                ColumnProfile::Qualitative {
                    name: "city".to_string(),
                    missing_count: 0,
                    unique_count: 2,
                    most_frequent: Some("Paris".to_string()),
                },
            ],
        };

        assert_eq!(profile.len(), 2);
        assert!(profile.get("city").is_some());
        assert!(profile.get("missing").is_none());
        let numeric: Vec<&str> = profile.computed_numeric().map(|(n, _)| n).collect();
        assert_eq!(numeric, vec!["price"]);
    }

    #[test]
    fn test_profile_serialization_is_tagged() {
        let json = serde_json::to_string(&computed("price")).unwrap();
        assert!(json.contains(r#""kind":"quantitative""#));
        assert!(json.contains(r#""status":"computed""#));
        assert!(json.contains(r#""trend":"increasing""#));
    }

    #[test]
    fn test_cleaning_step_rows_removed() {
        let step = CleaningStep::new(ActionType::DuplicatesRemoved, "dataset", "1 removed", 3, 2);
        assert_eq!(step.rows_removed(), 1);
        assert_eq!(step.action_type.display_name(), "Duplicates Removed");
    }

    #[test]
    fn test_retention_pct_empty() {
        let estimate = CleaningEstimate {
            original: 0,
            duplicates: 0,
            after_dedup: 0,
            sparse_rows: 0,
            after_missing_handling: 0,
            estimated_outlier_rows: 0.0,
            after_outliers: 0,
        };
        assert_eq!(estimate.retention_pct(), 0.0);
    }
}
