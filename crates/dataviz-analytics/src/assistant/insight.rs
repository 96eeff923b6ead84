//! Deterministic answers computed straight from the dataset.
//!
//! This is the last step of the answer chain, used when the rule cascade
//! declined a question and no external provider produced text. Routing is a
//! plain substring scan over bilingual keywords, and every answer ends with
//! an actionable tip.

use crate::cleaner::count_outliers;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::estimator::estimate_post_cleaning_rows_with;
use crate::profiler::{ColumnProfiler, statistics};
use crate::summary::{correlation_matrix, summarize_with};
use crate::types::{DatasetProfile, DatasetSummary};
use crate::utils;
use polars::prelude::*;
use tracing::warn;

const NO_DATA: &str = "No data available. Load a dataset first.";

const MAX_TREND_COLUMNS: usize = 3;
const MAX_STAT_COLUMNS: usize = 5;
const MAX_DISTRIBUTION_COLUMNS: usize = 3;
const MAX_CORRELATIONS: usize = 5;
const MAX_LISTED_COLUMNS: usize = 5;
const TREND_CHANGE_PCT: f64 = 5.0;

const ROW_WORDS: &[&str] = &["ligne", "row", "observation", "record"];
const COLUMN_WORDS: &[&str] = &["colonne", "column", "variable", "feature"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Counts,
    Columns,
    Missing,
    Duplicates,
    Trends,
    Statistics,
    Distribution,
    Correlation,
    Outliers,
    Advice,
    AfterCleaning,
    Visualization,
    Prediction,
    Quality,
    Types,
    General,
}

/// Checked in order; the first topic with a keyword inside the question wins.
const ROUTES: &[(Topic, &[&str])] = &[
    (Topic::Counts, &["combien", "nombre", "how many", "total", "count"]),
    (Topic::Columns, &["colonne", "column", "variable", "feature", "champ"]),
    (Topic::Missing, &["manquant", "null", "missing", "vide", "empty", "nan"]),
    (Topic::Duplicates, &["duplic", "doublon", "répété", "identique"]),
    (
        Topic::Trends,
        &["tendance", "trend", "évolution", "progression", "changement", "variation"],
    ),
    (
        Topic::Statistics,
        &["moyen", "mean", "average", "stats", "statisti", "résumé", "summary"],
    ),
    (Topic::Distribution, &["distrib", "répartition", "spread", "dispersion"]),
    (Topic::Correlation, &["corr", "relation", "lien", "association", "dépend"]),
    (Topic::Outliers, &["outlier", "aberrant", "extrême", "anomalie"]),
    (
        Topic::Advice,
        &[
            "conseil", "advice", "améliorer", "ameliorer", "suggestion", "recommandation",
            "comment", "aide", "help", "mieux", "better", "optimiser", "optimize",
        ],
    ),
    (
        Topic::AfterCleaning,
        &[
            "rester", "restent", "resteront", "après", "after", "nettoyage", "cleaning",
            "suppression", "remove",
        ],
    ),
    (
        Topic::Visualization,
        &["visuali", "graphique", "plot", "chart", "diagramme", "courbe"],
    ),
    (
        Topic::Prediction,
        &["prédict", "modèle", "predict", "régression", "classification", "machine learning"],
    ),
    (
        Topic::Quality,
        &["qualité", "quality", "nettoyer", "clean", "problème", "issue"],
    ),
    (Topic::Types, &["type", "dtype", "format", "nature"]),
    (
        Topic::General,
        &["quoi", "what", "tell", "dis", "info", "donne", "aperçu", "overview"],
    ),
];

fn route(question: &str) -> Option<Topic> {
    ROUTES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| question.contains(k)))
        .map(|(topic, _)| *topic)
}

/// Answer `question` from the dataset alone. Never fails.
pub fn generate_local_insight(question: &str, df: &DataFrame, config: &AnalysisConfig) -> String {
    if df.height() == 0 || df.width() == 0 {
        return NO_DATA.to_string();
    }

    let lowered = question.trim().to_lowercase();
    match Insight::gather(df, config).and_then(|insight| insight.respond(&lowered)) {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "local insight failed");
            "Analysis failed on this dataset. Tip: check that the file is well formed and reload it."
                .to_string()
        }
    }
}

/// Everything one answer may need, computed once.
struct Insight<'a> {
    df: &'a DataFrame,
    config: &'a AnalysisConfig,
    summary: DatasetSummary,
    profile: DatasetProfile,
}

impl<'a> Insight<'a> {
    fn gather(df: &'a DataFrame, config: &'a AnalysisConfig) -> Result<Self> {
        Ok(Self {
            df,
            config,
            summary: summarize_with(df, config)?,
            profile: ColumnProfiler::new(config).profile(df)?,
        })
    }

    /// `question` is already lowercased.
    fn respond(&self, question: &str) -> Result<String> {
        let Some(topic) = route(question) else {
            return Ok(self.fallback());
        };
        match topic {
            Topic::Counts => Ok(self.counts(question)),
            Topic::Columns => Ok(self.columns()),
            Topic::Missing => Ok(self.missing()),
            Topic::Duplicates => Ok(self.duplicates()),
            Topic::Trends => self.trends(),
            Topic::Statistics => Ok(self.statistics()),
            Topic::Distribution => self.distribution(),
            Topic::Correlation => self.correlation(),
            Topic::Outliers => self.outliers(),
            Topic::Advice => self.advice(),
            Topic::AfterCleaning => self.after_cleaning(),
            Topic::Visualization => Ok("Visualization: scatter, line, bar, histogram, box and \
                violin plots are available.\nTip: start with a histogram to see distributions, \
                then a scatter plot for correlations."
                .to_string()),
            Topic::Prediction => Ok("Prediction: a random forest handles both regression and \
                classification.\nTip: clean the data and pick a relevant target column before \
                training."
                .to_string()),
            Topic::Quality => Ok(self.quality()),
            Topic::Types => Ok(self.types()),
            Topic::General => Ok(self.general()),
        }
    }

    fn numeric_names(&self) -> Vec<&str> {
        self.profile.computed_numeric().map(|(name, _)| name).collect()
    }

    fn column_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(utils::numeric_values(
            self.df.column(name)?.as_materialized_series(),
        )?)
    }

    fn total_outliers(&self) -> Result<Vec<(String, usize)>> {
        let mut per_column = Vec::new();
        for name in self.numeric_names() {
            let values: Vec<f64> = self.column_values(name)?.into_iter().flatten().collect();
            per_column.push((
                name.to_string(),
                count_outliers(&values, self.config.iqr_multiplier),
            ));
        }
        Ok(per_column)
    }

    fn missing_pct(&self) -> f64 {
        self.summary.missing_pct.unwrap_or(0.0)
    }

    fn counts(&self, question: &str) -> String {
        let rows = self.summary.rows;
        let columns = self.summary.columns;
        if ROW_WORDS.iter().any(|w| question.contains(w)) {
            return format!(
                "The dataset has {} rows. Tip: with few rows, consider collecting more samples \
                 for robust analyses.",
                rows
            );
        }
        if COLUMN_WORDS.iter().any(|w| question.contains(w)) {
            return format!(
                "The dataset has {} columns. Tip: the analysis view shows the type of each column.",
                columns
            );
        }
        let size = if rows < 1000 {
            "small"
        } else if rows < 10_000 {
            "medium"
        } else {
            "large"
        };
        format!(
            "{} rows x {} columns. Tip: this is a {} dataset.",
            rows, columns, size
        )
    }

    fn columns(&self) -> String {
        let names = &self.summary.column_names;
        let mut listed = names
            .iter()
            .take(MAX_LISTED_COLUMNS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        if names.len() > MAX_LISTED_COLUMNS {
            listed.push_str(&format!(", ... ({} more)", names.len() - MAX_LISTED_COLUMNS));
        }
        format!(
            "Columns: {}\n{} quantitative, {} qualitative. Tip: quantitative columns work \
             best for charts and predictions.",
            listed,
            self.summary.type_histogram.quantitative,
            self.summary.type_histogram.qualitative
        )
    }

    fn missing(&self) -> String {
        if self.summary.missing_total == 0 {
            return "No missing values, the data is complete. Tip: you can go straight to \
                    the analysis."
                .to_string();
        }
        let mut affected: Vec<_> = self.summary.columns_with_missing().collect();
        affected.sort_by(|a, b| b.missing.cmp(&a.missing));
        let top = affected
            .iter()
            .take(3)
            .map(|c| format!("{}: {} ({:.1}%)", c.column, c.missing, c.percentage))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} missing values ({:.1}%). Top columns: {}. Tip: fill them with the mean or \
             median, or drop the affected rows.",
            self.summary.missing_total,
            self.missing_pct(),
            top
        )
    }

    fn duplicates(&self) -> String {
        if self.summary.duplicate_rows == 0 {
            return "No duplicate rows detected. Tip: no deduplication needed.".to_string();
        }
        format!(
            "{} duplicate rows ({:.1}%). Tip: remove them with the deduplication step.",
            self.summary.duplicate_rows,
            self.summary.duplicate_pct()
        )
    }

    fn trends(&self) -> Result<String> {
        let names = self.numeric_names();
        if names.is_empty() {
            return Ok("No numeric columns to analyse trends. Tip: convert text columns to \
                       numbers first where possible."
                .to_string());
        }

        let mut lines = Vec::new();
        for name in names.into_iter().take(MAX_TREND_COLUMNS) {
            let Some(change) = statistics::half_change_pct(&self.column_values(name)?) else {
                continue;
            };
            let label = if change > TREND_CHANGE_PCT {
                "increasing"
            } else if change < -TREND_CHANGE_PCT {
                "decreasing"
            } else {
                "stable"
            };
            lines.push(format!("{}: {:+.1}% ({})", name, change, label));
        }

        if lines.is_empty() {
            return Ok("No significant trend detected. Tip: check that rows are in \
                       chronological order."
                .to_string());
        }
        Ok(format!(
            "Detected trends:\n{}\nTip: a line chart shows the evolution over time.",
            lines.join("\n")
        ))
    }

    fn statistics(&self) -> String {
        let lines: Vec<String> = self
            .profile
            .computed_numeric()
            .take(MAX_STAT_COLUMNS)
            .filter_map(|(name, s)| {
                Some(format!(
                    "{}: mean={:.2} ± {:.2}, [{:.2}, {:.2}]",
                    name,
                    s.mean?,
                    s.std.unwrap_or(0.0),
                    s.min?,
                    s.max?
                ))
            })
            .collect();

        if lines.is_empty() {
            return "No numeric columns. Tip: the profile lists statistics for text columns."
                .to_string();
        }
        format!(
            "Main statistics:\n{}\nTip: the full profile has every detail per column.",
            lines.join("\n")
        )
    }

    fn distribution(&self) -> Result<String> {
        let names = self.numeric_names();
        if names.is_empty() {
            return Ok("No numeric columns. Tip: a histogram shows how categories are spread."
                .to_string());
        }

        let mut lines = Vec::new();
        for name in names.into_iter().take(MAX_DISTRIBUTION_COLUMNS) {
            let values: Vec<f64> = self.column_values(name)?.into_iter().flatten().collect();
            let Some(skew) = statistics::skewness(&values) else {
                continue;
            };
            if skew.abs() > 1.0 {
                let degree = if skew.abs() > 2.0 { "highly skewed" } else { "skewed" };
                let side = if skew > 0.0 { "right" } else { "left" };
                lines.push(format!("{}: {} to the {} (skewness={:.2})", name, degree, side, skew));
            } else {
                lines.push(format!("{}: symmetric distribution", name));
            }
        }

        if lines.is_empty() {
            return Ok("Not enough values to judge the distribution. Tip: clean extreme \
                       values first."
                .to_string());
        }
        Ok(format!(
            "{}\nTip: a box plot makes outliers visible.",
            lines.join("\n")
        ))
    }

    fn correlation(&self) -> Result<String> {
        let Some(matrix) = correlation_matrix(self.df, &self.profile)? else {
            return Ok("At least 2 numeric columns are needed. Tip: add numeric variables \
                       or encode categorical ones."
                .to_string());
        };

        let pairs = matrix.notable_pairs(0.3);
        if pairs.is_empty() {
            return Ok("No significant correlation (|r| > 0.3). Tip: independent variables \
                       are useful for modelling."
                .to_string());
        }
        let lines: Vec<String> = pairs
            .iter()
            .take(MAX_CORRELATIONS)
            .map(|p| {
                format!(
                    "{} <-> {}: {:.3} ({} {})",
                    p.first,
                    p.second,
                    p.coefficient,
                    p.strength(),
                    p.direction()
                )
            })
            .collect();
        Ok(format!(
            "Detected correlations:\n{}\nTip: a scatter plot shows these relationships.",
            lines.join("\n")
        ))
    }

    fn outliers(&self) -> Result<String> {
        if self.numeric_names().is_empty() {
            return Ok("No numeric columns. Tip: outliers can only be detected in numeric \
                       data."
                .to_string());
        }

        let per_column = self.total_outliers()?;
        let total: usize = per_column.iter().map(|(_, n)| n).sum();
        if total == 0 {
            return Ok("No outliers detected in the numeric columns. Tip: the data is ready \
                       for statistical analysis."
                .to_string());
        }

        let detail: Vec<String> = per_column
            .iter()
            .filter(|(_, n)| *n > 0)
            .take(5)
            .map(|(name, n)| format!("{}: {} outliers", name, n))
            .collect();
        Ok(format!(
            "Total outliers: {}\nPer column:\n{}\nTip: {} extreme values detected; remove \
             them with the outlier step.",
            total,
            detail.join("\n"),
            total
        ))
    }

    fn advice(&self) -> Result<String> {
        let mut problems = Vec::new();
        let mut suggestions = Vec::new();

        if self.summary.missing_total > 0 {
            problems.push(format!(
                "- {} missing values ({:.1}%)",
                self.summary.missing_total,
                self.missing_pct()
            ));
            suggestions.push("- Fill with the mean or median, or drop incomplete rows");
        }
        if self.summary.duplicate_rows > 0 {
            problems.push(format!(
                "- {} duplicates ({:.1}%)",
                self.summary.duplicate_rows,
                self.summary.duplicate_pct()
            ));
            suggestions.push("- Remove them with the deduplication step");
        }
        let outliers: usize = self.total_outliers()?.iter().map(|(_, n)| n).sum();
        if outliers > 0 {
            problems.push(format!("- {} outliers detected", outliers));
            suggestions.push("- Handle extreme values with the outlier step");
        }
        let histogram = self.summary.type_histogram;
        if histogram.qualitative > 0 && histogram.quantitative == 0 {
            problems.push("- No numeric column".to_string());
            suggestions.push("- Encode text columns for numeric analyses");
        }

        if problems.is_empty() {
            suggestions = vec![
                "- Build charts to explore the data",
                "- Train a prediction model",
                "- Look at correlations between variables",
                "- Export the cleaned results",
            ];
        }

        let mut text = String::from("Tips to improve your analysis:\n\n");
        if !problems.is_empty() {
            text.push_str("Issues found:\n");
            text.push_str(&problems.join("\n"));
            text.push_str("\n\n");
        }
        text.push_str("Suggestions:\n");
        text.push_str(&suggestions.join("\n"));
        Ok(text)
    }

    fn after_cleaning(&self) -> Result<String> {
        let estimate = estimate_post_cleaning_rows_with(self.df, self.config)?;
        Ok(format!(
            "Estimated rows after cleaning:\n\n\
             - Original rows: {}\n\
             - After removing duplicates: {} (-{})\n\
             - After handling missing values: ~{} (-{})\n\
             - After handling outliers: ~{}\n\n\
             About {} rows should remain after a full cleaning pass.\n\
             Tip: the cleaning steps apply these transformations automatically.",
            estimate.original,
            estimate.after_dedup,
            estimate.duplicates,
            estimate.after_missing_handling,
            estimate.sparse_rows,
            estimate.after_outliers,
            estimate.after_outliers
        ))
    }

    /// `100 - missing% - duplicate%`.
    fn quality_score(&self) -> f64 {
        100.0 - self.missing_pct() - self.summary.duplicate_pct()
    }

    fn quality(&self) -> String {
        let score = self.quality_score();
        let verdict = if score > 80.0 {
            "Excellent quality, you can go ahead with the analysis."
        } else if score > 60.0 {
            "Good quality with some room for improvement."
        } else {
            "Quality needs work: run the cleaning steps."
        };
        format!(
            "Data quality: {:.1}/100\n- {:.1}% missing values\n- {} duplicates\nTip: {}",
            score,
            self.missing_pct(),
            self.summary.duplicate_rows,
            verdict
        )
    }

    fn types(&self) -> String {
        let breakdown = self
            .summary
            .dtype_counts
            .iter()
            .map(|(dtype, count)| format!("{} columns {}", count, dtype))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Data types: {}\nTip: text columns must be encoded before numeric prediction.",
            breakdown
        )
    }

    fn general(&self) -> String {
        format!(
            "Dataset overview:\n\
             - {} rows x {} columns\n\
             - {} quantitative columns, {} qualitative columns\n\
             - {:.1}% missing values\n\
             - {} duplicates\n\n\
             Tip: recommended next steps:\n\
             1. Clean the data if needed\n\
             2. Explore it with charts\n\
             3. Train a prediction model",
            self.summary.rows,
            self.summary.columns,
            self.summary.type_histogram.quantitative,
            self.summary.type_histogram.qualitative,
            self.missing_pct(),
            self.summary.duplicate_rows
        )
    }

    fn fallback(&self) -> String {
        format!(
            "{} rows x {} columns loaded.\n\n\
             I can answer questions about:\n\
             - trends\n\
             - statistics and averages\n\
             - correlations between variables\n\
             - data quality\n\
             - outlier detection\n\n\
             Tip: try 'What is the trend?', 'Are there correlations?' or 'Data quality?'",
            self.summary.rows, self.summary.columns
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(question: &str, df: &DataFrame) -> String {
        generate_local_insight(question, df, &AnalysisConfig::default())
    }

    fn sales() -> DataFrame {
        df![
            "price" => [10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
            "units" => [6i64, 5, 4, 3, 2, 1],
            "city" => ["Paris", "Lyon", "Paris", "Nice", "Lyon", "Paris"],
        ]
        .unwrap()
    }

    // ==================== routing tests ====================

    #[test]
    fn test_route_order() {
        assert_eq!(route("how many rows"), Some(Topic::Counts));
        assert_eq!(route("which columns are there"), Some(Topic::Columns));
        assert_eq!(route("valeurs manquantes"), Some(Topic::Missing));
        assert_eq!(route("y a-t-il une corrélation"), Some(Topic::Correlation));
        assert_eq!(route("predict sales"), Some(Topic::Prediction));
        assert_eq!(route("zzz"), None);
    }

    #[test]
    fn test_route_first_topic_wins() {
        // "count" outranks "missing".
        assert_eq!(route("count missing cells"), Some(Topic::Counts));
    }

    // ==================== answer tests ====================

    #[test]
    fn test_empty_dataset() {
        assert_eq!(ask("anything", &DataFrame::empty()), NO_DATA);
    }

    #[test]
    fn test_counts() {
        let text = ask("how many cells in total", &sales());
        assert!(text.contains("6 rows x 3 columns"));
        assert!(text.contains("small"));
    }

    #[test]
    fn test_counts_rows_only() {
        let text = ask("combien de lignes", &sales());
        assert!(text.starts_with("The dataset has 6 rows."));
        assert!(!text.contains("columns"));

        let text = ask("How many observations?", &sales());
        assert!(text.starts_with("The dataset has 6 rows."));
    }

    #[test]
    fn test_counts_columns_only() {
        let text = ask("nombre de colonnes", &sales());
        assert!(text.starts_with("The dataset has 3 columns."));
        assert!(!text.contains("rows"));

        let text = ask("how many features", &sales());
        assert!(text.starts_with("The dataset has 3 columns."));
    }

    #[test]
    fn test_trends() {
        let text = ask("any trend here?", &sales());
        assert!(text.contains("price: +150.0% (increasing)"));
        assert!(text.contains("units: -60.0% (decreasing)"));
        assert!(text.contains("Tip:"));
    }

    #[test]
    fn test_statistics() {
        let text = ask("give me the stats", &sales());
        assert!(text.contains("price: mean=35.00"));
        assert!(text.contains("[10.00, 60.00]"));
    }

    #[test]
    fn test_correlation() {
        let text = ask("correlation?", &sales());
        assert!(text.contains("price <-> units: -1.000 (very strong negative)"));
    }

    #[test]
    fn test_outliers() {
        let df = df!["x" => [10.0, 12.0, 11.0, 13.0, 1000.0]].unwrap();
        let text = ask("outliers?", &df);
        assert!(text.contains("Total outliers: 1"));
        assert!(text.contains("x: 1 outliers"));
    }

    #[test]
    fn test_quality_score() {
        let df = df![
            "a" => [Some(1i64), Some(1), None, Some(4)],
            "b" => [Some("x"), Some("x"), Some("y"), Some("z")],
        ]
        .unwrap();
        // 1/8 missing cells and 1/4 duplicate rows.
        let text = ask("quality?", &df);
        assert!(text.contains("Data quality: 62.5/100"));
        assert!(text.contains("Good quality"));
    }

    #[test]
    fn test_after_cleaning_estimate() {
        let df = df![
            "a" => [1i64, 1, 2, 3],
            "b" => ["x", "x", "y", "z"],
        ]
        .unwrap();
        let text = ask("how much will remain after that?", &df);
        assert!(text.contains("Original rows: 4"));
        assert!(text.contains("After removing duplicates: 3 (-1)"));
    }

    #[test]
    fn test_types_breakdown() {
        let text = ask("dtype?", &sales());
        assert!(text.contains("1 columns f64"));
        assert!(text.contains("1 columns str"));
    }

    #[test]
    fn test_fallback_mentions_shape() {
        let text = ask("zzz", &sales());
        assert!(text.contains("6 rows x 3 columns loaded"));
    }

    #[test]
    fn test_advice_without_problems() {
        let text = ask("any advice?", &sales());
        assert!(!text.contains("Issues found"));
        assert!(text.contains("Train a prediction model"));
    }
}
