//! Rule-based question answering over a loaded dataset.
//!
//! Questions are normalized, tokenized and run through an ordered cascade of
//! keyword rules. Keyword tests tolerate typos with an edit-distance ratio,
//! and keywords are bilingual (French and English). Answers are deterministic
//! templates filled from an [`AnswerContext`].
//!
//! A question no rule accepts yields [`Unrecognized`], which callers hand to
//! the fallback chain in [`crate::assistant`].

mod context;
mod keywords;
mod question;
mod rules;

pub use context::AnswerContext;
pub use question::{Question, similarity};

use crate::config::AnalysisConfig;
use rules::{Probe, RULES};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Classified purpose of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Thanks,
    Trend,
    RowCount,
    ColumnCount,
    MissingValues,
    Duplicates,
    Mean,
    Min,
    Max,
    MinMax,
    Std,
    Median,
    Summary,
    CleaningAdvice,
    Visualization,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Thanks => "thanks",
            Self::Trend => "trend",
            Self::RowCount => "row_count",
            Self::ColumnCount => "column_count",
            Self::MissingValues => "missing_values",
            Self::Duplicates => "duplicates",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::MinMax => "min_max",
            Self::Std => "std",
            Self::Median => "median",
            Self::Summary => "summary",
            Self::CleaningAdvice => "cleaning_advice",
            Self::Visualization => "visualization",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A templated answer and the intent that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedAnswer {
    pub intent: Intent,
    pub text: String,
}

/// Why the matcher declined a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnrecognizedReason {
    /// No keyword rule matched.
    NoMatch,
    /// A rule matched but the question needs more than a template
    /// (a prediction with parameters).
    Deferred(Intent),
}

/// Control-flow signal: the matcher cannot answer this question locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unrecognized {
    pub question: String,
    pub reason: UnrecognizedReason,
}

impl fmt::Display for Unrecognized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            UnrecognizedReason::NoMatch => write!(f, "unrecognized question: {}", self.question),
            UnrecognizedReason::Deferred(intent) => {
                write!(f, "{} question deferred: {}", intent, self.question)
            }
        }
    }
}

/// Prioritized, typo-tolerant intent classifier.
#[derive(Debug, Clone)]
pub struct QuestionMatcher {
    threshold: f64,
    strict_threshold: f64,
}

impl Default for QuestionMatcher {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl QuestionMatcher {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            threshold: config.fuzzy_threshold,
            strict_threshold: config.strict_fuzzy_threshold,
        }
    }

    /// Classify a question without rendering an answer.
    pub fn classify(&self, question: &str) -> Result<Intent, Unrecognized> {
        let parsed = Question::parse(question);
        self.find_rule(&parsed).map(|rule| rule.intent)
    }

    /// Answer a question from the cascade, or report why it cannot.
    pub fn answer(
        &self,
        question: &str,
        context: &AnswerContext,
    ) -> Result<MatchedAnswer, Unrecognized> {
        let parsed = Question::parse(question);
        let rule = self.find_rule(&parsed)?;
        debug!(intent = %rule.intent, "question matched");
        Ok(MatchedAnswer {
            intent: rule.intent,
            text: (rule.respond)(context, &parsed),
        })
    }

    fn find_rule(&self, question: &Question) -> Result<&'static rules::Rule, Unrecognized> {
        let probe = Probe {
            question,
            threshold: self.threshold,
            strict_threshold: self.strict_threshold,
        };

        let unrecognized = |reason| Unrecognized {
            question: question.raw().to_string(),
            reason,
        };

        match RULES.iter().find(|rule| (rule.matches)(&probe)) {
            Some(rule) if (rule.defers)(question) => {
                debug!(intent = %rule.intent, "question deferred to fallback");
                Err(unrecognized(UnrecognizedReason::Deferred(rule.intent)))
            }
            Some(rule) => Ok(rule),
            None => {
                debug!("no rule matched question");
                Err(unrecognized(UnrecognizedReason::NoMatch))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ColumnMissing, ColumnProfile, DatasetProfile, DatasetSummary, NumericStatistics,
        NumericSummary, Trend, TypeHistogram,
    };
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn context_for(df: &DataFrame) -> AnswerContext {
        AnswerContext::from_dataset(df, &AnalysisConfig::default()).unwrap()
    }

    fn sales() -> DataFrame {
        df![
            "prix" => [10.0, 20.0, 30.0, 40.0],
            "age" => [30i64, 40, 50, 60],
            "ville" => ["Paris", "Lyon", "Paris", "Nice"],
        ]
        .unwrap()
    }

    fn classify(question: &str) -> Result<Intent, Unrecognized> {
        QuestionMatcher::default().classify(question)
    }

    // ==================== cascade tests ====================

    #[test]
    fn test_row_count_french() {
        let values: Vec<i64> = (0..50).collect();
        let df = df!["x" => values].unwrap();
        let answer = QuestionMatcher::default()
            .answer("combien de lignes ?", &context_for(&df))
            .unwrap();

        assert_eq!(answer.intent, Intent::RowCount);
        assert!(answer.text.contains("50"));
    }

    #[test]
    fn test_mean_of_mentioned_column_only() {
        let answer = QuestionMatcher::default()
            .answer("quelle est la moyenne de prix", &context_for(&sales()))
            .unwrap();

        assert_eq!(answer.intent, Intent::Mean);
        assert_eq!(answer.text, "Mean of prix: 25.00");
        assert!(!answer.text.contains("age"));
    }

    #[test]
    fn test_mean_of_all_columns() {
        let answer = QuestionMatcher::default()
            .answer("les moyennes ?", &context_for(&sales()))
            .unwrap();
        assert_eq!(answer.text, "Means:\nprix: 25.00\nage: 45.00");
    }

    #[test]
    fn test_duplicates_win_over_mean() {
        assert_eq!(classify("doublons et moyenne ?"), Ok(Intent::Duplicates));
    }

    #[test]
    fn test_greetings_and_thanks() {
        assert_eq!(classify("Bonjour !"), Ok(Intent::Greeting));
        assert_eq!(classify("hello there"), Ok(Intent::Greeting));
        assert_eq!(classify("merci beaucoup"), Ok(Intent::Thanks));
        assert_eq!(classify("thank you"), Ok(Intent::Thanks));
    }

    #[test]
    fn test_intent_cascade() {
        assert_eq!(classify("how many rows"), Ok(Intent::RowCount));
        assert_eq!(classify("combien de colonnes ?"), Ok(Intent::ColumnCount));
        assert_eq!(classify("valeurs manquantes ?"), Ok(Intent::MissingValues));
        assert_eq!(classify("y a-t-il des doublons"), Ok(Intent::Duplicates));
        assert_eq!(classify("quel est le minimum de prix"), Ok(Intent::Min));
        assert_eq!(classify("maximum age"), Ok(Intent::Max));
        assert_eq!(classify("min et max"), Ok(Intent::MinMax));
        assert_eq!(classify("écart type"), Ok(Intent::Std));
        assert_eq!(classify("la médiane"), Ok(Intent::Median));
        assert_eq!(classify("fais un résumé"), Ok(Intent::Summary));
        assert_eq!(classify("comment nettoyer"), Ok(Intent::CleaningAdvice));
        assert_eq!(classify("un graphique"), Ok(Intent::Visualization));
        assert_eq!(classify("quelle tendance ?"), Ok(Intent::Trend));
    }

    #[test]
    fn test_typo_tolerance() {
        assert_eq!(classify("la moyene des ventes"), Ok(Intent::Mean));
        assert_eq!(classify("doublon"), Ok(Intent::Duplicates));
    }

    #[test]
    fn test_trend_with_parameters_is_deferred() {
        let err = classify("predict price for age=40").unwrap_err();
        assert_eq!(err.reason, UnrecognizedReason::Deferred(Intent::Trend));

        let err = classify("prédiction pour 2030").unwrap_err();
        assert_eq!(err.reason, UnrecognizedReason::Deferred(Intent::Trend));
    }

    #[test]
    fn test_unrelated_question_unrecognized() {
        let err = classify("who won the world cup").unwrap_err();
        assert_eq!(err.reason, UnrecognizedReason::NoMatch);
        assert_eq!(err.question, "who won the world cup");
    }

    // ==================== answer template tests ====================

    #[test]
    fn test_column_mention_is_substring() {
        // "average" contains "age".
        let answer = QuestionMatcher::default()
            .answer("average please", &context_for(&sales()))
            .unwrap();
        assert_eq!(answer.text, "Mean of age: 45.00");
    }

    #[test]
    fn test_trend_answer_for_column() {
        let answer = QuestionMatcher::default()
            .answer("tendance de prix", &context_for(&sales()))
            .unwrap();
        assert_eq!(answer.text, "prix: increasing (values keep going up)");
    }

    #[test]
    fn test_statistics_without_numeric_columns() {
        let df = df!["ville" => ["Paris", "Lyon"]].unwrap();
        let answer = QuestionMatcher::default()
            .answer("la moyenne", &context_for(&df))
            .unwrap();
        assert_eq!(answer.text, "No numeric columns available.");
    }

    #[test]
    fn test_missing_answer_names_worst_column() {
        let df = df![
            "a" => [Some(1.0), None, None],
            "b" => [None, Some("x"), Some("y")],
        ]
        .unwrap();
        let answer = QuestionMatcher::default()
            .answer("missing values?", &context_for(&df))
            .unwrap();
        assert_eq!(
            answer.text,
            "3 missing values (most affected column: a with 2)"
        );
    }

    #[test]
    fn test_cleaning_advice_on_clean_data() {
        let answer = QuestionMatcher::default()
            .answer("comment nettoyer ?", &context_for(&sales()))
            .unwrap();
        assert_eq!(answer.text, "Data looks clean, no cleaning needed.");
    }

    #[test]
    fn test_column_count_answer() {
        let answer = QuestionMatcher::default()
            .answer("how many columns", &context_for(&sales()))
            .unwrap();
        assert_eq!(answer.text, "3 columns (2 quantitative, 1 qualitative)");
    }

    #[test]
    fn test_undefined_statistic_renders_na() {
        let summary = DatasetSummary {
            rows: 1,
            columns: 1,
            column_names: vec!["x".to_string()],
            missing_by_column: vec![ColumnMissing {
                column: "x".to_string(),
                missing: 0,
                percentage: 0.0,
            }],
            missing_total: 0,
            duplicate_rows: 0,
            completeness_pct: Some(100.0),
            missing_pct: Some(0.0),
            type_histogram: TypeHistogram {
                quantitative: 1,
                qualitative: 0,
            },
            dtype_counts: Default::default(),
            memory_usage_mb: 0.0,
        };
        let profile = DatasetProfile {
            columns: vec![ColumnProfile::Quantitative {
                name: "x".to_string(),
                missing_count: 0,
                statistics: NumericStatistics::Computed(NumericSummary {
                    count: 1,
                    min: Some(4.0),
                    max: Some(4.0),
                    mean: Some(4.0),
                    median: Some(4.0),
                    std: None,
                    q1: Some(4.0),
                    q3: Some(4.0),
                    trend: Trend::Stable,
                }),
            }],
        };
        let context = AnswerContext::new(summary, &profile);
        let answer = QuestionMatcher::default()
            .answer("std of x", &context)
            .unwrap();
        assert_eq!(answer.text, "Standard deviation of x: n/a");
    }
}
