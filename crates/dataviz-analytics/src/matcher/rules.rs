//! The ordered intent cascade and its answer templates.
//!
//! Rules are tried top to bottom and the first match wins, so the order of
//! [`RULES`] decides ambiguous questions ("doublons et moyenne ?" is a
//! duplicates question).

use super::context::AnswerContext;
use super::keywords::*;
use super::{Intent, Question};
use crate::types::{NumericSummary, Trend};

const NO_NUMERIC: &str = "No numeric columns available.";

/// Keyword tests bound to the configured thresholds.
pub(super) struct Probe<'a> {
    pub question: &'a Question,
    pub threshold: f64,
    pub strict_threshold: f64,
}

impl Probe<'_> {
    fn hits(&self, keywords: &[&str]) -> bool {
        self.question.matches_any(keywords, self.threshold)
    }

    fn hits_strict(&self, keywords: &[&str]) -> bool {
        self.question.matches_any(keywords, self.strict_threshold)
    }

    fn hits_over(&self, keywords: &[&str], rival: &[&str]) -> bool {
        self.question.matches_any_over(keywords, rival, self.threshold)
    }
}

pub(super) struct Rule {
    pub intent: Intent,
    pub matches: fn(&Probe) -> bool,
    /// When true after a match, the question is handed to the fallback chain.
    pub defers: fn(&Question) -> bool,
    pub respond: fn(&AnswerContext, &Question) -> String,
}

pub(super) const RULES: &[Rule] = &[
    Rule {
        intent: Intent::Greeting,
        matches: is_greeting,
        defers: never,
        respond: greeting,
    },
    Rule {
        intent: Intent::Thanks,
        matches: is_thanks,
        defers: never,
        respond: thanks,
    },
    Rule {
        intent: Intent::Trend,
        matches: is_trend,
        defers: Question::has_parameters,
        respond: trend,
    },
    Rule {
        intent: Intent::RowCount,
        matches: is_row_count,
        defers: never,
        respond: row_count,
    },
    Rule {
        intent: Intent::ColumnCount,
        matches: is_column_count,
        defers: never,
        respond: column_count,
    },
    Rule {
        intent: Intent::MissingValues,
        matches: is_missing,
        defers: never,
        respond: missing_values,
    },
    Rule {
        intent: Intent::Duplicates,
        matches: is_duplicates,
        defers: never,
        respond: duplicates,
    },
    Rule {
        intent: Intent::Mean,
        matches: is_mean,
        defers: never,
        respond: mean,
    },
    Rule {
        intent: Intent::Min,
        matches: is_min_only,
        defers: never,
        respond: min,
    },
    Rule {
        intent: Intent::Max,
        matches: is_max_only,
        defers: never,
        respond: max,
    },
    Rule {
        intent: Intent::MinMax,
        matches: is_min_and_max,
        defers: never,
        respond: min_max,
    },
    Rule {
        intent: Intent::Std,
        matches: is_std,
        defers: never,
        respond: std_dev,
    },
    Rule {
        intent: Intent::Median,
        matches: is_median,
        defers: never,
        respond: median,
    },
    Rule {
        intent: Intent::Summary,
        matches: is_summary,
        defers: never,
        respond: summary,
    },
    Rule {
        intent: Intent::CleaningAdvice,
        matches: is_cleaning,
        defers: never,
        respond: cleaning_advice,
    },
    Rule {
        intent: Intent::Visualization,
        matches: is_visualization,
        defers: never,
        respond: visualization,
    },
];

// ============================================================================
// Predicates
// ============================================================================

fn never(_: &Question) -> bool {
    false
}

fn is_greeting(p: &Probe) -> bool {
    p.hits_strict(GREETING)
}

fn is_thanks(p: &Probe) -> bool {
    p.hits_strict(THANKS)
}

fn is_trend(p: &Probe) -> bool {
    p.hits(TREND)
}

fn is_row_count(p: &Probe) -> bool {
    p.hits(ROW) && p.hits(ROW_QUANTITY)
}

fn is_column_count(p: &Probe) -> bool {
    p.hits(COLUMN) && p.hits(COLUMN_QUANTITY)
}

fn is_missing(p: &Probe) -> bool {
    p.hits(MISSING)
}

fn is_duplicates(p: &Probe) -> bool {
    p.hits(DUPLICATES)
}

fn is_mean(p: &Probe) -> bool {
    p.hits(MEAN)
}

fn is_min_only(p: &Probe) -> bool {
    p.hits_over(MIN, MAX) && !p.hits_over(MAX, MIN)
}

fn is_max_only(p: &Probe) -> bool {
    p.hits_over(MAX, MIN) && !p.hits_over(MIN, MAX)
}

fn is_min_and_max(p: &Probe) -> bool {
    p.hits_over(MIN, MAX) && p.hits_over(MAX, MIN)
}

fn is_std(p: &Probe) -> bool {
    p.hits(STD)
}

fn is_median(p: &Probe) -> bool {
    p.hits(MEDIAN)
}

fn is_summary(p: &Probe) -> bool {
    p.hits(SUMMARY)
}

fn is_cleaning(p: &Probe) -> bool {
    p.hits(CLEANING)
}

fn is_visualization(p: &Probe) -> bool {
    p.hits(VISUALIZATION)
}

// ============================================================================
// Answer templates
// ============================================================================

fn fmt_stat(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Answer for the mentioned column, or one line per quantitative column.
fn per_column(
    ctx: &AnswerContext,
    question: &Question,
    single: impl Fn(&str, &NumericSummary) -> String,
    heading: &str,
    line: impl Fn(&str, &NumericSummary) -> String,
    limit: usize,
) -> String {
    if ctx.numeric.is_empty() {
        return NO_NUMERIC.to_string();
    }
    if let Some((name, stats)) = ctx.mentioned_numeric(question) {
        return single(name.as_str(), stats);
    }

    let lines: Vec<String> = ctx
        .numeric
        .iter()
        .take(limit)
        .map(|(name, stats)| line(name.as_str(), stats))
        .collect();
    format!("{}:\n{}", heading, lines.join("\n"))
}

fn thanks(_: &AnswerContext, _: &Question) -> String {
    "You're welcome!".to_string()
}

fn row_count(ctx: &AnswerContext, _: &Question) -> String {
    format!("{} rows", ctx.rows())
}

fn visualization(_: &AnswerContext, _: &Question) -> String {
    "Use the visualization view to build scatter, line, bar, histogram, box or violin charts."
        .to_string()
}

fn greeting(ctx: &AnswerContext, _: &Question) -> String {
    format!(
        "Hello! Your dataset has {} rows and {} columns.",
        ctx.rows(),
        ctx.columns()
    )
}

fn trend(ctx: &AnswerContext, question: &Question) -> String {
    per_column(
        ctx,
        question,
        |name, s| match s.trend {
            Trend::Increasing => format!("{}: increasing (values keep going up)", name),
            Trend::Decreasing => format!("{}: decreasing (values keep going down)", name),
            Trend::Stable => format!("{}: stable (no major change)", name),
        },
        "Trends",
        |name, s| format!("{}: {}", name, s.trend),
        3,
    )
}

fn column_count(ctx: &AnswerContext, _: &Question) -> String {
    let types = ctx.summary.type_histogram;
    format!(
        "{} columns ({} quantitative, {} qualitative)",
        ctx.columns(),
        types.quantitative,
        types.qualitative
    )
}

fn missing_values(ctx: &AnswerContext, _: &Question) -> String {
    match ctx.most_missing() {
        None => "0 missing values".to_string(),
        Some((column, count)) => format!(
            "{} missing values (most affected column: {} with {})",
            ctx.summary.missing_total, column, count
        ),
    }
}

fn duplicates(ctx: &AnswerContext, _: &Question) -> String {
    match ctx.summary.duplicate_rows {
        0 => "0 duplicate rows".to_string(),
        n => format!("{} duplicate rows detected", n),
    }
}

fn mean(ctx: &AnswerContext, question: &Question) -> String {
    per_column(
        ctx,
        question,
        |name, s| format!("Mean of {}: {}", name, fmt_stat(s.mean)),
        "Means",
        |name, s| format!("{}: {}", name, fmt_stat(s.mean)),
        usize::MAX,
    )
}

fn min(ctx: &AnswerContext, question: &Question) -> String {
    per_column(
        ctx,
        question,
        |name, s| format!("Minimum of {}: {}", name, fmt_stat(s.min)),
        "Minimums",
        |name, s| format!("{}: {}", name, fmt_stat(s.min)),
        usize::MAX,
    )
}

fn max(ctx: &AnswerContext, question: &Question) -> String {
    per_column(
        ctx,
        question,
        |name, s| format!("Maximum of {}: {}", name, fmt_stat(s.max)),
        "Maximums",
        |name, s| format!("{}: {}", name, fmt_stat(s.max)),
        usize::MAX,
    )
}

fn min_max(ctx: &AnswerContext, question: &Question) -> String {
    let line = |name: &str, s: &NumericSummary| {
        format!("{}: min={}, max={}", name, fmt_stat(s.min), fmt_stat(s.max))
    };
    per_column(ctx, question, line, "Min/Max", line, usize::MAX)
}

fn std_dev(ctx: &AnswerContext, question: &Question) -> String {
    per_column(
        ctx,
        question,
        |name, s| format!("Standard deviation of {}: {}", name, fmt_stat(s.std)),
        "Standard deviations",
        |name, s| format!("{}: {}", name, fmt_stat(s.std)),
        usize::MAX,
    )
}

fn median(ctx: &AnswerContext, question: &Question) -> String {
    per_column(
        ctx,
        question,
        |name, s| format!("Median of {}: {}", name, fmt_stat(s.median)),
        "Medians",
        |name, s| format!("{}: {}", name, fmt_stat(s.median)),
        usize::MAX,
    )
}

fn summary(ctx: &AnswerContext, _: &Question) -> String {
    let s = &ctx.summary;
    format!(
        "Summary:\n- {} rows x {} columns\n- {} quantitative, {} qualitative\n- {} duplicate rows, {} missing values",
        s.rows,
        s.columns,
        s.type_histogram.quantitative,
        s.type_histogram.qualitative,
        s.duplicate_rows,
        s.missing_total
    )
}

fn cleaning_advice(ctx: &AnswerContext, _: &Question) -> String {
    let mut todo = Vec::new();
    if ctx.summary.duplicate_rows > 0 {
        todo.push(format!("- Remove {} duplicate rows", ctx.summary.duplicate_rows));
    }
    if ctx.summary.missing_total > 0 {
        todo.push(format!("- Handle {} missing values", ctx.summary.missing_total));
    }

    if todo.is_empty() {
        "Data looks clean, no cleaning needed.".to_string()
    } else {
        format!("To do:\n{}", todo.join("\n"))
    }
}
