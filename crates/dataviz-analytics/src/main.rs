//! CLI entry point for dataset profiling, cleaning and chat.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use dataviz_analytics::export::write_export;
use dataviz_analytics::{
    AnalysisConfig, AnalysisSession, ChatAssistant, CleaningAction, ColumnProfile, FillMethod,
    NumericStatistics, ReportFormat, ReportGenerator,
};
use dotenv::dotenv;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[cfg(feature = "ai")]
use dataviz_analytics::assistant::ai::{GeminiConfig, GeminiProvider, OpenRouterConfig, OpenRouterProvider};
#[cfg(feature = "ai")]
use std::env;
#[cfg(feature = "ai")]
use tracing::warn;

/// CLI-compatible fill method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFillMethod {
    /// Mean of the non-missing values
    Mean,
    /// Median of the non-missing values
    Median,
    /// Most recent prior non-missing value
    ForwardFill,
}

impl From<CliFillMethod> for FillMethod {
    fn from(cli: CliFillMethod) -> Self {
        match cli {
            CliFillMethod::Mean => FillMethod::Mean,
            CliFillMethod::Median => FillMethod::Median,
            CliFillMethod::ForwardFill => FillMethod::ForwardFill,
        }
    }
}

/// CLI-compatible report format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliReportFormat {
    Text,
    Html,
    Json,
}

impl From<CliReportFormat> for ReportFormat {
    fn from(cli: CliReportFormat) -> Self {
        match cli {
            CliReportFormat::Text => ReportFormat::Text,
            CliReportFormat::Html => ReportFormat::Html,
            CliReportFormat::Json => ReportFormat::Json,
        }
    }
}

/// Hosted model used for questions the rule cascade declines
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliProvider {
    /// Google Gemini (GOOGLE_API_KEY)
    Gemini,
    /// OpenRouter (OPENROUTER_API_KEY)
    Openrouter,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Tabular data profiling, cleaning and question answering",
    long_about = "Profile, clean and question CSV datasets.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  GOOGLE_API_KEY        API key for Gemini (ask --provider gemini)\n  \
                  OPENROUTER_API_KEY    API key for OpenRouter (ask --provider openrouter)\n\n\
                  EXAMPLES:\n  \
                  dataviz-analytics summary data.csv\n  \
                  dataviz-analytics clean data.csv --dedup --fill median -o cleaned.csv\n  \
                  dataviz-analytics ask data.csv \"combien de lignes ?\" --no-ai\n  \
                  dataviz-analytics report data.csv --format html -o reports/"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print JSON to stdout instead of human-readable output
    ///
    /// Disables all logs so the output can be piped: `... --json | jq .rows`
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify every column and describe it
    Profile { file: PathBuf },

    /// Dataset-level summary: completeness, duplicates, missing values
    Summary { file: PathBuf },

    /// Estimate how many rows a full cleaning pass keeps
    Estimate { file: PathBuf },

    /// Apply cleaning actions in order: dedup, fill, outliers
    Clean {
        file: PathBuf,

        /// Remove exact duplicate rows
        #[arg(long)]
        dedup: bool,

        /// Fill missing values
        #[arg(long, value_enum)]
        fill: Option<CliFillMethod>,

        /// Remove IQR outliers from this column (repeatable)
        #[arg(long = "outliers", value_name = "COL")]
        outliers: Vec<String>,

        /// Remove IQR outliers from every quantitative column
        #[arg(long, conflicts_with = "outliers")]
        all_outliers: bool,

        /// Write the cleaned data and its summary sheet here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Ask a question about the dataset
    Ask {
        file: PathBuf,
        question: String,

        /// Never call a hosted model
        #[arg(long)]
        no_ai: bool,

        /// Hosted model for unrecognized questions
        #[arg(long, value_enum, default_value = "gemini")]
        provider: CliProvider,
    },

    /// Render an analysis report
    Report {
        file: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: CliReportFormat,

        /// Output directory; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    let config = AnalysisConfig::default();

    match &args.command {
        Command::Profile { file } => {
            let session = open(file, &config)?;
            let profile = session.profile()?;
            if args.json {
                return print_json(&profile);
            }
            println!(
                "{:<24} {:<13} {:>8}  Details",
                "Column", "Kind", "Missing"
            );
            println!("{}", "-".repeat(80));
            for column in profile.iter() {
                println!(
                    "{:<24} {:<13} {:>8}  {}",
                    truncate_str(column.name(), 23),
                    column.kind().as_str(),
                    column.missing_count(),
                    describe(column)
                );
            }
        }
        Command::Summary { file } => {
            let session = open(file, &config)?;
            let summary = session.summary()?;
            if args.json {
                return print_json(&summary);
            }
            println!("Rows: {}", summary.rows);
            println!("Columns: {}", summary.columns);
            println!("Duplicate rows: {}", summary.duplicate_rows);
            println!("Missing values: {}", summary.missing_total);
            println!("Completeness: {}", fmt_pct(summary.completeness_pct));
            println!("Memory: {:.2} MB", summary.memory_usage_mb);
            for missing in summary.columns_with_missing() {
                println!(
                    "  {}: {} missing ({:.1}%)",
                    missing.column, missing.missing, missing.percentage
                );
            }
        }
        Command::Estimate { file } => {
            let session = open(file, &config)?;
            let estimate = session.estimate()?;
            if args.json {
                return print_json(&estimate);
            }
            println!("Original rows: {}", estimate.original);
            println!("After removing {} duplicates: {}", estimate.duplicates, estimate.after_dedup);
            println!(
                "After dropping {} sparse rows: {}",
                estimate.sparse_rows, estimate.after_missing_handling
            );
            println!(
                "After ~{:.1} outlier rows: {} ({:.1}% kept)",
                estimate.estimated_outlier_rows,
                estimate.after_outliers,
                estimate.retention_pct()
            );
        }
        Command::Clean {
            file,
            dedup,
            fill,
            outliers,
            all_outliers,
            output,
        } => {
            let mut session = open(file, &config)?;
            let mut actions = Vec::new();
            if *dedup {
                actions.push(CleaningAction::RemoveDuplicates);
            }
            if let Some(method) = fill {
                actions.push(CleaningAction::FillMissing((*method).into()));
            }
            actions.extend(
                outliers
                    .iter()
                    .map(|column| CleaningAction::RemoveOutliers(Some(column.clone()))),
            );
            if *all_outliers {
                actions.push(CleaningAction::RemoveOutliers(None));
            }
            if actions.is_empty() {
                return Err(anyhow!(
                    "nothing to do: pass --dedup, --fill, --outliers or --all-outliers"
                ));
            }

            for action in actions {
                session.apply(action)?;
            }

            let exported = match output {
                Some(path) => {
                    let (dir, name) = split_output(path)?;
                    Some(write_export(session.data(), &dir, &name)?)
                }
                None => None,
            };

            if args.json {
                #[derive(Serialize)]
                struct CleanOutput<'a> {
                    steps: &'a [dataviz_analytics::CleaningStep],
                    rows: usize,
                    export: Option<dataviz_analytics::export::ExportedFiles>,
                }
                return print_json(&CleanOutput {
                    steps: session.steps(),
                    rows: session.data().height(),
                    export: exported,
                });
            }
            for (i, step) in session.steps().iter().enumerate() {
                println!("{}. {}: {}", i + 1, step.action_type.display_name(), step.message);
            }
            println!("Rows remaining: {}", session.data().height());
            if let Some(files) = exported {
                println!("Data: {}", files.data_path.display());
                println!("Summary: {}", files.summary_path.display());
            }
        }
        Command::Ask {
            file,
            question,
            no_ai,
            provider,
        } => {
            let session = open(file, &config)?;
            let assistant = build_assistant(*no_ai, *provider, &config)?;
            let reply = session.ask(&assistant, question);
            if args.json {
                return print_json(&reply);
            }
            println!("{}", reply.text);
        }
        Command::Report {
            file,
            format,
            output,
        } => {
            let session = open(file, &config)?;
            let report = session.report()?;
            match output {
                Some(dir) => {
                    let generator = ReportGenerator::new(dir.clone(), None);
                    let path = generator.write_report(&report, (*format).into())?;
                    println!("{}", path.display());
                }
                None => print!("{}", ReportGenerator::render(&report, (*format).into())?),
            }
        }
    }

    Ok(())
}

fn open(file: &Path, config: &AnalysisConfig) -> Result<AnalysisSession> {
    info!("Loading dataset from: {}", file.display());
    Ok(AnalysisSession::open(file, config.clone())?)
}

/// Build the chat assistant with an optional hosted model.
#[cfg(feature = "ai")]
fn build_assistant(
    no_ai: bool,
    provider: CliProvider,
    config: &AnalysisConfig,
) -> Result<ChatAssistant> {
    let builder = ChatAssistant::builder().config(config.clone());
    if no_ai {
        info!("Answering locally (hosted model disabled)");
        return Ok(builder.build());
    }

    let timeouts = config.fallback_timeouts_secs.clone();
    let (key_var, name) = match provider {
        CliProvider::Gemini => ("GOOGLE_API_KEY", "Gemini"),
        CliProvider::Openrouter => ("OPENROUTER_API_KEY", "OpenRouter"),
    };
    let api_key = match env::var(key_var) {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            warn!("{} not set. Answering locally.", key_var);
            return Ok(builder.build());
        }
    };

    info!("Unrecognized questions go to {}", name);
    let builder = match provider {
        CliProvider::Gemini => {
            let provider_config = GeminiConfig::builder().timeouts_secs(timeouts).build();
            builder.provider(Box::new(GeminiProvider::with_config(api_key, provider_config)?))
        }
        CliProvider::Openrouter => {
            let provider_config = OpenRouterConfig::builder().timeouts_secs(timeouts).build();
            builder.provider(Box::new(OpenRouterProvider::with_config(
                api_key,
                provider_config,
            )?))
        }
    };
    Ok(builder.build())
}

/// Build the chat assistant (hosted models not compiled in)
#[cfg(not(feature = "ai"))]
fn build_assistant(
    no_ai: bool,
    _provider: CliProvider,
    config: &AnalysisConfig,
) -> Result<ChatAssistant> {
    if !no_ai {
        tracing::warn!("AI support not compiled in. Answering locally.");
    }
    Ok(ChatAssistant::builder().config(config.clone()).build())
}

/// Split `cleaned/out.csv` into the export directory and base name.
fn split_output(path: &Path) -> Result<(PathBuf, String)> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("invalid output path: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((dir, name))
}

fn describe(column: &ColumnProfile) -> String {
    match column {
        ColumnProfile::Quantitative {
            statistics: NumericStatistics::Computed(stats),
            ..
        } => match (stats.mean, stats.min, stats.max) {
            (Some(mean), Some(min), Some(max)) => format!(
                "mean={:.2} range=[{:.2}, {:.2}] trend={}",
                mean, min, max, stats.trend
            ),
            _ => "no values".to_string(),
        },
        ColumnProfile::Quantitative {
            statistics: NumericStatistics::Contaminated { remark },
            ..
        } => remark.clone(),
        ColumnProfile::Qualitative {
            unique_count,
            most_frequent,
            ..
        } => format!(
            "{} unique, most frequent: {}",
            unique_count,
            most_frequent.as_deref().unwrap_or("-")
        ),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v))
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
