use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use colsim::config::{self, Config};
use colsim::dataset::{reader, writer};
use colsim::output::terminal;
use colsim::scoring::stats::{self, SummaryStats};
use colsim::similarity::traits::BothMissingPolicy;
use colsim::similarity::EngineKind;

/// Rows shown in the data preview.
const PREVIEW_ROWS: usize = 5;

/// Row count above which scoring shows a progress bar.
const PROGRESS_MIN_ROWS: usize = 500;

/// colsim: row-by-row similarity between two spreadsheet columns.
///
/// Reads an .xlsx, .xls or .csv file, compares two columns cell by cell, and
/// writes the scores back out with summary statistics.
#[derive(Parser)]
#[command(name = "colsim", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview a file and list its columns
    Columns {
        /// Spreadsheet to inspect (.xlsx, .xls or .csv)
        file: Option<PathBuf>,

        /// Number of preview rows (default: 5)
        #[arg(long, default_value_t = PREVIEW_ROWS)]
        preview: usize,
    },

    /// Score the similarity of two columns row by row
    Compare {
        /// Spreadsheet to score (.xlsx, .xls or .csv)
        file: Option<PathBuf>,

        /// First column to compare
        #[arg(long)]
        first: String,

        /// Second column to compare
        #[arg(long)]
        second: String,

        /// Similarity engine: basic, fuzzy or semantic (default: fuzzy)
        #[arg(long)]
        engine: Option<EngineKind>,

        /// Score when both cells are blank: identical (1.0) or unrelated (0.0)
        #[arg(long)]
        both_missing: Option<BothMissingPolicy>,

        /// Fuzzy engine bonus when one value contains the other (0 disables)
        #[arg(long, value_parser = config::parse_bonus)]
        substring_bonus: Option<f64>,

        /// Only list rows scoring at least this percentage (0-100)
        #[arg(long, default_value = "0")]
        min_score: f64,

        /// Max rows to list in the results table (default: 50)
        #[arg(long, default_value = "50")]
        limit: usize,

        /// Processed workbook path (default: processed_data.xlsx)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also write the two compared columns and scores to this CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the run summary as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Download the multilingual sentence embedding model (~470 MB)
    DownloadModel,

    /// Show configuration and model availability
    Status,
}

/// Machine-readable summary printed by `compare --json`.
#[derive(Serialize)]
struct CompareReport<'a> {
    file: String,
    first: &'a str,
    second: &'a str,
    engine: EngineKind,
    both_missing: BothMissingPolicy,
    rows: usize,
    failures: usize,
    stats: Option<SummaryStats>,
    output: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("colsim=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Columns { file, preview } => {
            let dataset = reader::load(file.as_deref())?;
            terminal::display_preview(&dataset, preview);
            terminal::display_columns(&dataset);
        }

        Commands::Compare {
            file,
            first,
            second,
            engine,
            both_missing,
            substring_bonus,
            min_score,
            limit,
            output,
            csv,
            json,
        } => {
            let mut config = Config::load()?;
            if let Some(engine) = engine {
                config.engine = engine;
            }
            if let Some(policy) = both_missing {
                config.both_missing = policy;
            }
            if let Some(bonus) = substring_bonus {
                config.substring_bonus = bonus;
            }
            if let Some(path) = output {
                config.output_path = path;
            }
            if !(0.0..=100.0).contains(&min_score) {
                anyhow::bail!("--min-score must be between 0 and 100, got {min_score}");
            }
            config.require_engine()?;

            let mut dataset = reader::load(file.as_deref())?;
            if !json {
                terminal::display_preview(&dataset, PREVIEW_ROWS);
            }

            if let Err(e) = colsim::scoring::ensure_distinct_columns(&first, &second) {
                // stdout carries only the report in JSON mode
                if json {
                    return Err(e);
                }
                println!("\n{}", e.to_string().yellow());
                return Ok(());
            }

            let engine = colsim::similarity::create_engine(&config.engine_settings(), &config.model_dir);
            info!(engine = engine.name(), rows = dataset.row_count(), "Scoring");

            let pb = if !json && dataset.row_count() >= PROGRESS_MIN_ROWS {
                let pb = ProgressBar::new(dataset.row_count() as u64);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("  Scoring [{bar:30}] {pos}/{len} ({eta})")?,
                );
                Some(pb)
            } else {
                None
            };

            let run = colsim::scoring::score_columns_with_progress(
                &mut dataset,
                &first,
                &second,
                engine.as_ref(),
                pb.as_ref(),
            )
            .await?;

            if let Some(pb) = pb {
                pb.finish_and_clear();
            }

            let summary = stats::summarize(&run.scores);

            writer::write_xlsx(&dataset, &config.output_path)?;
            if let Some(csv_path) = &csv {
                writer::write_comparison_csv(&dataset, &first, &second, &run.scores, csv_path)?;
            }

            if json {
                let report = CompareReport {
                    file: file
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    first: &first,
                    second: &second,
                    engine: config.engine,
                    both_missing: config.both_missing,
                    rows: run.scores.len(),
                    failures: run.failures.len(),
                    stats: summary,
                    output: config.output_path.display().to_string(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            match &summary {
                Some(summary) => terminal::display_stats(summary),
                None => println!("\nNo rows to summarize."),
            }

            if !run.scores.is_empty() {
                terminal::display_histogram(&stats::histogram(
                    &run.scores,
                    stats::DEFAULT_HISTOGRAM_BINS,
                ));

                let matching = stats::filter_by_threshold(&run.scores, min_score / 100.0);
                if matching.len() > limit {
                    warn!(
                        shown = limit,
                        matching = matching.len(),
                        "Results table truncated, use --limit to show more"
                    );
                }
                let shown: Vec<usize> = matching.iter().copied().take(limit).collect();
                terminal::display_results(&dataset, &first, &second, &run.scores, &shown);
            }

            terminal::display_failures(&run.failures);

            println!(
                "\n{}",
                format!("Processed workbook saved to: {}", config.output_path.display()).bold()
            );
            if let Some(csv_path) = &csv {
                println!("Comparison CSV saved to: {}", csv_path.display());
            }
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading embedding model...");
            println!("  Destination: {}", model_dir.display());

            colsim::similarity::download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `colsim compare <file> --engine semantic ...`.");
        }

        Commands::Status => {
            let config = Config::load()?;
            colsim::status::show(&config);
        }
    }

    Ok(())
}
