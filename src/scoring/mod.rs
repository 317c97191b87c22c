// Batch scoring: run a similarity engine down two columns of a dataset.
//
// Scores come back in row order, one per row, and are written into the
// dataset as the Similarity_Score column. Pairs go to the engine in chunks so
// batching engines can amortize work and a progress bar can advance.

pub mod stats;

use anyhow::Result;
use indicatif::ProgressBar;
use tracing::{debug, info};

use crate::dataset::{Cell, Dataset};
use crate::similarity::traits::SimilarityEngine;

/// Name of the column the scores are written to.
pub const SCORE_COLUMN: &str = "Similarity_Score";

/// Pairs handed to the engine per call.
const SCORE_CHUNK_SIZE: usize = 256;

/// A row whose comparison failed and was scored 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    /// Zero-based data row index (header excluded)
    pub row: usize,
    pub message: String,
}

/// The outcome of scoring one pair of columns.
#[derive(Debug, Clone, Default)]
pub struct ScoreRun {
    /// One score per dataset row, index-aligned
    pub scores: Vec<f64>,
    pub failures: Vec<RowFailure>,
}

/// Reject comparing a column with itself.
pub fn ensure_distinct_columns(first: &str, second: &str) -> Result<()> {
    if first == second {
        anyhow::bail!("Please select different columns for comparison (both are '{first}')");
    }
    Ok(())
}

/// Score `first` against `second` for every row and write the scores into
/// the dataset's Similarity_Score column (appended, or overwritten if present).
///
/// Both columns must exist. Callers reject `first == second` before calling
/// (see `ensure_distinct_columns`).
pub async fn score_columns(
    dataset: &mut Dataset,
    first: &str,
    second: &str,
    engine: &dyn SimilarityEngine,
) -> Result<ScoreRun> {
    score_columns_with_progress(dataset, first, second, engine, None).await
}

/// `score_columns`, advancing `progress` by one per scored row.
pub async fn score_columns_with_progress(
    dataset: &mut Dataset,
    first: &str,
    second: &str,
    engine: &dyn SimilarityEngine,
    progress: Option<&ProgressBar>,
) -> Result<ScoreRun> {
    let first_idx = dataset.require_column(first)?;
    let second_idx = dataset.require_column(second)?;

    let pairs: Vec<(&Cell, &Cell)> = dataset
        .column_values(first_idx)
        .zip(dataset.column_values(second_idx))
        .collect();

    let mut run = ScoreRun {
        scores: Vec::with_capacity(pairs.len()),
        failures: Vec::new(),
    };

    for (chunk_idx, chunk) in pairs.chunks(SCORE_CHUNK_SIZE).enumerate() {
        let results = engine.compare_batch(chunk).await;
        if results.len() != chunk.len() {
            anyhow::bail!(
                "Engine '{}' returned {} scores for {} pairs",
                engine.name(),
                results.len(),
                chunk.len()
            );
        }

        let offset = chunk_idx * SCORE_CHUNK_SIZE;
        for (i, result) in results.into_iter().enumerate() {
            if let Some(message) = result.error {
                run.failures.push(RowFailure {
                    row: offset + i,
                    message,
                });
            }
            run.scores.push(result.score);
        }

        if let Some(pb) = progress {
            pb.inc(chunk.len() as u64);
        }
        debug!(scored = run.scores.len(), total = pairs.len(), "Scored chunk");
    }

    let column: Vec<Cell> = run.scores.iter().map(|&s| Cell::Number(s)).collect();
    dataset.set_column(SCORE_COLUMN, column)?;

    info!(
        engine = engine.name(),
        rows = run.scores.len(),
        failures = run.failures.len(),
        "Scored columns '{}' and '{}'",
        first,
        second
    );

    Ok(run)
}
