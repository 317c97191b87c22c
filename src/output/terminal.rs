// Colored terminal output for dataset previews and scoring results.
//
// This module handles all terminal-specific formatting: colors, tables,
// the histogram. The main.rs commands delegate here.

use colored::Colorize;

use super::{format_percent, truncate_chars};
use crate::dataset::{Cell, Dataset};
use crate::scoring::stats::SummaryStats;
use crate::scoring::RowFailure;

/// Widest a table cell is allowed to get before truncation.
const CELL_WIDTH: usize = 24;

/// Widest histogram bar, in characters.
const BAR_WIDTH: usize = 40;

/// Display the first `n` rows of a dataset.
pub fn display_preview(dataset: &Dataset, n: usize) {
    println!(
        "\n{}",
        format!(
            "=== Data Preview ({} of {} rows) ===",
            dataset.head(n).len(),
            dataset.row_count()
        )
        .bold()
    );

    if dataset.columns().is_empty() {
        println!("  (no columns)");
        return;
    }

    let header: Vec<String> = dataset
        .columns()
        .iter()
        .map(|c| format!("{:<width$}", truncate_chars(c, CELL_WIDTH - 3), width = CELL_WIDTH))
        .collect();
    println!("  {}", header.join(" ").dimmed());
    println!(
        "  {}",
        "-".repeat((CELL_WIDTH + 1) * dataset.columns().len()).dimmed()
    );

    for row in dataset.head(n) {
        let cells: Vec<String> = row
            .iter()
            .map(|c| format!("{:<width$}", cell_text(c), width = CELL_WIDTH))
            .collect();
        println!("  {}", cells.join(" "));
    }
}

/// Display the column names available for comparison.
pub fn display_columns(dataset: &Dataset) {
    println!(
        "\n{}",
        format!("=== Columns ({}) ===", dataset.columns().len()).bold()
    );
    for (i, name) in dataset.columns().iter().enumerate() {
        println!("  {:>3}. {}", i + 1, name);
    }
}

/// Display the summary statistic cards.
pub fn display_stats(stats: &SummaryStats) {
    println!("\n{}", "=== Summary Statistics ===".bold());
    for (label, value) in stats.entries() {
        println!("  {:<20} {}", label, value.bold());
    }
}

/// Display a horizontal histogram of histogram bin counts over [0, 1].
pub fn display_histogram(bins: &[usize]) {
    println!("\n{}", "=== Similarity Distribution ===".bold());

    let max = bins.iter().copied().max().unwrap_or(0);
    if max == 0 {
        println!("  (no scores)");
        return;
    }

    let width = 1.0 / bins.len() as f64;
    for (i, &count) in bins.iter().enumerate() {
        let lo = i as f64 * width;
        let hi = lo + width;
        let bar_len = (count * BAR_WIDTH).div_ceil(max);
        // pad before coloring; escape codes would throw off the width
        let bar = format!("{:<BAR_WIDTH$}", "#".repeat(bar_len));
        println!(
            "  {:>5.2}-{:<5.2} {} {}",
            lo,
            hi,
            colorize_score(lo, &bar),
            count
        );
    }
}

/// Display the per-row results table for the given row indices.
pub fn display_results(
    dataset: &Dataset,
    first: &str,
    second: &str,
    scores: &[f64],
    rows: &[usize],
) {
    let (Some(first_idx), Some(second_idx)) =
        (dataset.column_index(first), dataset.column_index(second))
    else {
        return;
    };

    println!(
        "\n{}",
        format!("=== Detailed Results ({} rows) ===", rows.len()).bold()
    );
    let header = format!(
        "{:>5}  {:<w$} {:<w$} {:>8}",
        "Row",
        truncate_chars(first, CELL_WIDTH - 3),
        truncate_chars(second, CELL_WIDTH - 3),
        "Score",
        w = CELL_WIDTH
    );
    println!("  {}", header.dimmed());
    println!("  {}", "-".repeat(2 * CELL_WIDTH + 18).dimmed());

    for &i in rows {
        let row = &dataset.rows()[i];
        let score = scores[i];
        println!(
            "  {:>5}  {:<w$} {:<w$} {}",
            i + 1,
            cell_text(&row[first_idx]),
            cell_text(&row[second_idx]),
            colorize_score(score, &format!("{:>8}", format_percent(score))),
            w = CELL_WIDTH
        );
    }
}

/// Display the rows an engine failed on.
pub fn display_failures(failures: &[RowFailure]) {
    if failures.is_empty() {
        return;
    }

    println!(
        "\n  {} {} rows could not be compared and were scored 0.00%",
        "Warning:".yellow(),
        failures.len()
    );
    for failure in failures.iter().take(5) {
        println!(
            "    row {}: {}",
            failure.row + 1,
            truncate_chars(&failure.message, 120).dimmed()
        );
    }
    if failures.len() > 5 {
        println!("    {}", format!("... and {} more", failures.len() - 5).dimmed());
    }
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => "-".to_string(),
        other => truncate_chars(&other.to_string().replace('\n', " "), CELL_WIDTH - 3),
    }
}

/// Color text by score: high green, middling yellow, low red.
fn colorize_score(score: f64, text: &str) -> colored::ColoredString {
    if score >= 0.8 {
        text.green()
    } else if score >= 0.5 {
        text.yellow()
    } else {
        text.red()
    }
}
