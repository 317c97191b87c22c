// Result file writers.
//
// Two shapes: the full processed workbook (every original column plus the
// score column, scores as raw 0-1 numbers) and a compact CSV holding only the
// two compared columns with a percentage-formatted score.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use super::{Cell, Dataset};
use crate::output::format_percent;
use crate::scoring::SCORE_COLUMN;

/// Excel display format for date-time cells.
const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Write the full dataset to an .xlsx file. Creates parent directories.
pub fn write_xlsx(dataset: &Dataset, path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format(DATETIME_NUM_FORMAT);

    for (col, name) in dataset.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, excel_col(col)?, name, &header_format)?;
    }

    for (r, row) in dataset.rows().iter().enumerate() {
        let excel_row = u32::try_from(r + 1).context("Too many rows for an Excel worksheet")?;
        for (c, cell) in row.iter().enumerate() {
            let col = excel_col(c)?;
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(excel_row, col, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(excel_row, col, *n)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(excel_row, col, *b)?;
                }
                Cell::DateTime(dt) => {
                    worksheet.write_datetime_with_format(excel_row, col, dt, &date_format)?;
                }
                Cell::Empty => {}
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), rows = dataset.row_count(), "Wrote processed workbook");
    Ok(())
}

/// Write the two compared columns plus a percentage score column to CSV.
///
/// `scores` must be index-aligned with the dataset rows.
pub fn write_comparison_csv(
    dataset: &Dataset,
    first: &str,
    second: &str,
    scores: &[f64],
    path: &Path,
) -> Result<()> {
    if scores.len() != dataset.row_count() {
        anyhow::bail!(
            "Got {} scores for {} rows",
            scores.len(),
            dataset.row_count()
        );
    }

    let first_idx = dataset.require_column(first)?;
    let second_idx = dataset.require_column(second)?;

    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record([first, second, SCORE_COLUMN])?;
    let pairs = dataset
        .column_values(first_idx)
        .zip(dataset.column_values(second_idx));
    for ((a, b), score) in pairs.zip(scores) {
        writer.write_record([a.to_string(), b.to_string(), format_percent(*score)])?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = scores.len(), "Wrote comparison CSV");
    Ok(())
}

fn excel_col(index: usize) -> Result<u16> {
    u16::try_from(index).context("Too many columns for an Excel worksheet")
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}
