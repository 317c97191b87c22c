// Input validation and format dispatch.
//
// The accepted extensions map one-to-one onto InputFormat, and every format
// listed there is actually parsed: Excel workbooks through calamine, CSV
// through the csv crate. The first row is always the header. Both readers
// share one set of missing-value markers.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook, Data, Reader, Xls, Xlsx};
use tracing::debug;

use super::{Cell, Dataset};

/// Cell strings read as missing by both readers, besides the empty string.
/// The same set pandas treats as NA by default.
const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A supported input file format, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Xlsx,
    Xls,
    Csv,
}

impl InputFormat {
    pub const ALL: [InputFormat; 3] = [InputFormat::Xlsx, InputFormat::Xls, InputFormat::Csv];

    pub fn extension(self) -> &'static str {
        match self {
            InputFormat::Xlsx => "xlsx",
            InputFormat::Xls => "xls",
            InputFormat::Csv => "csv",
        }
    }

    /// Detect the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    /// Human-readable list of accepted extensions, e.g. ".xlsx, .xls or .csv".
    pub fn accepted_list() -> String {
        let exts: Vec<String> = Self::ALL
            .iter()
            .map(|f| format!(".{}", f.extension()))
            .collect();
        match exts.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
            Some((last, _)) => last.clone(),
            None => String::new(),
        }
    }
}

/// Check an input path before any parsing is attempted.
///
/// Rejects a missing path, a path that doesn't exist, and unsupported
/// extensions. Returns the detected format on success.
pub fn validate_upload(path: Option<&Path>) -> Result<InputFormat> {
    let Some(path) = path else {
        anyhow::bail!(
            "Please provide a spreadsheet file ({})",
            InputFormat::accepted_list()
        );
    };

    let Some(format) = InputFormat::from_path(path) else {
        anyhow::bail!(
            "Please provide a valid spreadsheet file ({}): got {}",
            InputFormat::accepted_list(),
            path.display()
        );
    };

    if !path.is_file() {
        anyhow::bail!("File not found: {}", path.display());
    }

    Ok(format)
}

/// Parse `path` as `format` into a Dataset.
pub fn read_dataset(path: &Path, format: InputFormat) -> Result<Dataset> {
    let dataset = match format {
        InputFormat::Xlsx => {
            let workbook: Xlsx<_> = open_workbook(path)
                .with_context(|| format!("Failed to open workbook {}", path.display()))?;
            read_workbook(workbook)
        }
        InputFormat::Xls => {
            let workbook: Xls<_> = open_workbook(path)
                .with_context(|| format!("Failed to open workbook {}", path.display()))?;
            read_workbook(workbook)
        }
        InputFormat::Csv => read_csv(path),
    }
    .with_context(|| format!("Failed to read {}", path.display()))?;

    debug!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.columns().len(),
        "Parsed input file"
    );

    Ok(dataset)
}

/// Validate then read. The usual entry point for commands.
pub fn load(path: Option<&Path>) -> Result<Dataset> {
    let format = validate_upload(path)?;
    // validate_upload only succeeds with a path
    let path = path.ok_or_else(|| anyhow::anyhow!("No input file given"))?;
    read_dataset(path, format)
}

/// Read the first worksheet of an Excel workbook.
fn read_workbook<R>(mut workbook: R) -> Result<Dataset>
where
    R: Reader<BufReader<File>>,
    R::Error: std::error::Error + Send + Sync + 'static,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow::anyhow!("Workbook contains no worksheets"))?
        .context("Failed to read first worksheet")?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Dataset::default());
    };

    // header text is taken as-is; missing markers only apply to data cells
    let columns = header_names(header.iter().map(|c| match c {
        Data::String(s) => Some(s.clone()),
        other => convert_excel_cell(other).as_text(),
    }));
    let mut body: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(convert_excel_cell).collect())
        .collect();
    trim_trailing_blank_rows(&mut body);

    Ok(Dataset::new(columns, body))
}

fn convert_excel_cell(cell: &Data) -> Cell {
    match cell {
        Data::String(s) if is_missing_marker(s) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Cell::DateTime(naive),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

fn read_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let header = reader.headers().context("Failed to read CSV header")?.clone();
    let columns = header_names(header.iter().map(|h| Some(h.to_string())));

    let mut body: Vec<Vec<Cell>> = Vec::new();
    for (i, record) in reader.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let record = record.with_context(|| format!("Malformed CSV record at line {}", i + 2))?;
        body.push(record.iter().map(convert_csv_field).collect());
    }

    Ok(Dataset::new(columns, body))
}

fn convert_csv_field(field: &str) -> Cell {
    if is_missing_marker(field) {
        return Cell::Empty;
    }
    match field {
        "true" | "True" | "TRUE" => return Cell::Bool(true),
        "false" | "False" | "FALSE" => return Cell::Bool(false),
        _ => {}
    }
    match field.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Number(n),
        _ => Cell::Text(field.to_string()),
    }
}

/// Whether a raw cell string stands for a missing value.
fn is_missing_marker(raw: &str) -> bool {
    raw.is_empty() || MISSING_MARKERS.contains(&raw)
}

/// Drop all-empty rows from the end of a worksheet body. Interior blank rows
/// are data rows and stay.
fn trim_trailing_blank_rows(rows: &mut Vec<Vec<Cell>>) {
    while rows
        .last()
        .is_some_and(|row| row.iter().all(Cell::is_empty))
    {
        rows.pop();
    }
}

/// Turn raw header cells into unique column names.
///
/// Blank headers become `Unnamed: <index>`; repeats get `.1`, `.2`, ...
/// appended in order of appearance.
fn header_names<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();

    for (i, name) in raw.into_iter().enumerate() {
        let base = match name {
            Some(n) if !n.trim().is_empty() => n,
            _ => format!("Unnamed: {i}"),
        };

        let mut candidate = base.clone();
        if let Some(&used) = seen.get(&base) {
            let mut n = used;
            loop {
                n += 1;
                candidate = format!("{base}.{n}");
                if !seen.contains_key(&candidate) {
                    break;
                }
            }
            seen.insert(base, n);
        }
        seen.insert(candidate.clone(), 0);
        names.push(candidate);
    }

    names
}
