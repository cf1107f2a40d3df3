//! Raw tabular input: a header row plus untyped cells, read from a workbook sheet or a
//! CSV export. No interpretation happens here; see `ingest` for the schema.

use calamine::{Data, Reader, open_workbook_auto};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::IngestError;

/// One untyped spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// Cell rendered as an identifier-like string. Whole floats lose their `.0`
    /// (spreadsheets store codes such as `150101` as floats). Blank text is `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Cell::Bool(b) => Some(b.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Header row plus data rows, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Anything that can produce a raw table.
pub trait RowSource {
    fn load(&self) -> Result<RawTable, IngestError>;
}

/// Named worksheet inside an Excel or OpenDocument workbook.
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
    sheet: String,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
        }
    }
}

impl RowSource for WorkbookSource {
    fn load(&self) -> Result<RawTable, IngestError> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| IngestError::Open {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let available = workbook.sheet_names();
        if !available.iter().any(|name| name == &self.sheet) {
            return Err(IngestError::SheetMissing {
                path: self.path.clone(),
                sheet: self.sheet.clone(),
                available,
            });
        }

        let range = workbook
            .worksheet_range(&self.sheet)
            .map_err(|e| IngestError::Sheet {
                sheet: self.sheet.clone(),
                message: e.to_string(),
            })?;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .ok_or(IngestError::NoHeader)?
            .iter()
            .map(|cell| cell.to_string())
            .collect();

        let rows: Vec<Vec<Cell>> = rows
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();
        debug!(
            path = %self.path.display(),
            sheet = %self.sheet,
            rows = rows.len(),
            "Read worksheet"
        );

        Ok(RawTable { headers, rows })
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => Cell::from(s.as_str()),
        other => Cell::Text(other.to_string()),
    }
}

/// Comma-separated export of the same sheet. Every cell arrives as text.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSource for CsvSource {
    fn load(&self) -> Result<RawTable, IngestError> {
        let csv_err = |source| IngestError::Csv {
            path: self.path.clone(),
            source,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(csv_err)?;

        let headers: Vec<String> = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(IngestError::NoHeader);
        }

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(csv_err)?;
            rows.push(record.iter().map(Cell::from).collect());
        }
        debug!(path = %self.path.display(), rows = rows.len(), "Read CSV");

        Ok(RawTable { headers, rows })
    }
}

/// Pick a source by file extension. `sheet` is ignored for CSV.
pub fn open_source(path: &Path, sheet: &str) -> Result<Box<dyn RowSource>, IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Box::new(WorkbookSource::new(path, sheet))),
        "csv" => Ok(Box::new(CsvSource::new(path))),
        _ => Err(IngestError::UnsupportedFormat(ext)),
    }
}
