//! File loading
//!
//! Turns an input file into a [`Dataset`] plus its format tag. Supported
//! formats are picked by extension:
//!
//! - CSV: UTF-8, falling back to Windows-1252; delimiter sniffed among `,` `;` and tab
//! - Excel (`.xlsx`, `.xls`): first worksheet, first row as header
//! - JSON: an array of records or a single record
//! - TXT: CSV when it has at least two columns, else JSON, else one `text` line per row
//! - PDF: the full extracted text as a single `full_text` cell

use crate::domain::{CellValue, Column, Dataset, LoaderError};
use calamine::{open_workbook_auto, DataType, Reader};
use chrono::{NaiveDateTime, NaiveTime};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;

/// Extensions accepted by the loader, with their leading dot
pub const ALLOWED_EXTENSIONS: &[&str] = &[".csv", ".xlsx", ".xls", ".json", ".txt", ".pdf"];

/// Delimiters tried when sniffing delimited text
const DELIMITERS: &[u8] = b",;\t";

/// Lines inspected when sniffing the delimiter
const SNIFF_LINES: usize = 10;

/// Column holding the text of a PDF document
pub const DOCUMENT_COLUMN: &str = "full_text";

/// Column holding free-text lines
pub const TEXT_COLUMN: &str = "text";

/// Input file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Csv,
    Xlsx,
    Xls,
    Json,
    Txt,
    Pdf,
}

impl SourceFormat {
    /// Format of a file, from its extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self, LoaderError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self::from_extension(&extension)
    }

    /// Format for an extension, with or without its leading dot
    pub fn from_extension(extension: &str) -> Result<Self, LoaderError> {
        match extension.trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" => Ok(SourceFormat::Xlsx),
            "xls" => Ok(SourceFormat::Xls),
            "json" => Ok(SourceFormat::Json),
            "txt" => Ok(SourceFormat::Txt),
            "pdf" => Ok(SourceFormat::Pdf),
            other => Err(LoaderError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Lowercase extension used as the format tag
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Xls => "xls",
            SourceFormat::Json => "json",
            SourceFormat::Txt => "txt",
            SourceFormat::Pdf => "pdf",
        }
    }

    pub fn is_excel(&self) -> bool {
        matches!(self, SourceFormat::Xlsx | SourceFormat::Xls)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded file
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub format: SourceFormat,
}

/// Produces a dataset from a file on disk
pub trait FileLoader: Send + Sync {
    /// Load a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, its extension is not
    /// supported, or its content cannot be parsed.
    fn load(&self, path: &Path) -> Result<LoadedDataset, LoaderError>;
}

/// Loader for every format in [`ALLOWED_EXTENSIONS`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFileLoader;

impl FileLoader for DefaultFileLoader {
    fn load(&self, path: &Path) -> Result<LoadedDataset, LoaderError> {
        let format = SourceFormat::from_path(path)?;
        if !path.is_file() {
            return Err(LoaderError::NotFound(path.display().to_string()));
        }

        let dataset = match format {
            SourceFormat::Csv => load_csv(path)?,
            SourceFormat::Xlsx | SourceFormat::Xls => load_excel(path, format)?,
            SourceFormat::Json => load_json(path)?,
            SourceFormat::Txt => load_txt(path)?,
            SourceFormat::Pdf => load_pdf(path)?,
        };

        tracing::debug!(
            path = %path.display(),
            format = %format,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "File loaded"
        );

        Ok(LoadedDataset { dataset, format })
    }
}

fn read_bytes(path: &Path, format: SourceFormat) -> Result<Vec<u8>, LoaderError> {
    std::fs::read(path).map_err(|e| LoaderError::unreadable(format.as_str(), e))
}

/// Decodes text as UTF-8, falling back to Windows-1252
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text
        }
    }
}

/// Delimiter candidates, the most consistent one first
pub fn sniff_delimiters(content: &str) -> Vec<u8> {
    let lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut scored: Vec<(u8, f64)> = DELIMITERS
        .iter()
        .map(|&delimiter| {
            if lines.is_empty() {
                return (delimiter, 0.0);
            }
            let counts: Vec<f64> = lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count() as f64)
                .collect();
            let avg = counts.iter().sum::<f64>() / counts.len() as f64;
            let variance =
                counts.iter().map(|c| (c - avg).powi(2)).sum::<f64>() / counts.len() as f64;
            (delimiter, avg / (1.0 + variance.sqrt()))
        })
        .collect();

    // stable sort keeps `,` first on ties
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().map(|(d, _)| d).collect()
}

/// Parses delimited text with the given delimiter
pub fn parse_delimited(content: &str, delimiter: u8) -> Result<Dataset, LoaderError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LoaderError::unreadable("csv", e))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoaderError::unreadable("csv", "missing header row"));
    }

    let mut values: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(|e| LoaderError::unreadable("csv", e))?;
        for (column, field) in values.iter_mut().zip(record.iter()) {
            column.push(CellValue::infer(field));
        }
    }

    build_dataset(headers, values)
}

/// Builds a dataset from a header row and column-major cells.
///
/// Blank headers become `Unnamed: <index>` and repeated headers get a `.1`,
/// `.2`, ... suffix.
fn build_dataset(
    headers: Vec<String>,
    values: Vec<Vec<CellValue>>,
) -> Result<Dataset, LoaderError> {
    let mut names: Vec<String> = Vec::with_capacity(headers.len());
    for (index, header) in headers.into_iter().enumerate() {
        let base = match header.trim() {
            "" => format!("Unnamed: {index}"),
            trimmed => trimmed.to_string(),
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(name);
    }

    Dataset::new(
        names
            .into_iter()
            .zip(values)
            .map(|(name, cells)| Column::new(name, cells))
            .collect(),
    )
}

fn load_csv(path: &Path) -> Result<Dataset, LoaderError> {
    let bytes = read_bytes(path, SourceFormat::Csv)?;
    let content = decode_text(&bytes);

    let mut last_error = LoaderError::unreadable("csv", "empty file");
    for delimiter in sniff_delimiters(&content) {
        match parse_delimited(&content, delimiter) {
            Ok(dataset) => return Ok(dataset),
            Err(e) => {
                tracing::debug!(
                    delimiter = %(delimiter as char).escape_default(),
                    error = %e,
                    "CSV parse attempt failed"
                );
                last_error = e;
            }
        }
    }

    Err(last_error)
}

fn load_excel(path: &Path, format: SourceFormat) -> Result<Dataset, LoaderError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| LoaderError::unreadable(format.as_str(), e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoaderError::unreadable(format.as_str(), "no worksheet found"))?
        .map_err(|e| LoaderError::unreadable(format.as_str(), e))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|cell| cell.to_string()).collect(),
        None => return Dataset::new(Vec::new()),
    };

    let mut values: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (index, column) in values.iter_mut().enumerate() {
            column.push(row.get(index).map_or(CellValue::Null, excel_cell));
        }
    }

    build_dataset(headers, values)
}

fn excel_cell<T: DataType + fmt::Display>(cell: &T) -> CellValue {
    if cell.is_empty() {
        return CellValue::Null;
    }
    let dated = cell.get_datetime().is_some_and(|d| d.is_datetime()) || cell.is_datetime_iso();
    if dated {
        if let Some(datetime) = cell.as_datetime() {
            return CellValue::Text(iso_datetime(datetime));
        }
    }
    if let Some(i) = cell.get_int() {
        return CellValue::Integer(i);
    }
    if let Some(f) = cell.get_float() {
        // whole numbers come back from spreadsheets as floats
        if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
            return CellValue::Integer(f as i64);
        }
        return CellValue::Float(f);
    }
    if let Some(b) = cell.get_bool() {
        return CellValue::Bool(b);
    }
    match cell.get_string() {
        Some(s) if s.trim().is_empty() => CellValue::Null,
        Some(s) => CellValue::Text(s.to_string()),
        None => CellValue::Text(cell.to_string()),
    }
}

/// ISO 8601 date, with the time only when the cell carries one
fn iso_datetime(datetime: NaiveDateTime) -> String {
    if datetime.time() == NaiveTime::MIN {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

/// Dataset from a parsed JSON document
pub fn dataset_from_json(value: Value) -> Result<Dataset, LoaderError> {
    match value {
        Value::Array(items) => {
            let records = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(LoaderError::unreadable(
                        "json",
                        format!("expected an array of objects, found element {other}"),
                    )),
                })
                .collect::<Result<Vec<Map<String, Value>>, _>>()?;
            Dataset::from_records(&records)
        }
        Value::Object(record) => Dataset::from_records(&[record]),
        other => Err(LoaderError::unreadable(
            "json",
            format!("expected an object or an array of objects, found {other}"),
        )),
    }
}

fn load_json(path: &Path) -> Result<Dataset, LoaderError> {
    let bytes = read_bytes(path, SourceFormat::Json)?;
    let value: Value = serde_json::from_str(&decode_text(&bytes))
        .map_err(|e| LoaderError::unreadable("json", e))?;
    dataset_from_json(value)
}

fn load_txt(path: &Path) -> Result<Dataset, LoaderError> {
    let bytes = read_bytes(path, SourceFormat::Txt)?;
    let content = decode_text(&bytes);

    if let Some(dataset) = sniff_delimiters(&content)
        .into_iter()
        .filter_map(|delimiter| parse_delimited(&content, delimiter).ok())
        .find(|dataset| dataset.column_count() >= 2)
    {
        return Ok(dataset);
    }

    if let Ok(value) = serde_json::from_str::<Value>(&content) {
        if let Ok(dataset) = dataset_from_json(value) {
            return Ok(dataset);
        }
    }

    let lines: Vec<CellValue> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(CellValue::from)
        .collect();

    Dataset::new(vec![Column::new(TEXT_COLUMN, lines)])
}

fn load_pdf(path: &Path) -> Result<Dataset, LoaderError> {
    let document =
        lopdf::Document::load(path).map_err(|e| LoaderError::unreadable("pdf", e))?;

    let mut pages: Vec<String> = Vec::new();
    for (page_number, _) in document.get_pages() {
        match document.extract_text(&[page_number]) {
            Ok(text) if !text.trim().is_empty() => pages.push(text.trim().to_string()),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(
                    page = page_number,
                    error = %e,
                    "PDF page has no extractable text"
                );
            }
        }
    }

    if pages.is_empty() {
        return Err(LoaderError::EmptyDocument(path.display().to_string()));
    }

    Ok(Dataset::document(DOCUMENT_COLUMN, pages.join("\n")))
}
