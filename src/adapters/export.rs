//! Export of anonymized datasets
//!
//! Output files are named `<stem>_anonymized_<YYYYMMDD_HHMMSS>.<ext>` and keep
//! the conventions of the source format where the stack can write it:
//!
//! | Source | Output |
//! |---|---|
//! | csv | csv |
//! | json | pretty-printed array of records |
//! | txt | one line per row for a single `text` column, csv otherwise |
//! | pdf | plain text |
//! | xlsx, xls | csv |

use crate::adapters::loader::{SourceFormat, DOCUMENT_COLUMN, TEXT_COLUMN};
use crate::domain::{Dataset, ExportError};
use chrono::Local;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker inserted between the original stem and the timestamp
pub const ANONYMIZED_MARKER: &str = "anonymized";

/// Writes anonymized datasets into an output directory
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes `dataset` next to the other outputs and returns the file path
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory cannot be created or the file
    /// cannot be encoded or written.
    pub fn export(
        &self,
        dataset: &Dataset,
        original_path: &Path,
        format: SourceFormat,
    ) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.output_dir)?;

        let stem = original_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "dataset".to_string());
        let path = self.output_path(&stem, output_extension(format));

        let bytes = match format {
            SourceFormat::Csv | SourceFormat::Xlsx | SourceFormat::Xls => to_csv(dataset)?,
            SourceFormat::Json => to_json(dataset)?,
            SourceFormat::Txt => match single_text_column(dataset, TEXT_COLUMN) {
                Some(lines) => lines.join("\n").into_bytes(),
                None => to_csv(dataset)?,
            },
            SourceFormat::Pdf => to_plain_text(dataset).into_bytes(),
        };

        fs::write(&path, bytes)?;

        tracing::info!(
            path = %path.display(),
            format = %format,
            rows = dataset.row_count(),
            "Anonymized dataset written"
        );

        Ok(path)
    }

    /// Timestamped output path that does not overwrite an existing file
    fn output_path(&self, stem: &str, extension: &str) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let base = format!("{stem}_{ANONYMIZED_MARKER}_{timestamp}");

        let mut path = self.output_dir.join(format!("{base}.{extension}"));
        let mut attempt = 1;
        while path.exists() {
            path = self.output_dir.join(format!("{base}_{attempt}.{extension}"));
            attempt += 1;
        }
        path
    }
}

fn output_extension(format: SourceFormat) -> &'static str {
    match format {
        SourceFormat::Csv | SourceFormat::Xlsx | SourceFormat::Xls => "csv",
        SourceFormat::Json => "json",
        SourceFormat::Txt | SourceFormat::Pdf => "txt",
    }
}

/// Values of `column` when it is the only column of the dataset
fn single_text_column(dataset: &Dataset, column: &str) -> Option<Vec<String>> {
    match dataset.columns() {
        [only] if only.name() == column => {
            Some(only.values().iter().map(|v| v.to_string()).collect())
        }
        _ => None,
    }
}

/// CSV with a header row; nulls become empty fields
pub fn to_csv(dataset: &Dataset) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(dataset.column_names())?;

    for row in 0..dataset.row_count() {
        let record: Vec<String> = dataset
            .columns()
            .iter()
            .map(|column| column.values()[row].to_string())
            .collect();
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))
}

/// Pretty-printed JSON array of records
pub fn to_json(dataset: &Dataset) -> Result<Vec<u8>, ExportError> {
    let records: Vec<Value> = dataset
        .head_records(dataset.row_count())
        .into_iter()
        .map(Value::Object)
        .collect();
    Ok(serde_json::to_vec_pretty(&records)?)
}

/// Text of a document dataset, or every non-null cell one per line
pub fn to_plain_text(dataset: &Dataset) -> String {
    if let Some(text) = dataset
        .column(DOCUMENT_COLUMN)
        .and_then(|column| column.values().first())
    {
        return text.to_string();
    }

    let mut lines = Vec::new();
    for row in 0..dataset.row_count() {
        for column in dataset.columns() {
            let value = &column.values()[row];
            if !value.is_null() {
                lines.push(value.to_string());
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellValue, Column};
    use tempfile::TempDir;

    fn people() -> Dataset {
        Dataset::new(vec![
            Column::new("name", vec![CellValue::from("Léa, Martin"), CellValue::Null]),
            Column::new("age", vec![CellValue::Integer(31), CellValue::Integer(58)]),
        ])
        .unwrap()
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    #[test]
    fn test_csv_export_naming_and_content() {
        let dir = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path().join("out"));

        let path = exporter
            .export(&people(), Path::new("/data/patients.csv"), SourceFormat::Csv)
            .unwrap();

        let name = file_name(&path);
        assert!(name.starts_with("patients_anonymized_"));
        assert!(name.ends_with(".csv"));
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "name,age\n\"Léa, Martin\",31\n,58\n");
    }

    #[test]
    fn test_exports_do_not_overwrite_each_other() {
        let dir = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path());

        let first = exporter
            .export(&people(), Path::new("a.csv"), SourceFormat::Csv)
            .unwrap();
        let second = exporter
            .export(&people(), Path::new("a.csv"), SourceFormat::Csv)
            .unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_json_export_is_records() {
        let dir = TempDir::new().unwrap();
        let path = Exporter::new(dir.path())
            .export(&people(), Path::new("people.json"), SourceFormat::Json)
            .unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["name"], "Léa, Martin");
        assert_eq!(value[1]["name"], Value::Null);
        assert_eq!(value[1]["age"], 58);
    }

    #[test]
    fn test_excel_is_written_as_csv() {
        let dir = TempDir::new().unwrap();
        let path = Exporter::new(dir.path())
            .export(&people(), Path::new("book.xlsx"), SourceFormat::Xlsx)
            .unwrap();
        assert!(file_name(&path).ends_with(".csv"));
    }

    #[test]
    fn test_pdf_document_becomes_text() {
        let dir = TempDir::new().unwrap();
        let document = Dataset::document(DOCUMENT_COLUMN, "Report for MED_0042");
        let path = Exporter::new(dir.path())
            .export(&document, Path::new("scan.pdf"), SourceFormat::Pdf)
            .unwrap();

        assert!(file_name(&path).ends_with(".txt"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Report for MED_0042");
    }

    #[test]
    fn test_txt_lines_round_trip() {
        let dir = TempDir::new().unwrap();
        let lines = Dataset::new(vec![Column::new(
            TEXT_COLUMN,
            vec![CellValue::from("first"), CellValue::from("second")],
        )])
        .unwrap();

        let path = Exporter::new(dir.path())
            .export(&lines, Path::new("notes.txt"), SourceFormat::Txt)
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond");

        let table = Exporter::new(dir.path())
            .export(&people(), Path::new("table.txt"), SourceFormat::Txt)
            .unwrap();
        assert!(fs::read_to_string(&table).unwrap().starts_with("name,age\n"));
    }
}
