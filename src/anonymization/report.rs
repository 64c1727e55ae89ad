//! Presentation report for anonymization runs
//!
//! Summarizes a run for people: which columns were found sensitive and why,
//! a few values before and after substitution, and the first traceable
//! entities behind each verdict.

use crate::detection::{Category, ColumnClassification, DetectedEntity, DetectionReport};
use crate::domain::{Column, Dataset};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Before/after values shown per column
pub const MAX_SAMPLES: usize = 5;

/// Entities shown per column
pub const MAX_ENTITIES: usize = 10;

/// Run-level counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOverview {
    pub total_columns: usize,
    pub sensitive_columns: usize,
    pub public_columns: usize,
    pub file_format: String,
    pub rows: usize,
    pub columns: usize,
}

/// One sensitive column, with examples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnReport {
    pub column_name: String,
    pub is_sensitive: bool,
    pub confidence: f64,
    pub categories: Vec<Category>,
    pub reasoning: String,
    /// Original values, at most [`MAX_SAMPLES`]
    pub sample_before: Vec<String>,
    /// Anonymized values of the same rows; empty when nothing was substituted
    pub sample_after: Vec<String>,
    /// First [`MAX_ENTITIES`] entities behind the verdict
    pub detected_entities: Vec<DetectedEntity>,
}

/// Report of one anonymization (or detection-only) run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationReport {
    pub run_id: Uuid,
    pub original_filename: String,
    /// File written by the export step, if any
    pub anonymized_filename: Option<String>,
    pub summary: ReportOverview,
    pub sensitive_columns: Vec<ColumnReport>,
    pub degraded: bool,
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
    pub processed_at: DateTime<Utc>,
}

impl AnonymizationReport {
    /// Builds the report of a run.
    ///
    /// `anonymized` is `None` for detection-only runs.
    pub fn build(
        detection: &DetectionReport,
        original: &Dataset,
        anonymized: Option<&Dataset>,
        output_path: Option<&Path>,
        processing_time_ms: u64,
    ) -> Self {
        let sensitive_columns = detection
            .columns
            .iter()
            .filter(|verdict| verdict.is_sensitive)
            .map(|verdict| {
                let before = original.column(&verdict.column_name);
                let after = anonymized.and_then(|d| d.column(&verdict.column_name));
                column_report(verdict, before, after)
            })
            .collect();

        Self {
            run_id: detection.run_id,
            original_filename: detection.file.clone(),
            anonymized_filename: output_path
                .and_then(|p| p.file_name())
                .map(|name| name.to_string_lossy().into_owned()),
            summary: ReportOverview {
                total_columns: detection.summary.total,
                sensitive_columns: detection.summary.sensitive,
                public_columns: detection.summary.public,
                file_format: detection.source_format.clone(),
                rows: detection.shape.0,
                columns: detection.shape.1,
            },
            sensitive_columns,
            degraded: detection.degraded,
            warnings: detection.warnings.clone(),
            processing_time_ms,
            processed_at: Utc::now(),
        }
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                    ANONYMIZATION REPORT                       \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("  File:               {}\n", self.original_filename));
        output.push_str(&format!(
            "  Format:             {} ({} rows × {} columns)\n",
            self.summary.file_format, self.summary.rows, self.summary.columns
        ));
        output.push_str(&format!(
            "  Sensitive Columns:  {}\n",
            self.summary.sensitive_columns
        ));
        output.push_str(&format!(
            "  Public Columns:     {}\n",
            self.summary.public_columns
        ));
        if let Some(name) = &self.anonymized_filename {
            output.push_str(&format!("  Output:             {name}\n"));
        }
        output.push_str(&format!(
            "  Processing Time:    {} ms\n",
            self.processing_time_ms
        ));
        if self.degraded {
            output.push_str("  Mode:               degraded (lexical tagger)\n");
        }
        output.push('\n');

        if !self.sensitive_columns.is_empty() {
            output.push_str("🔍 SENSITIVE COLUMNS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");

            for column in &self.sensitive_columns {
                let categories: Vec<&str> = column.categories.iter().map(|c| c.label()).collect();
                output.push_str(&format!("\n  {}\n", column.column_name));
                output.push_str(&format!(
                    "    Confidence:  {:.0}%\n",
                    column.confidence * 100.0
                ));
                output.push_str(&format!("    Categories:  {}\n", categories.join(", ")));
                output.push_str(&format!("    Reasoning:   {}\n", column.reasoning));

                for (i, before) in column.sample_before.iter().enumerate() {
                    match column.sample_after.get(i) {
                        Some(after) => {
                            output.push_str(&format!("    \"{before}\" → \"{after}\"\n"));
                        }
                        None => output.push_str(&format!("    \"{before}\"\n")),
                    }
                }
            }
            output.push('\n');
        }

        if !self.warnings.is_empty() {
            output.push_str("⚠️  WARNINGS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for warning in &self.warnings {
                output.push_str(&format!("  • {warning}\n"));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");

        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write report to file
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        let json = self.format_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

fn column_report(
    verdict: &ColumnClassification,
    before: Option<&Column>,
    after: Option<&Column>,
) -> ColumnReport {
    let rows: Vec<(usize, String)> = before
        .map(|column| {
            column
                .non_null_texts()
                .into_iter()
                .take(MAX_SAMPLES)
                .collect()
        })
        .unwrap_or_default();

    let sample_after = after
        .map(|column| {
            rows.iter()
                .filter_map(|(row, _)| column.values().get(*row))
                .filter_map(|cell| cell.as_text().map(|t| t.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    ColumnReport {
        column_name: verdict.column_name.clone(),
        is_sensitive: verdict.is_sensitive,
        confidence: verdict.confidence,
        categories: verdict.categories.clone(),
        reasoning: verdict.reasoning.clone(),
        sample_before: rows.into_iter().map(|(_, text)| text).collect(),
        sample_after,
        detected_entities: verdict
            .detected_entities
            .iter()
            .take(MAX_ENTITIES)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CellValue;
    use std::path::PathBuf;

    fn fixture() -> (DetectionReport, Dataset, Dataset) {
        let names: Vec<CellValue> = (0..8)
            .map(|i| CellValue::from(format!("Patient {i}")))
            .collect();
        let fakes: Vec<CellValue> = (0..8)
            .map(|i| CellValue::from(format!("Synthetic {i}")))
            .collect();
        let ages: Vec<CellValue> = (0..8).map(|i| CellValue::Integer(20 + i)).collect();

        let original = Dataset::new(vec![
            Column::new("name", names),
            Column::new("age", ages.clone()),
        ])
        .unwrap();
        let anonymized = Dataset::new(vec![Column::new("name", fakes), Column::new("age", ages)])
            .unwrap();

        let mut name = ColumnClassification::empty("name");
        name.is_sensitive = true;
        name.confidence = 0.56;
        name.categories = vec![Category::Person];
        name.reasoning = "Names (80%) | IDs (100%)".to_string();
        name.detected_entities = (0..12)
            .map(|i| {
                DetectedEntity::new(format!("Patient {i}"), Category::Person, 0.9, "lexical", None)
            })
            .collect();

        let mut detection = DetectionReport::new(
            "patients.csv",
            "csv",
            original.shape(),
            vec![name, ColumnClassification::empty("age")],
        );
        detection.warnings.push("column 'name': backend timeout".to_string());

        (detection, original, anonymized)
    }

    #[test]
    fn test_build_limits_samples_and_entities() {
        let (detection, original, anonymized) = fixture();
        let output = PathBuf::from("anonymized/patients_anonymized_20250101_120000.csv");
        let report =
            AnonymizationReport::build(&detection, &original, Some(&anonymized), Some(&output), 42);

        assert_eq!(report.sensitive_columns.len(), 1);
        let column = &report.sensitive_columns[0];
        assert_eq!(column.sample_before.len(), MAX_SAMPLES);
        assert_eq!(column.sample_before[0], "Patient 0");
        assert_eq!(column.sample_after[0], "Synthetic 0");
        assert_eq!(column.detected_entities.len(), MAX_ENTITIES);
        assert_eq!(report.summary.public_columns, 1);
        assert_eq!(
            report.anonymized_filename.as_deref(),
            Some("patients_anonymized_20250101_120000.csv")
        );
    }

    #[test]
    fn test_detect_only_has_no_after_samples() {
        let (detection, original, _) = fixture();
        let report = AnonymizationReport::build(&detection, &original, None, None, 0);
        assert!(report.sensitive_columns[0].sample_after.is_empty());
        assert!(report.anonymized_filename.is_none());
    }

    #[test]
    fn test_format_console() {
        let (detection, original, anonymized) = fixture();
        let report = AnonymizationReport::build(&detection, &original, Some(&anonymized), None, 7);

        let output = report.format_console();
        assert!(output.contains("ANONYMIZATION REPORT"));
        assert!(output.contains("Sensitive Columns:  1"));
        assert!(output.contains("\"Patient 0\" → \"Synthetic 0\""));
        assert!(output.contains("backend timeout"));
    }

    #[test]
    fn test_format_json() {
        let (detection, original, anonymized) = fixture();
        let report = AnonymizationReport::build(&detection, &original, Some(&anonymized), None, 7);

        let json: serde_json::Value = serde_json::from_str(&report.format_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["file_format"], "csv");
        assert_eq!(json["sensitive_columns"][0]["categories"][0], "PERSON");
    }
}
