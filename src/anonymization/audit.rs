//! Audit logger for anonymization runs
//!
//! One line per processed dataset. Original values are never written: each
//! substituted value is recorded as its SHA-256 hash.

use crate::anonymization::engine::hex_digest;
use crate::anonymization::strategy::Strategy;
use crate::config::AuditConfig;
use crate::detection::DetectionReport;
use crate::domain::{AnonymizerError, Dataset, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    run_id: String,
    file: String,
    source_format: String,
    rows: usize,
    columns: usize,
    sensitive_columns: usize,
    degraded: bool,
    processing_time_ms: u64,
    verdicts: Vec<AuditVerdict>,
}

/// Per-column audit record (with hashed originals)
#[derive(Debug, Serialize)]
struct AuditVerdict {
    column: String,
    sensitive: bool,
    confidence: f64,
    categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy: Option<Strategy>,
    substituted_cells: usize,
    /// SHA-256 hashes of the distinct substituted originals
    value_hashes: Vec<String>,
}

/// Audit logger for anonymization runs
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AnonymizerError::Io(format!(
                        "Failed to create audit log directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
        })
    }

    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        Self::new(config.log_path.clone(), config.json_format, config.enabled)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Records one anonymization run
    pub fn log_run(
        &self,
        report: &DetectionReport,
        original: &Dataset,
        anonymized: &Dataset,
        processing_time_ms: u64,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let verdicts = report
            .columns
            .iter()
            .map(|verdict| {
                let (substituted_cells, value_hashes) = if verdict.is_sensitive {
                    substituted_hashes(original, anonymized, &verdict.column_name)
                } else {
                    (0, Vec::new())
                };

                AuditVerdict {
                    column: verdict.column_name.clone(),
                    sensitive: verdict.is_sensitive,
                    confidence: verdict.confidence,
                    categories: verdict.categories.iter().map(|c| c.to_string()).collect(),
                    strategy: verdict
                        .is_sensitive
                        .then(|| Strategy::for_categories(&verdict.categories)),
                    substituted_cells,
                    value_hashes,
                }
            })
            .collect();

        let entry = AuditLogEntry {
            timestamp: report.generated_at.to_rfc3339(),
            run_id: report.run_id.to_string(),
            file: report.file.clone(),
            source_format: report.source_format.clone(),
            rows: report.shape.0,
            columns: report.shape.1,
            sensitive_columns: report.summary.sensitive,
            degraded: report.degraded,
            processing_time_ms,
            verdicts,
        };

        self.write_entry(&entry)
    }

    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| {
                AnonymizerError::Io(format!(
                    "Failed to open audit log {}: {e}",
                    self.log_path.display()
                ))
            })?;

        if self.json_format {
            let json_line = serde_json::to_string(entry)?;
            writeln!(file, "{json_line}")?;
        } else {
            writeln!(
                file,
                "[{}] Run: {} | File: {} | Sensitive: {}/{} | Degraded: {} | Time: {}ms",
                entry.timestamp,
                entry.run_id,
                entry.file,
                entry.sensitive_columns,
                entry.columns,
                entry.degraded,
                entry.processing_time_ms
            )?;
        }

        Ok(())
    }
}

/// Count of changed cells and hashes of their distinct originals
fn substituted_hashes(
    original: &Dataset,
    anonymized: &Dataset,
    column: &str,
) -> (usize, Vec<String>) {
    let (Some(before), Some(after)) = (original.column(column), anonymized.column(column)) else {
        return (0, Vec::new());
    };

    let mut changed = 0;
    let mut hashes = BTreeSet::new();
    for (old, new) in before.values().iter().zip(after.values()) {
        if old != new {
            changed += 1;
            if let Some(text) = old.as_text() {
                hashes.insert(hex_digest(&text));
            }
        }
    }

    (changed, hashes.into_iter().collect())
}
