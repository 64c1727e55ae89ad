//! Detection and anonymization pipeline
//!
//! One run goes load → classify every column → substitute sensitive columns →
//! export → audit. The pipeline owns no per-run state: the substitution store
//! and synthetic generator are injected and shared across runs, so the same
//! original value keeps the same substitute from one file to the next.

use crate::adapters::export::Exporter;
use crate::adapters::loader::{DefaultFileLoader, FileLoader};
use crate::anonymization::{
    AnonymizationReport, AuditLogger, SubstitutionEngine, SubstitutionStore, SyntheticGenerator,
};
use crate::config::AnonymizerConfig;
use crate::core::staging::StagedFile;
use crate::detection::{ColumnClassifier, DetectionReport, EntityExtractor, ExtractorMode};
use crate::domain::{AnonymizerError, Dataset, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Rows of the anonymized dataset shown as an update example
pub const UPDATE_EXAMPLE_ROWS: usize = 5;

/// Result of a detection-only run
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub report: DetectionReport,
    pub dataset: Dataset,
    pub processing_time: Duration,
}

impl DetectionOutcome {
    /// Presentation report without substitution samples
    pub fn presentation(&self) -> AnonymizationReport {
        AnonymizationReport::build(
            &self.report,
            &self.dataset,
            None,
            None,
            self.processing_time.as_millis() as u64,
        )
    }
}

/// Result of a full anonymization run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub report: DetectionReport,
    pub original: Dataset,
    pub anonymized: Dataset,
    /// File written by the export step
    pub output_path: PathBuf,
    pub sensitive_columns: Vec<String>,
    /// First rows of the anonymized dataset as pretty-printed JSON records
    pub update_example: String,
    pub processing_time: Duration,
}

impl PipelineOutcome {
    pub fn presentation(&self) -> AnonymizationReport {
        AnonymizationReport::build(
            &self.report,
            &self.original,
            Some(&self.anonymized),
            Some(&self.output_path),
            self.processing_time.as_millis() as u64,
        )
    }
}

/// Detection and anonymization pipeline
pub struct Pipeline {
    config: AnonymizerConfig,
    loader: Arc<dyn FileLoader>,
    classifier: ColumnClassifier,
    engine: SubstitutionEngine,
    exporter: Exporter,
    audit: AuditLogger,
}

impl Pipeline {
    /// Assembles a pipeline from its collaborators
    ///
    /// # Errors
    ///
    /// Returns an error if the audit log directory cannot be created.
    pub fn new(
        config: AnonymizerConfig,
        loader: Arc<dyn FileLoader>,
        extractor: Arc<EntityExtractor>,
        store: Arc<SubstitutionStore>,
        generator: Arc<SyntheticGenerator>,
    ) -> Result<Self> {
        let classifier = ColumnClassifier::new(extractor, &config.detection);
        let engine = SubstitutionEngine::new(&config.anonymization, store, generator);
        let exporter = Exporter::new(config.output.directory.clone());
        let audit = AuditLogger::from_config(&config.audit)?;

        Ok(Self {
            config,
            loader,
            classifier,
            engine,
            exporter,
            audit,
        })
    }

    /// Builds every collaborator from configuration.
    ///
    /// NER backends are probed here; the pipeline runs degraded when none
    /// answers.
    pub async fn from_config(config: AnonymizerConfig) -> Result<Self> {
        let extractor =
            Arc::new(EntityExtractor::from_config(&config.ner, &config.detection).await?);
        let store = Arc::new(SubstitutionStore::new(config.anonymization.cache_capacity));
        let generator = Arc::new(SyntheticGenerator::new(config.anonymization.seed));

        Self::new(config, Arc::new(DefaultFileLoader), extractor, store, generator)
    }

    pub fn config(&self) -> &AnonymizerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SubstitutionStore> {
        self.engine.store()
    }

    pub fn extractor_mode(&self) -> ExtractorMode {
        self.classifier.extractor().mode()
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.classifier.extractor().backend_names()
    }

    /// Classifies every column of an in-memory dataset
    pub async fn analyze(&self, dataset: &Dataset, file: &str, format: &str) -> DetectionReport {
        let classification = self
            .classifier
            .classify_dataset(dataset, self.config.detection.column_concurrency)
            .await;

        let mut report =
            DetectionReport::new(file, format, dataset.shape(), classification.columns);
        report.degraded = self.classifier.extractor().is_degraded();
        report.warnings = classification.warnings;

        tracing::info!(
            file = %file,
            sensitive = report.summary.sensitive,
            total = report.summary.total,
            degraded = report.degraded,
            "Detection completed"
        );

        report
    }

    /// Loads and classifies a file without substituting anything
    pub async fn detect(&self, path: &Path) -> Result<DetectionOutcome> {
        let start = Instant::now();
        let loaded = self.loader.load(path)?;
        let report = self
            .analyze(&loaded.dataset, &display_name(path), loaded.format.as_str())
            .await;

        Ok(DetectionOutcome {
            report,
            dataset: loaded.dataset,
            processing_time: start.elapsed(),
        })
    }

    /// Anonymizes a file and writes the result to the output directory
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or the result cannot be
    /// exported. Substitutes cached before the failure are kept.
    pub async fn process(&self, path: &Path) -> Result<PipelineOutcome> {
        self.run(path, &display_name(path)).await
    }

    /// Anonymizes uploaded bytes.
    ///
    /// The bytes are staged in the upload directory for the duration of the
    /// run and removed afterwards, whatever the outcome.
    pub async fn process_upload(&self, filename: &str, bytes: &[u8]) -> Result<PipelineOutcome> {
        let staged = StagedFile::stage(&self.config.output.upload_directory, filename, bytes)?;
        tracing::info!(
            file = %staged.original_name(),
            format = %staged.format(),
            bytes = bytes.len(),
            "Processing upload"
        );
        self.run(staged.path(), staged.original_name()).await
    }

    async fn run(&self, path: &Path, name: &str) -> Result<PipelineOutcome> {
        let start = Instant::now();

        let loaded = self.loader.load(path)?;
        let report = self
            .analyze(&loaded.dataset, name, loaded.format.as_str())
            .await;

        let anonymized = self.engine.substitute(&loaded.dataset, &report);
        let output_path = self
            .exporter
            .export(&anonymized, Path::new(name), loaded.format)?;

        let update_example = serde_json::to_string_pretty(
            &anonymized.head_records(UPDATE_EXAMPLE_ROWS),
        )
        .map_err(|e| AnonymizerError::Serialization(e.to_string()))?;

        let processing_time = start.elapsed();

        if let Err(e) = self.audit.log_run(
            &report,
            &loaded.dataset,
            &anonymized,
            processing_time.as_millis() as u64,
        ) {
            tracing::warn!(error = %e, "Failed to write audit entry");
        }

        let sensitive_columns: Vec<String> = report
            .sensitive_columns()
            .into_iter()
            .map(str::to_string)
            .collect();

        crate::log_pipeline_complete!(
            name,
            sensitive_columns.len(),
            report.summary.total,
            processing_time
        );

        Ok(PipelineOutcome {
            report,
            original: loaded.dataset,
            anonymized,
            output_path,
            sensitive_columns,
            update_example,
            processing_time,
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
