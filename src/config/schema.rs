//! Configuration schema types
//!
//! This module defines the configuration structure that maps to
//! `aidchain.toml`. Every section has defaults, so an empty file is a valid
//! configuration.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnonymizerConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Column classification settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Named-entity backends
    #[serde(default)]
    pub ner: NerConfig,

    /// Substitution settings
    #[serde(default)]
    pub anonymization: AnonymizationConfig,

    /// Output and staging directories
    #[serde(default)]
    pub output: OutputConfig,

    /// Audit logging configuration
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AnonymizerConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.detection.validate()?;
        self.ner.validate()?;
        self.anonymization.validate()?;
        self.output.validate()?;
        self.audit.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Column classification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Confidence at or above which a column is sensitive
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Values sampled per column
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Seed of the column sampler
    #[serde(default = "default_seed")]
    pub sample_seed: u64,

    /// Sampled values offered to the NER backends
    #[serde(default = "default_ner_max_items")]
    pub ner_max_items: usize,

    /// NER truncation length, in characters
    #[serde(default = "default_ner_max_chars")]
    pub ner_max_chars: usize,

    /// Texts with fewer non-whitespace characters skip NER
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,

    /// NER requests in flight per column
    #[serde(default = "default_concurrency")]
    pub ner_concurrency: usize,

    /// Columns classified concurrently
    #[serde(default = "default_concurrency")]
    pub column_concurrency: usize,

    /// Identifier outlier scoring
    #[serde(default)]
    pub outlier: OutlierConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            sample_size: default_sample_size(),
            sample_seed: default_seed(),
            ner_max_items: default_ner_max_items(),
            ner_max_chars: default_ner_max_chars(),
            min_text_chars: default_min_text_chars(),
            ner_concurrency: default_concurrency(),
            column_concurrency: default_concurrency(),
            outlier: OutlierConfig::default(),
        }
    }
}

impl DetectionConfig {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!(
                "detection.threshold must be between 0 and 1, got {}",
                self.threshold
            ));
        }
        if self.sample_size == 0 {
            return Err("detection.sample_size must be > 0".to_string());
        }
        if self.ner_max_items == 0 {
            return Err("detection.ner_max_items must be > 0".to_string());
        }
        if self.ner_max_chars == 0 {
            return Err("detection.ner_max_chars must be > 0".to_string());
        }
        if self.ner_concurrency == 0 || self.column_concurrency == 0 {
            return Err("detection concurrency settings must be > 0".to_string());
        }
        self.outlier.validate()
    }
}

/// Identifier outlier scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierConfig {
    /// Expected share of outliers
    #[serde(default = "default_contamination")]
    pub contamination: f64,

    /// Number of isolation trees
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Values required before scoring runs
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Values scored per column
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    /// Outlier share above which a column holds identifiers
    #[serde(default = "default_id_ratio_threshold")]
    pub id_ratio_threshold: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            contamination: default_contamination(),
            n_estimators: default_n_estimators(),
            seed: default_seed(),
            min_samples: default_min_samples(),
            max_samples: default_max_samples(),
            id_ratio_threshold: default_id_ratio_threshold(),
        }
    }
}

impl OutlierConfig {
    fn validate(&self) -> Result<(), String> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(format!(
                "detection.outlier.contamination must be in (0, 0.5], got {}",
                self.contamination
            ));
        }
        if self.n_estimators == 0 {
            return Err("detection.outlier.n_estimators must be > 0".to_string());
        }
        if self.min_samples < 2 {
            return Err("detection.outlier.min_samples must be >= 2".to_string());
        }
        if self.max_samples < self.min_samples {
            return Err("detection.outlier.max_samples must be >= min_samples".to_string());
        }
        if !(0.0..=1.0).contains(&self.id_ratio_threshold) {
            return Err("detection.outlier.id_ratio_threshold must be between 0 and 1".to_string());
        }
        Ok(())
    }
}

/// Role of a transformer backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendRole {
    /// Clinical / domain-specific model
    Medical,
    /// General multilingual model
    General,
}

impl std::fmt::Display for BackendRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendRole::Medical => write!(f, "medical"),
            BackendRole::General => write!(f, "general"),
        }
    }
}

/// Named-entity backends configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NerConfig {
    /// Probe backends at startup and drop those that do not answer
    #[serde(default = "default_true")]
    pub probe_on_startup: bool,

    /// Transformer endpoints; none means the lexical tagger is used
    #[serde(default)]
    pub backends: Vec<NerBackendConfig>,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            probe_on_startup: true,
            backends: Vec::new(),
        }
    }
}

impl NerConfig {
    fn validate(&self) -> Result<(), String> {
        for backend in &self.backends {
            backend.validate()?;
        }
        let mut names: Vec<&str> = self.backends.iter().map(|b| b.name.as_str()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            return Err("ner.backends names must be unique".to_string());
        }
        Ok(())
    }
}

/// One transformer backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NerBackendConfig {
    /// Source tag of the entities this backend produces
    pub name: String,

    pub role: BackendRole,

    /// Token-classification endpoint URL
    pub endpoint: String,

    /// Bearer token, stored securely in memory and zeroized on drop
    #[serde(default)]
    pub api_token: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl NerBackendConfig {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("ner.backends.name cannot be empty".to_string());
        }

        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| {
                format!(
                    "Invalid endpoint '{}' for backend '{}': {e}",
                    self.endpoint, self.name
                )
            })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Endpoint for backend '{}' must use http or https",
                self.name
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(format!("timeout_seconds for backend '{}' must be > 0", self.name));
        }
        Ok(())
    }
}

/// Substitution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Seed of the synthetic value generator
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Date shift bound, in days, on either side of zero
    #[serde(default = "default_date_shift_days")]
    pub date_shift_days: i64,

    /// Maximum number of cached substitutions
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Prefix of hashed identifiers
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Prefix of masked domain terms
    #[serde(default = "default_mask_prefix")]
    pub mask_prefix: String,

    /// Hex digits kept from the identifier digest
    #[serde(default = "default_id_hash_length")]
    pub id_hash_length: usize,

    /// Filters applied to domain terms before masking
    #[serde(default)]
    pub masking: MaskingConfig,
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            date_shift_days: default_date_shift_days(),
            cache_capacity: default_cache_capacity(),
            id_prefix: default_id_prefix(),
            mask_prefix: default_mask_prefix(),
            id_hash_length: default_id_hash_length(),
            masking: MaskingConfig::default(),
        }
    }
}

impl AnonymizationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.date_shift_days < 0 {
            return Err("anonymization.date_shift_days must be >= 0".to_string());
        }
        if self.cache_capacity == 0 {
            return Err("anonymization.cache_capacity must be > 0".to_string());
        }
        if self.id_prefix.is_empty() || self.mask_prefix.is_empty() {
            return Err("anonymization prefixes cannot be empty".to_string());
        }
        if self.id_prefix == self.mask_prefix {
            return Err("anonymization.id_prefix and mask_prefix must differ".to_string());
        }
        if !(4..=64).contains(&self.id_hash_length) {
            return Err("anonymization.id_hash_length must be between 4 and 64".to_string());
        }
        self.masking.validate()
    }

    /// Every prefix marking an already anonymized value
    pub fn reserved_prefixes(&self) -> Vec<String> {
        vec![self.mask_prefix.clone(), self.id_prefix.clone()]
    }
}

/// Domain-term masking filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskingConfig {
    /// Shortest span, in characters, that may be masked
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Lowest extraction confidence that may be masked
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Spans never masked, compared case-insensitively
    #[serde(default = "default_stopwords")]
    pub stopwords: Vec<String>,

    /// Only rewrite whole-word occurrences of a masked span
    #[serde(default = "default_true")]
    pub whole_word_only: bool,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            min_confidence: default_min_confidence(),
            stopwords: default_stopwords(),
            whole_word_only: true,
        }
    }
}

impl MaskingConfig {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(
                "anonymization.masking.min_confidence must be between 0 and 1".to_string(),
            );
        }
        Ok(())
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving anonymized files
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// Directory where uploaded files are staged
    #[serde(default = "default_upload_directory")]
    pub upload_directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            upload_directory: default_upload_directory(),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.directory.as_os_str().is_empty() {
            return Err("output.directory cannot be empty".to_string());
        }
        if self.upload_directory.as_os_str().is_empty() {
            return Err("output.upload_directory cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file path
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// Use JSON format for audit logs
    #[serde(default = "default_true")]
    pub json_format: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
            json_format: true,
        }
    }
}

impl AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err("audit.log_path cannot be empty when audit is enabled".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log file path
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.is_empty() {
            return Err(
                "logging.local_path cannot be empty when local logging is enabled".to_string(),
            );
        }
        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> f64 {
    0.30
}

fn default_sample_size() -> usize {
    200
}

fn default_seed() -> u64 {
    42
}

fn default_ner_max_items() -> usize {
    30
}

fn default_ner_max_chars() -> usize {
    500
}

fn default_min_text_chars() -> usize {
    3
}

fn default_concurrency() -> usize {
    4
}

fn default_contamination() -> f64 {
    0.1
}

fn default_n_estimators() -> usize {
    100
}

fn default_min_samples() -> usize {
    10
}

fn default_max_samples() -> usize {
    100
}

fn default_id_ratio_threshold() -> f64 {
    0.2
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_date_shift_days() -> i64 {
    365
}

fn default_cache_capacity() -> usize {
    100_000
}

fn default_id_prefix() -> String {
    "ID_".to_string()
}

fn default_mask_prefix() -> String {
    "MED_".to_string()
}

fn default_id_hash_length() -> usize {
    8
}

fn default_min_length() -> usize {
    3
}

fn default_min_confidence() -> f64 {
    0.4
}

fn default_stopwords() -> Vec<String> {
    ["the", "and", "for", "with", "from", "this", "that", "are", "was", "were"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("anonymized")
}

fn default_upload_directory() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/anonymization.log")
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
