//! Configuration management.
//!
//! TOML configuration with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `AIDCHAIN_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use aidchain_anonymizer::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("aidchain.toml")?;
//! println!("Sensitivity threshold: {}", config.detection.threshold);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`DetectionConfig`] - Threshold, sampling, NER limits, outlier scoring
//! - [`NerConfig`] - Transformer backend endpoints
//! - [`AnonymizationConfig`] - Generator seed, date shift, cache, prefixes, masking
//! - [`OutputConfig`] - Output and upload directories
//! - [`AuditConfig`] - Audit log
//! - [`LoggingConfig`] - File logging
//!
//! # Example Configuration
//!
//! ```toml
//! [detection]
//! threshold = 0.30
//!
//! [[ner.backends]]
//! name = "ClinicalBERT"
//! role = "medical"
//! endpoint = "http://localhost:8081/ner"
//! api_token = "${HF_TOKEN}"
//!
//! [anonymization]
//! date_shift_days = 365
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config, resolve_config, DEFAULT_CONFIG_FILE};
pub use schema::{
    AnonymizationConfig, AnonymizerConfig, ApplicationConfig, AuditConfig, BackendRole,
    DetectionConfig, LoggingConfig, MaskingConfig, NerBackendConfig, NerConfig, OutlierConfig,
    OutputConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
