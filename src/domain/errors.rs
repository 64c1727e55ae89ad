//! Domain error types
//!
//! This module defines the error hierarchy for the anonymizer.
//! Errors are domain-specific and don't expose third-party types: parser and
//! HTTP client failures are flattened into descriptive strings at the adapter
//! boundary.

use thiserror::Error;

/// Main anonymizer error type
///
/// This is the primary error type used throughout the library.
/// It wraps the specific error kinds raised by the loaders, the exporter and
/// the NER backends.
#[derive(Debug, Error)]
pub enum AnonymizerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Dataset loading errors
    #[error("Load error: {0}")]
    Load(#[from] LoaderError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Named-entity backend errors
    #[error("NER error: {0}")]
    Ner(#[from] NerError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised while turning a file into a [`Dataset`](super::Dataset).
///
/// These are surfaced to the caller as-is; the pipeline never retries them.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Input path does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    /// Extension is not one of the supported formats
    #[error("Unsupported file format: '{0}' (supported: csv, xlsx, xls, json, txt, pdf)")]
    UnsupportedFormat(String),

    /// Content could not be parsed with any attempted encoding or delimiter
    #[error("Unable to read {format} content: {reason}")]
    Unreadable { format: String, reason: String },

    /// Document carried no extractable text
    #[error("No text could be extracted from {0}")]
    EmptyDocument(String),

    /// Parsed content does not form a rectangular table
    #[error("Invalid dataset shape: {0}")]
    InvalidShape(String),
}

impl LoaderError {
    /// Builds an [`LoaderError::Unreadable`] for the given format tag
    pub fn unreadable(format: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unreadable {
            format: format.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised while writing an anonymized dataset back to disk
#[derive(Debug, Error)]
pub enum ExportError {
    /// Output file or directory could not be written
    #[error("Failed to write output: {0}")]
    Io(String),

    /// CSV encoding failed
    #[error("Failed to encode CSV: {0}")]
    Csv(String),

    /// JSON encoding failed
    #[error("Failed to encode JSON: {0}")]
    Serialization(String),
}

/// Named-entity backend errors
///
/// A failure for one (backend, text) pair is recorded in the extraction
/// result and never aborts the batch.
#[derive(Debug, Clone, Error)]
pub enum NerError {
    /// Request could not be sent or timed out
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Backend answered with a body that is not a token-classification result
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    /// Backend did not answer its startup probe
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for AnonymizerError {
    fn from(err: std::io::Error) -> Self {
        AnonymizerError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for AnonymizerError {
    fn from(err: serde_json::Error) -> Self {
        AnonymizerError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for AnonymizerError {
    fn from(err: toml::de::Error) -> Self {
        AnonymizerError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for NerError {
    fn from(err: reqwest::Error) -> Self {
        NerError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymizer_error_display() {
        let err = AnonymizerError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_loader_error_conversion() {
        let loader_err = LoaderError::UnsupportedFormat("docx".to_string());
        let err: AnonymizerError = loader_err.into();
        assert!(matches!(err, AnonymizerError::Load(_)));
        assert!(err.to_string().contains("docx"));
    }

    #[test]
    fn test_unreadable_builder() {
        let err = LoaderError::unreadable("csv", "invalid UTF-8 and Windows-1252");
        assert_eq!(
            err.to_string(),
            "Unable to read csv content: invalid UTF-8 and Windows-1252"
        );
    }

    #[test]
    fn test_ner_error_conversion() {
        let ner_err = NerError::Status {
            status: 503,
            body: "model loading".to_string(),
        };
        let err: AnonymizerError = ner_err.into();
        assert!(matches!(err, AnonymizerError::Ner(_)));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: AnonymizerError = io_err.into();
        assert!(matches!(err, AnonymizerError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: AnonymizerError = json_err.into();
        assert!(matches!(err, AnonymizerError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: AnonymizerError = toml_err.into();
        assert!(matches!(err, AnonymizerError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_export_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: ExportError = io_err.into();
        assert!(matches!(err, ExportError::Io(_)));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let err = AnonymizerError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
        let err = NerError::Unavailable("probe timed out".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
