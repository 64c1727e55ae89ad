//! Logging and observability
//!
//! Structured logging built on `tracing`:
//! - Human-readable console output on stderr
//! - Optional JSON log files with rotation
//! - Macros for the events every run emits
//!
//! # Example
//!
//! ```no_run
//! use aidchain_anonymizer::logging::init_logging;
//! use aidchain_anonymizer::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the verdict reached for one column
///
/// # Example
///
/// ```no_run
/// use aidchain_anonymizer::log_column_verdict;
///
/// log_column_verdict!("patient_name", true, 0.8, "Names (80%)");
/// ```
#[macro_export]
macro_rules! log_column_verdict {
    ($column:expr, $sensitive:expr, $confidence:expr, $reasoning:expr) => {
        tracing::info!(
            column = %$column,
            sensitive = $sensitive,
            confidence = $confidence,
            reasoning = %$reasoning,
            "Column classified"
        );
    };
}

/// Log a NER backend failure on one text
///
/// # Example
///
/// ```no_run
/// use aidchain_anonymizer::log_backend_failure;
///
/// log_backend_failure!("ClinicalBERT", 4usize, "connection refused");
/// ```
#[macro_export]
macro_rules! log_backend_failure {
    ($backend:expr, $row:expr, $error:expr) => {
        tracing::warn!(
            backend = %$backend,
            row = $row,
            error = %$error,
            "NER backend failed, text skipped"
        );
    };
}

/// Log the completion of a pipeline run
///
/// # Example
///
/// ```no_run
/// use aidchain_anonymizer::log_pipeline_complete;
/// use std::time::Duration;
///
/// log_pipeline_complete!("patients.csv", 3, 7, Duration::from_millis(420));
/// ```
#[macro_export]
macro_rules! log_pipeline_complete {
    ($file:expr, $sensitive:expr, $total:expr, $duration:expr) => {
        tracing::info!(
            file = %$file,
            sensitive_columns = $sensitive,
            total_columns = $total,
            duration_ms = $duration.as_millis() as u64,
            "Pipeline completed"
        );
    };
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    #[test]
    fn test_macros_expand_without_subscriber() {
        crate::log_column_verdict!("email", true, 0.6, "Emails (100%)");
        crate::log_backend_failure!("lexical", 3usize, "timeout");
        crate::log_pipeline_complete!("data.csv", 1usize, 2usize, Duration::from_millis(5));
    }
}
