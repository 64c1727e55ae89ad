//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the AidChain configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::{load_config, DEFAULT_CONFIG_FILE};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already validates, so a file that loads is valid.
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        let config_path = config_path.unwrap_or(DEFAULT_CONFIG_FILE);
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Sensitivity Threshold: {:.2}", config.detection.threshold);
        println!("  Sample Size: {}", config.detection.sample_size);
        println!("  Column Concurrency: {}", config.detection.column_concurrency);
        if config.ner.backends.is_empty() {
            println!("  NER Backends: none (lexical tagger)");
        } else {
            for backend in &config.ner.backends {
                println!(
                    "  NER Backend: {} ({}) -> {}{}",
                    backend.name,
                    backend.role,
                    backend.endpoint,
                    if backend.api_token.is_some() { " [token]" } else { "" }
                );
            }
        }
        println!(
            "  Date Shift: ±{} days",
            config.anonymization.date_shift_days
        );
        println!("  Cache Capacity: {}", config.anonymization.cache_capacity);
        println!(
            "  Word-Boundary Masking: {}",
            config.anonymization.masking.whole_word_only
        );
        println!("  Output Directory: {}", config.output.directory.display());
        println!(
            "  Audit Log: {}",
            if config.audit.enabled {
                config.audit.log_path.display().to_string()
            } else {
                "disabled".to_string()
            }
        );
        println!();
        Ok(EXIT_SUCCESS)
    }
}
