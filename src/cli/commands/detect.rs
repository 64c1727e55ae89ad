//! Detect command implementation
//!
//! This module implements the `detect` command, which classifies the columns
//! of a file and reports the verdicts without writing anything.

use crate::cli::{exit_code, EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::resolve_config;
use crate::core::Pipeline;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// File to inspect (csv, xlsx, xls, json, txt or pdf)
    pub input: PathBuf,

    /// Print the full detection report as JSON
    #[arg(long)]
    pub json: bool,
}

impl DetectArgs {
    /// Execute the detect command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting detect command");

        let config = match resolve_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration");
                eprintln!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let pipeline = match Pipeline::from_config(config).await {
            Ok(p) => p,
            Err(e) => {
                eprintln!("❌ Failed to initialize pipeline: {e}");
                return Ok(exit_code(&e));
            }
        };

        println!("🔍 DETECTION ONLY - no file will be written");

        let outcome = match pipeline.detect(&self.input).await {
            Ok(o) => o,
            Err(e) => {
                tracing::error!(error = %e, "Detection failed");
                eprintln!("❌ Detection failed: {e}");
                return Ok(exit_code(&e));
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome.report)?);
        } else {
            println!("{}", outcome.presentation().format_console());

            println!("{:<30} {:<10} {:<12} Reasoning", "Column", "Sensitive", "Confidence");
            println!("{}", "-".repeat(90));
            for verdict in &outcome.report.columns {
                println!(
                    "{:<30} {:<10} {:<12.2} {}",
                    verdict.column_name,
                    if verdict.is_sensitive { "yes" } else { "no" },
                    verdict.confidence,
                    verdict.reasoning
                );
            }
            println!();
        }

        Ok(EXIT_SUCCESS)
    }
}
