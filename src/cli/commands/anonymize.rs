//! Anonymize command implementation
//!
//! This module implements the `anonymize` command: detect the sensitive
//! columns of a file, substitute them and write the anonymized copy.

use crate::cli::{exit_code, EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use crate::config::resolve_config;
use crate::core::Pipeline;
use crate::detection::ExtractorMode;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the anonymize command
#[derive(Args, Debug)]
pub struct AnonymizeArgs {
    /// File to anonymize (csv, xlsx, xls, json, txt or pdf)
    pub input: PathBuf,

    /// Override the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Write the JSON report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the report as JSON instead of the console summary
    #[arg(long)]
    pub json: bool,

    /// Also print the first anonymized rows
    #[arg(long)]
    pub show_example: bool,
}

impl AnonymizeArgs {
    /// Execute the anonymize command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting anonymize command");

        let mut config = match resolve_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration");
                eprintln!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Some(dir) = &self.output_dir {
            tracing::info!(output_dir = %dir.display(), "Overriding output directory from CLI");
            config.output.directory = dir.clone();
        }

        let pipeline = match Pipeline::from_config(config).await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize pipeline");
                eprintln!("❌ Failed to initialize pipeline: {e}");
                return Ok(exit_code(&e));
            }
        };

        if pipeline.extractor_mode() == ExtractorMode::Degraded {
            eprintln!("⚠️  No NER backend available, using the built-in lexical tagger");
        }

        let outcome = match pipeline.process(&self.input).await {
            Ok(o) => o,
            Err(e) => {
                tracing::error!(error = %e, "Anonymization failed");
                eprintln!("❌ Anonymization failed: {e}");
                return Ok(exit_code(&e));
            }
        };

        let report = outcome.presentation();

        if self.json {
            println!("{}", report.format_json()?);
        } else {
            println!("{}", report.format_console());
        }

        if self.show_example {
            println!("📄 Update example:");
            println!("{}", outcome.update_example);
        }

        if let Some(path) = &self.report {
            if let Err(e) = report.write_to_file(path) {
                eprintln!("❌ Failed to write report to {}: {e}", path.display());
                return Ok(EXIT_FATAL);
            }
            println!("📝 Report written to {}", path.display());
        }

        println!("✅ Anonymized file: {}", outcome.output_path.display());
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: AnonymizeArgs,
    }

    #[test]
    fn test_anonymize_args_defaults() {
        let args = Harness::parse_from(["anonymize", "data.csv"]).args;

        assert_eq!(args.input, PathBuf::from("data.csv"));
        assert!(args.output_dir.is_none());
        assert!(args.report.is_none());
        assert!(!args.json);
        assert!(!args.show_example);
    }

    #[test]
    fn test_anonymize_args_with_overrides() {
        let args = Harness::parse_from([
            "anonymize",
            "data.json",
            "--output-dir",
            "/tmp/out",
            "--report",
            "report.json",
            "--json",
        ])
        .args;

        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(args.report, Some(PathBuf::from("report.json")));
        assert!(args.json);
    }

    #[tokio::test]
    async fn test_missing_config_file_is_config_error() {
        let args = Harness::parse_from(["anonymize", "data.csv"]).args;
        let code = args.execute(Some("/nonexistent/aidchain.toml")).await.unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
