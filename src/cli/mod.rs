//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for AidChain using clap.

pub mod commands;

use crate::domain::AnonymizerError;
use clap::{Parser, Subcommand};

/// Exit code for a successful run
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for configuration errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for input files that cannot be loaded
pub const EXIT_INPUT: i32 = 3;
/// Exit code for unreachable NER backends
pub const EXIT_BACKEND: i32 = 4;
/// Exit code for any other failure
pub const EXIT_FATAL: i32 = 5;

/// AidChain - PII detection and anonymization for tabular datasets
#[derive(Parser, Debug)]
#[command(name = "aidchain")]
#[command(version, about, long_about = None)]
#[command(author = "AidChain Contributors")]
pub struct Cli {
    /// Path to configuration file (defaults to aidchain.toml when present)
    #[arg(short, long, env = "AIDCHAIN_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "AIDCHAIN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect sensitive columns and write an anonymized copy of a file
    Anonymize(commands::anonymize::AnonymizeArgs),

    /// Detect sensitive columns without anonymizing
    Detect(commands::detect::DetectArgs),

    /// Probe the configured NER backends
    Health(commands::health::HealthArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

/// Exit code reported for a pipeline error
pub fn exit_code(error: &AnonymizerError) -> i32 {
    match error {
        AnonymizerError::Configuration(_) | AnonymizerError::Validation(_) => EXIT_CONFIG,
        AnonymizerError::Load(_) => EXIT_INPUT,
        AnonymizerError::Ner(_) => EXIT_BACKEND,
        _ => EXIT_FATAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExportError, LoaderError, NerError};

    #[test]
    fn test_cli_parse_anonymize() {
        let cli = Cli::parse_from(["aidchain", "anonymize", "patients.csv"]);
        assert!(cli.config.is_none());
        match cli.command {
            Commands::Anonymize(args) => assert_eq!(args.input.to_str(), Some("patients.csv")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["aidchain", "--config", "custom.toml", "detect", "a.json"]);
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
        assert!(matches!(cli.command, Commands::Detect(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["aidchain", "--log-level", "debug", "health"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Health(_)));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["aidchain", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["aidchain", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&AnonymizerError::Configuration("x".into())), EXIT_CONFIG);
        assert_eq!(
            exit_code(&LoaderError::UnsupportedFormat("exe".into()).into()),
            EXIT_INPUT
        );
        assert_eq!(exit_code(&NerError::Unavailable("down".into()).into()), EXIT_BACKEND);
        assert_eq!(exit_code(&ExportError::Io("disk full".into()).into()), EXIT_FATAL);
    }
}
