//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use crate::config::DEFAULT_CONFIG_FILE;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing AidChain configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Point [[ner.backends]] at your token-classification endpoints");
                println!("     (without backends the built-in lexical tagger is used)");
                println!("  3. Put API tokens in a .env file, e.g. HF_TOKEN=...");
                println!("  4. Validate configuration: aidchain validate-config");
                println!("  5. Check backends: aidchain health");
                println!("  6. Anonymize a file: aidchain anonymize data.csv");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# AidChain Anonymizer Configuration

[application]
log_level = "info"

[detection]
threshold = 0.30
sample_size = 200

# [[ner.backends]]
# name = "ClinicalBERT"
# role = "medical"
# endpoint = "http://localhost:8081/ner"
# api_token = "${HF_TOKEN}"

[anonymization]
seed = 42
date_shift_days = 365
cache_capacity = 100000

[output]
directory = "anonymized"
upload_directory = "uploads"

[audit]
enabled = false

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# AidChain Anonymizer Configuration
#
# Every setting has a default; remove what you do not need to change.
# Values of the form ${VAR} are read from the environment (or .env).
# Any setting can also be overridden with AIDCHAIN_<SECTION>_<KEY>,
# e.g. AIDCHAIN_DETECTION_THRESHOLD=0.4

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Column Classification
# ============================================================================
[detection]
# A column is sensitive when its score reaches this value (0.0 - 1.0)
threshold = 0.30

# Values sampled per column, with a fixed seed for reproducible verdicts
sample_size = 200
sample_seed = 42

# Values offered to NER per column, and characters kept per value
ner_max_items = 30
ner_max_chars = 500

# Values shorter than this (ignoring whitespace) are not sent to NER
min_text_chars = 3

# Concurrent NER requests per column, and columns classified concurrently
ner_concurrency = 4
column_concurrency = 4

# Identifier detection (isolation forest over character features)
[detection.outlier]
contamination = 0.1
n_estimators = 100
seed = 42
min_samples = 10
max_samples = 100
id_ratio_threshold = 0.2

# ============================================================================
# NER Backends
# ============================================================================
[ner]
# Probe backends at startup; unreachable ones are dropped
probe_on_startup = true

# Token-classification endpoints ({"inputs": text} -> [{entity_group, score, word}])
# Without any backend, or when none answers, the lexical tagger is used.
#
# [[ner.backends]]
# name = "ClinicalBERT"
# role = "medical"          # medical | general
# endpoint = "http://localhost:8081/ner"
# api_token = "${HF_TOKEN}"
# timeout_seconds = 30
#
# [[ner.backends]]
# name = "multilingual"
# role = "general"
# endpoint = "http://localhost:8082/ner"

# ============================================================================
# Substitution
# ============================================================================
[anonymization]
# Seed of the synthetic value generator
seed = 42

# Dates are shifted by one random offset in [-N, +N] days per process
date_shift_days = 365

# Original values remembered with their substitute (LRU)
cache_capacity = 100000

# Prefix of hashed identifiers (ID_1A2B3C4D) and masked terms (MED_0042)
id_prefix = "ID_"
mask_prefix = "MED_"
id_hash_length = 8

# Which detected terms are masked in free text
[anonymization.masking]
min_length = 3
min_confidence = 0.4
stopwords = ["the", "and", "for", "with", "from", "this", "that", "are", "was", "were"]

# Only replace whole words ("cell" does not rewrite "cellular")
whole_word_only = true

# ============================================================================
# Output
# ============================================================================
[output]
# Anonymized files: <name>_anonymized_<YYYYMMDD_HHMMSS>.<ext>
directory = "anonymized"

# Uploads are staged here for the length of a run
upload_directory = "uploads"

# ============================================================================
# Audit Log
# ============================================================================
[audit]
# One entry per processed file; original values are stored as SHA-256 hashes
enabled = false
log_path = "./audit/anonymization.log"
json_format = true

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local file logging (JSON lines)
local_enabled = false

# Local log directory
local_path = "./logs"

# Log rotation (daily, hourly or never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnonymizerConfig;
    use tempfile::TempDir;

    fn parse(content: &str) -> AnonymizerConfig {
        let config: AnonymizerConfig = toml::from_str(content).unwrap();
        config.validate().unwrap();
        config
    }

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: DEFAULT_CONFIG_FILE.to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "aidchain.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_are_valid() {
        let minimal = parse(&InitArgs::generate_minimal_config());
        let full = parse(&InitArgs::generate_config_with_examples());

        assert_eq!(minimal.detection.threshold, 0.30);
        assert!(full.anonymization.masking.whole_word_only);
        assert!(full.ner.backends.is_empty());
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("aidchain.toml");
        fs::write(&output, "# existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().into_owned(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);
        assert_eq!(fs::read_to_string(&output).unwrap(), "# existing");

        let forced = InitArgs { force: true, ..args };
        assert_eq!(forced.execute().await.unwrap(), EXIT_SUCCESS);
        assert!(fs::read_to_string(&output).unwrap().contains("[anonymization]"));
    }
}
