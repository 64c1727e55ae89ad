//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::AnonymizerConfig;
use crate::domain::errors::AnonymizerError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "aidchain.toml";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into AnonymizerConfig
/// 4. Applies environment variable overrides (AIDCHAIN_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use aidchain_anonymizer::config::loader::load_config;
///
/// let config = load_config("aidchain.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<AnonymizerConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AnonymizerError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        AnonymizerError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Resolves the configuration for a command.
///
/// An explicit path must exist. Without one, `aidchain.toml` in the working
/// directory is used when present, and built-in defaults otherwise.
pub fn resolve_config(path: Option<&str>) -> Result<AnonymizerConfig> {
    match path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load_config(DEFAULT_CONFIG_FILE),
        None => {
            tracing::debug!("No configuration file found, using defaults");
            let mut config = AnonymizerConfig::default();
            apply_env_overrides(&mut config)?;
            validate(&config)?;
            Ok(config)
        }
    }
}

/// Parses configuration text: substitution, parsing, overrides, validation
pub fn parse_config(contents: &str) -> Result<AnonymizerConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: AnonymizerConfig = toml::from_str(&contents)
        .map_err(|e| AnonymizerError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &AnonymizerConfig) -> Result<()> {
    config.validate().map_err(|e| {
        AnonymizerError::Configuration(format!("Configuration validation failed: {e}"))
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| AnonymizerError::Configuration(e.to_string()))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(AnonymizerError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Parses a numeric override, reporting the variable on failure
fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        AnonymizerError::Configuration(format!("Invalid value '{value}' for {name}"))
    })
}

/// Applies environment variable overrides using AIDCHAIN_* prefix
///
/// Environment variables follow the pattern: AIDCHAIN_<SECTION>_<KEY>
/// For example: AIDCHAIN_DETECTION_THRESHOLD, AIDCHAIN_OUTPUT_DIRECTORY
fn apply_env_overrides(config: &mut AnonymizerConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("AIDCHAIN_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Detection overrides
    if let Ok(val) = std::env::var("AIDCHAIN_DETECTION_THRESHOLD") {
        config.detection.threshold = parse_override("AIDCHAIN_DETECTION_THRESHOLD", &val)?;
    }
    if let Ok(val) = std::env::var("AIDCHAIN_DETECTION_SAMPLE_SIZE") {
        config.detection.sample_size = parse_override("AIDCHAIN_DETECTION_SAMPLE_SIZE", &val)?;
    }
    if let Ok(val) = std::env::var("AIDCHAIN_DETECTION_NER_MAX_CHARS") {
        config.detection.ner_max_chars = parse_override("AIDCHAIN_DETECTION_NER_MAX_CHARS", &val)?;
    }
    if let Ok(val) = std::env::var("AIDCHAIN_DETECTION_COLUMN_CONCURRENCY") {
        config.detection.column_concurrency =
            parse_override("AIDCHAIN_DETECTION_COLUMN_CONCURRENCY", &val)?;
    }

    // NER overrides
    if let Ok(val) = std::env::var("AIDCHAIN_NER_PROBE_ON_STARTUP") {
        config.ner.probe_on_startup = val.parse().unwrap_or(true);
    }

    // Anonymization overrides
    if let Ok(val) = std::env::var("AIDCHAIN_ANONYMIZATION_SEED") {
        config.anonymization.seed = parse_override("AIDCHAIN_ANONYMIZATION_SEED", &val)?;
    }
    if let Ok(val) = std::env::var("AIDCHAIN_ANONYMIZATION_DATE_SHIFT_DAYS") {
        config.anonymization.date_shift_days =
            parse_override("AIDCHAIN_ANONYMIZATION_DATE_SHIFT_DAYS", &val)?;
    }
    if let Ok(val) = std::env::var("AIDCHAIN_ANONYMIZATION_CACHE_CAPACITY") {
        config.anonymization.cache_capacity =
            parse_override("AIDCHAIN_ANONYMIZATION_CACHE_CAPACITY", &val)?;
    }

    // Output overrides
    if let Ok(val) = std::env::var("AIDCHAIN_OUTPUT_DIRECTORY") {
        config.output.directory = val.into();
    }
    if let Ok(val) = std::env::var("AIDCHAIN_OUTPUT_UPLOAD_DIRECTORY") {
        config.output.upload_directory = val.into();
    }

    // Audit overrides
    if let Ok(val) = std::env::var("AIDCHAIN_AUDIT_ENABLED") {
        config.audit.enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("AIDCHAIN_AUDIT_LOG_PATH") {
        config.audit.log_path = val.into();
    }

    // Logging overrides
    if let Ok(val) = std::env::var("AIDCHAIN_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("AIDCHAIN_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("AIDCHAIN_LOADER_TEST_VAR", "test_value");
        let input = "api_token = \"${AIDCHAIN_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "api_token = \"test_value\"\n");
        std::env::remove_var("AIDCHAIN_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("AIDCHAIN_LOADER_MISSING_VAR");
        let input = "api_token = \"${AIDCHAIN_LOADER_MISSING_VAR}\"";
        let result = substitute_env_vars(input);
        assert!(result.is_err());
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# token = \"${AIDCHAIN_LOADER_COMMENTED_VAR}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[detection]
threshold = 0.5
sample_size = 100

[[ner.backends]]
name = "XLM-RoBERTa"
role = "general"
endpoint = "http://localhost:8082/ner"

[anonymization]
date_shift_days = 30
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.detection.threshold, 0.5);
        assert_eq!(config.ner.backends[0].role, crate::config::BackendRole::General);
        assert_eq!(config.anonymization.date_shift_days, 30);
        assert_eq!(config.anonymization.id_prefix, "ID_");
    }

    #[test]
    fn test_parse_config_rejects_invalid_values() {
        let err = parse_config("[detection]\nthreshold = 2.0\n").unwrap_err();
        assert!(err.to_string().contains("detection.threshold"));
    }
}
