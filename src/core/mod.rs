//! Pipeline orchestration.
//!
//! - [`pipeline`] - Load, classify, substitute, export and audit one dataset
//! - [`staging`] - Uploaded files staged on disk for the length of a run
//!
//! # Example
//!
//! ```rust,no_run
//! use aidchain_anonymizer::config::load_config;
//! use aidchain_anonymizer::core::Pipeline;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("aidchain.toml")?;
//! let pipeline = Pipeline::from_config(config).await?;
//!
//! let outcome = pipeline.process(Path::new("patients.csv")).await?;
//! println!("Sensitive: {:?}", outcome.sensitive_columns);
//! println!("Written to {}", outcome.output_path.display());
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod staging;

pub use pipeline::{DetectionOutcome, Pipeline, PipelineOutcome, UPDATE_EXAMPLE_ROWS};
pub use staging::StagedFile;
