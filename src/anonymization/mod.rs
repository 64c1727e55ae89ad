//! Consistent anonymization of sensitive columns
//!
//! # Architecture
//!
//! - **Store**: bounded original -> replacement mapping shared by every run
//! - **Synthetic values**: seeded generator of realistic replacements
//! - **Strategy**: ordered category -> strategy table
//! - **Engine**: applies one strategy per sensitive column
//! - **Audit**: one line per run, with hashed originals
//! - **Report**: before/after presentation of a run
//!
//! # Usage
//!
//! ```rust
//! use aidchain_anonymizer::anonymization::SubstitutionEngine;
//! use aidchain_anonymizer::config::AnonymizationConfig;
//! use aidchain_anonymizer::detection::Category;
//! use aidchain_anonymizer::domain::{CellValue, Column};
//!
//! let engine = SubstitutionEngine::from_config(&AnonymizationConfig::default());
//! let column = Column::new("patient_id", vec![CellValue::from("P-0001")]);
//! let hashed = engine.substitute_column(&column, &[Category::Identifier], &[]);
//! assert!(hashed.values()[0].to_string().starts_with("ID_"));
//! ```

pub mod audit;
pub mod dates;
pub mod engine;
pub mod report;
pub mod store;
pub mod strategy;
pub mod synth;

pub use audit::AuditLogger;
pub use dates::DateValue;
pub use engine::SubstitutionEngine;
pub use report::{AnonymizationReport, ColumnReport, ReportOverview};
pub use store::{StoreStats, SubstitutionStore};
pub use strategy::{Strategy, STRATEGY_PRIORITY};
pub use synth::{SyntheticGenerator, SyntheticKind};
