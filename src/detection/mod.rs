//! Sensitive-column detection
//!
//! Each column is classified from three weak signals:
//! - named entities found by the [`EntityExtractor`](extractor::EntityExtractor)
//! - email, phone and identifier signals from the
//!   [`ContactSignalAnalyzer`](contact::ContactSignalAnalyzer)
//! - the share of distinct values in the column
//!
//! The [`ColumnClassifier`](classifier::ColumnClassifier) combines them into a
//! [`ColumnClassification`] with a confidence and a human-readable reasoning.

pub mod classifier;
pub mod contact;
pub mod extractor;
pub mod models;
pub mod outlier;

pub use classifier::{ColumnClassifier, DatasetClassification};
pub use contact::{ContactSignalAnalyzer, ContactSignals};
pub use extractor::{EntityExtractor, Extraction, ExtractorMode, NerBackend};
pub use models::{Category, ColumnClassification, DetectedEntity, DetectionReport, EntityCounts};
