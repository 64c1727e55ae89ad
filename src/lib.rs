// AidChain Anonymizer - PII detection and anonymization for tabular datasets
// Copyright (c) 2025 AidChain Contributors
// Licensed under the MIT License

//! # AidChain Anonymizer
//!
//! Detects personally identifying and medical information in tabular and
//! free-text datasets and replaces it with consistent synthetic values.
//!
//! ## Overview
//!
//! This library provides:
//! - **Loading** CSV, Excel, JSON, plain text and PDF files into a column-oriented [`Dataset`]
//! - **Classifying** each column by fusing named-entity counts, contact patterns and an
//!   isolation-forest identifier signal into a sensitivity score with readable reasoning
//! - **Substituting** sensitive columns with a per-category strategy (synthetic names,
//!   places, emails, phones and organizations; shifted dates; hashed identifiers;
//!   masked medical terms), keeping the same substitute for the same original value
//! - **Exporting** the anonymized dataset and an audit trail
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Pipeline orchestration and upload staging
//! - [`detection`] - Entity extraction, contact signals, outlier scoring, column classifier
//! - [`anonymization`] - Substitution store, synthetic generator, strategies, audit, reports
//! - [`adapters`] - File loading and export
//! - [`domain`] - Dataset types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aidchain_anonymizer::config::resolve_config;
//! use aidchain_anonymizer::core::Pipeline;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = resolve_config(None)?;
//!     let pipeline = Pipeline::from_config(config).await?;
//!
//!     let outcome = pipeline.process(Path::new("patients.csv")).await?;
//!     println!("{}", outcome.presentation().format_console());
//!     Ok(())
//! }
//! ```
//!
//! ## Consistent substitution
//!
//! The [`SubstitutionStore`](anonymization::SubstitutionStore) is shared by every run of a
//! pipeline, so a patient name seen in two files gets the same synthetic name in both.
//! It is a bounded LRU; [`flush`](anonymization::SubstitutionStore::flush) empties it.
//!
//! ```rust
//! use aidchain_anonymizer::anonymization::SubstitutionEngine;
//! use aidchain_anonymizer::config::AnonymizationConfig;
//! use aidchain_anonymizer::detection::Category;
//! use aidchain_anonymizer::domain::{CellValue, Column};
//!
//! let engine = SubstitutionEngine::from_config(&AnonymizationConfig::default());
//! let column = Column::new("name", vec![CellValue::from("Jean Dupont")]);
//!
//! let first = engine.substitute_column(&column, &[Category::Person], &[]);
//! let second = engine.substitute_column(&column, &[Category::Person], &[]);
//! assert_eq!(first, second);
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`], backed by [`domain::AnonymizerError`].
//! NER backend failures never abort a run: they are collected as warnings in the
//! detection report.
//!
//! [`Dataset`]: domain::Dataset

pub mod adapters;
pub mod anonymization;
pub mod cli;
pub mod config;
pub mod core;
pub mod detection;
pub mod domain;
pub mod logging;
