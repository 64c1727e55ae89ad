//! File adapters.
//!
//! - [`loader`] - Reads uploaded files (csv, xlsx, xls, json, txt, pdf) into a [`Dataset`]
//! - [`export`] - Writes anonymized datasets in the source format's conventions
//!
//! Loading sits behind the [`FileLoader`] trait so the pipeline can be driven
//! by in-memory fixtures in tests.
//!
//! ```rust,no_run
//! use aidchain_anonymizer::adapters::{DefaultFileLoader, Exporter, FileLoader};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let loaded = DefaultFileLoader.load(Path::new("patients.csv"))?;
//! let path = Exporter::new("anonymized").export(
//!     &loaded.dataset,
//!     Path::new("patients.csv"),
//!     loaded.format,
//! )?;
//! println!("written to {}", path.display());
//! # Ok(())
//! # }
//! ```
//!
//! [`Dataset`]: crate::domain::Dataset

pub mod export;
pub mod loader;

pub use export::Exporter;
pub use loader::{
    DefaultFileLoader, FileLoader, LoadedDataset, SourceFormat, ALLOWED_EXTENSIONS,
};
