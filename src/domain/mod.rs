//! Domain models and types.
//!
//! The domain layer provides:
//! - **Dataset model** ([`Dataset`], [`Column`], [`CellValue`])
//! - **Error types** ([`AnonymizerError`], [`LoaderError`], [`ExportError`], [`NerError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible library operations return [`Result<T, AnonymizerError>`]:
//!
//! ```rust
//! use aidchain_anonymizer::domain::{Dataset, Result};
//!
//! fn example() -> Result<()> {
//!     // Errors are automatically converted using the ? operator
//!     let dataset = Dataset::from_records(&[])?;
//!     assert_eq!(dataset.shape(), (0, 0));
//!     Ok(())
//! }
//! ```

pub mod dataset;
pub mod errors;
pub mod result;

// Re-export commonly used types for convenience
pub use dataset::{CellValue, Column, Dataset};
pub use errors::{AnonymizerError, ExportError, LoaderError, NerError};
pub use result::Result;
