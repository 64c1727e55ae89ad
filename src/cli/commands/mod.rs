//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod anonymize;
pub mod detect;
pub mod health;
pub mod init;
pub mod validate;
