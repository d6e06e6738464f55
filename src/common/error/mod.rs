//! Unified error types for the tatami library.
//!
//! This module provides a single error type covering delimited parsing,
//! workbook parsing, schema construction, and the external-memory
//! pipelines, presenting a consistent API to users.

// Submodule declarations
pub mod types;

// Re-exports
pub use types::{Error, ErrorRow, Result};
