//! Common types and utilities shared across the delimited and workbook
//! implementations.
//!
//! This module provides the unified error type, charset handling, BOM
//! utilities, and the scoped temp-directory guard used by the
//! external-memory operations.

// Submodule declarations
pub mod bom;
pub mod charset;
pub mod error;
pub mod tempdir;
/// XML utilities
pub mod xml;

// Re-exports for convenience
pub use bom::{UTF8_BOM, has_bom, strip_bom, write_bom};
pub use charset::{Charset, detect_charset, detect_charset_in_stream};
pub use error::{Error, ErrorRow, Result};
pub use tempdir::TempWorkspace;
