//! XLSX workbook reading and writing.
//!
//! Reading is forward-only and typed: the workbook container exposes
//! streaming row iterators per sheet, the header locator finds name-based
//! headers inside a bounded window, and the record reader binds rows to
//! user record types. Writing consumes the [`book`] declaration model:
//! sheets with tables placed at explicit anchors.

// Submodule declarations
pub mod book;
pub mod cell;
pub mod header;
pub mod package;
pub mod reader;
pub mod shared_strings;
pub mod styles;
pub mod workbook;
pub mod worksheet;
pub mod writer;

// Re-exports for convenience
pub use book::{Anchor, Book, Sheet, Table};
pub use header::{HeaderMap, locate_header};
pub use reader::{SheetRecordReader, read_sheet};
pub use workbook::Workbook;
pub use worksheet::{Row, SheetRows};
pub use writer::{save, write_to};
