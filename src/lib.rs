//! Tatami - typed tabular record I/O with external-memory ordering
//!
//! This library reads and writes tabular record data (delimited text and
//! XLSX workbooks) against user-defined record types, with emphasis on
//! bounded-memory processing of files larger than available RAM.
//!
//! # Features
//!
//! - **Typed record mapping**: Bind delimited rows and worksheet rows to
//!   user record types with header-name or positional schemas
//! - **External sort**: Chunked in-memory sort plus k-way merge on temp
//!   files; peak memory is bounded by the chunk size, not the input size
//! - **Group partition and sort**: Route records to per-key spill files,
//!   sort each group independently, and stream ordered groups
//! - **Charset handling**: UTF-8 (with or without BOM), Shift_JIS,
//!   EUC-JP, and Windows-31J, with automatic detection
//! - **Column-count validation**: Fail fast or collect mismatched rows
//!   while still reading the good ones
//!
//! # Example - Reading a CSV file
//!
//! ```no_run
//! use tatami::delimited::read_path;
//! use tatami::schema::{FieldDef, FieldValue, Record, Schema, TargetType};
//! use tatami::ReadOptions;
//!
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! impl Record for Person {
//!     fn schema() -> tatami::Result<Schema> {
//!         Schema::builder("Person")
//!             .field(FieldDef::new("name", TargetType::Str).by_name("name"))
//!             .field(FieldDef::new("age", TargetType::Int).by_name("age"))
//!             .build()
//!     }
//!
//!     fn from_values(values: Vec<FieldValue>) -> tatami::Result<Self> {
//!         let mut it = values.into_iter();
//!         Ok(Person {
//!             name: it.next().and_then(|v| v.as_str().map(String::from)).unwrap_or_default(),
//!             age: it.next().and_then(|v| v.as_int()).unwrap_or_default(),
//!         })
//!     }
//!
//!     fn to_values(&self) -> Vec<FieldValue> {
//!         vec![FieldValue::Str(self.name.clone()), FieldValue::Int(self.age)]
//!     }
//! }
//!
//! # fn main() -> tatami::Result<()> {
//! let people: Vec<Person> = read_path("people.csv", ReadOptions::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Sorting a file larger than RAM
//!
//! ```no_run
//! use tatami::extsort::ExternalSorter;
//!
//! # fn main() -> tatami::Result<()> {
//! ExternalSorter::new()
//!     .with_chunk_size(64 * 1024 * 1024)
//!     .with_header(true)
//!     .sort("input.csv", "sorted.csv", |a, b| a.cmp(b))?;
//! # Ok(())
//! # }
//! ```

/// Common types: errors, charsets, BOM handling, temp workspaces
pub mod common;

/// Delimited text (CSV/TSV) reading, writing, and validation
pub mod delimited;

/// External-memory sorting and group partitioning
pub mod extsort;

/// Reader/writer configuration structs
pub mod options;

/// Parallel multi-file reading
pub mod parallel;

/// Record schemas, converters, and the schema cache
pub mod schema;

/// Spreadsheet cell values and date serial conversions
pub mod sheet;

/// XLSX workbook reading and writing
pub mod xlsx;

// Re-export commonly used types for convenience
pub use common::{Charset, Error, ErrorRow, Result};
pub use options::{ReadOptions, SheetSelector, WriteOptions};
pub use schema::{FieldDef, FieldValue, Record, Schema, TargetType};
