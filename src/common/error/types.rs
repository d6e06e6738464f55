//! Unified error type for tatami operations.
use thiserror::Error;

/// Main error type for tatami operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unparseable quoting in delimited input
    #[error("malformed record at line {line}")]
    MalformedRecord {
        /// 1-based logical line number
        line: u64,
    },

    /// Column count differs from the expectation set by the first row
    #[error("column count mismatch at line {line}: expected {expected} columns, found {actual}: {preview}")]
    ColumnCountMismatch {
        /// 1-based logical line number
        line: u64,
        /// Count observed on the first non-empty row
        expected: usize,
        /// Count observed on this row
        actual: usize,
        /// Offending row text, truncated at 120 characters
        preview: String,
    },

    /// No header row matched the key column within the scan window
    #[error("header row not found: no cell equals {key:?} within the first {window} rows")]
    HeaderNotFound {
        /// Key column name searched for
        key: String,
        /// Number of rows scanned
        window: usize,
    },

    /// The located header row does not contain the configured key column
    #[error("key column {key:?} missing from the located header row")]
    KeyColumnNotFound {
        /// Key column name
        key: String,
    },

    /// A cell value cannot be converted to the field's target type
    #[error("cannot convert {raw:?} to {target} (row {row}, column {column}): {cause}")]
    CellConversion {
        /// 1-based source row
        row: u64,
        /// Column name or 0-based position
        column: String,
        /// Raw cell text
        raw: String,
        /// Target type name
        target: &'static str,
        /// Underlying cause
        cause: String,
    },

    /// A record type mixes name and position bindings
    #[error("record type {0} mixes name-based and position-based bindings")]
    MixedBinding(&'static str),

    /// Record type declaration problem other than mixed bindings
    #[error("schema error: {0}")]
    Schema(String),

    /// Named or indexed worksheet absent from the workbook
    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    /// Temporary workspace cannot be created
    #[error("cannot create temporary workspace: {0}")]
    TempDir(String),

    /// XML parsing error in a workbook part
    #[error("XML error: {0}")]
    Xml(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Byte sequence not valid in the configured charset
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::Xml(e.to_string())
    }
}

/// One mismatched row recorded by the collecting column-count validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRow {
    /// 1-based logical line number of the offending row
    pub line: u64,
    /// Column count observed on the first non-empty row
    pub expected: usize,
    /// Column count observed on this row
    pub actual: usize,
    /// Human-readable description with a truncated row preview
    pub message: String,
}

/// Result type for tatami operations.
pub type Result<T> = std::result::Result<T, Error>;
