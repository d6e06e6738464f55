//! Value-typed configuration for readers and writers.

use crate::common::Charset;
use crate::delimited::dialect::{Dialect, LineTerminator};

/// Worksheet selector for workbook reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// 0-based sheet index
    Index(usize),
    /// Sheet name
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

/// Configuration for typed reads from delimited and workbook sources.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Charset of delimited sources; `None` auto-detects (default)
    pub charset: Option<Charset>,
    /// Delimited dialect (default CSV)
    pub dialect: Dialect,
    /// Number of data records skipped after parsing (not bytes)
    pub skip_lines: usize,
    /// Column name locating the header row in a workbook sheet; `None`
    /// takes the first non-empty row as the header
    pub header_key: Option<String>,
    /// Bounded scan window for header location (default 10 rows)
    pub header_search_rows: usize,
    /// Which sheet of a workbook to read (default first)
    pub sheet: SheetSelector,
    /// Skip rows whose cells are all blank (default true)
    pub skip_empty_rows: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            charset: None,
            dialect: Dialect::csv(),
            skip_lines: 0,
            header_key: None,
            header_search_rows: 10,
            sheet: SheetSelector::default(),
            skip_empty_rows: true,
        }
    }
}

impl ReadOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit charset, disabling auto-detection.
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = Some(charset);
        self
    }

    /// Set the delimited dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Skip the first `n` data records after parsing.
    pub fn with_skip_lines(mut self, n: usize) -> Self {
        self.skip_lines = n;
        self
    }

    /// Locate the workbook header row by this column name.
    pub fn with_header_key(mut self, key: &str) -> Self {
        self.header_key = Some(key.to_string());
        self
    }

    /// Bound the header scan window.
    pub fn with_header_search_rows(mut self, rows: usize) -> Self {
        self.header_search_rows = rows;
        self
    }

    /// Select the worksheet to read.
    pub fn with_sheet(mut self, sheet: SheetSelector) -> Self {
        self.sheet = sheet;
        self
    }

    /// Surface empty rows instead of skipping them.
    pub fn with_empty_rows(mut self) -> Self {
        self.skip_empty_rows = false;
        self
    }
}

/// Configuration for typed writes to delimited sinks.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Output charset (default UTF-8, no BOM)
    pub charset: Charset,
    /// Delimited dialect (default CSV)
    pub dialect: Dialect,
    /// Line terminator (default CRLF)
    pub terminator: LineTerminator,
    /// Emit the schema's header row before the first record (name-based
    /// schemas only; default true)
    pub write_header: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            charset: Charset::Utf8,
            dialect: Dialect::csv(),
            terminator: LineTerminator::Crlf,
            write_header: true,
        }
    }
}

impl WriteOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output charset.
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Set the delimited dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the line terminator.
    pub fn with_terminator(mut self, terminator: LineTerminator) -> Self {
        self.terminator = terminator;
        self
    }

    /// Suppress the header row.
    pub fn without_header(mut self) -> Self {
        self.write_header = false;
        self
    }
}
