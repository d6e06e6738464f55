//! Delimited file dialects.

/// Quote character for all dialects.
pub const QUOTE: u8 = b'"';

/// Delimiter and quoting choices for a delimited file.
///
/// Quoting is RFC-4180: fields containing the delimiter, the quote, CR,
/// or LF are wrapped in double quotes, and embedded quotes are doubled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    delimiter: u8,
}

impl Dialect {
    /// Comma-separated values.
    pub const fn csv() -> Self {
        Self { delimiter: b',' }
    }

    /// Tab-separated values.
    pub const fn tsv() -> Self {
        Self { delimiter: b'\t' }
    }

    /// The delimiter byte.
    #[inline]
    pub const fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::csv()
    }
}

/// Line terminator emitted between written records.
///
/// Readers accept any of the three regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTerminator {
    /// Carriage return + line feed (default)
    #[default]
    Crlf,
    /// Line feed
    Lf,
    /// Carriage return
    Cr,
}

impl LineTerminator {
    /// The terminator text.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineTerminator::Crlf => "\r\n",
            LineTerminator::Lf => "\n",
            LineTerminator::Cr => "\r",
        }
    }
}
