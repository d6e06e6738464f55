//! Common types for spreadsheet operations.

use crate::sheet::date::serial_to_datetime;

/// Types of data that can be stored in a cell.
///
/// This is the "raw cell" side of record mapping: delimited sources only
/// ever produce `String` cells, workbook sources produce the full range.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// Boolean value
    Bool(bool),
    /// 64-bit floating point number
    Float(f64),
    /// String value
    String(String),
    /// Date/time value (stored as workbook serial number)
    DateTime(f64),
    /// Formula source text (without leading '='); never the computed value
    Formula(String),
}

impl CellValue {
    /// Static reference to an empty cell value for zero-copy returns.
    pub const EMPTY: &'static CellValue = &CellValue::Empty;

    /// True for `Empty` and for strings that trim to nothing.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Get the value as a string slice if it's a String variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a float if it's a Float variant.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Render the cell as display text.
    ///
    /// Integral floats render in integer form (no trailing ".0"); date
    /// serials render as `yyyy-mm-dd HH:MM:SS`.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => (if *b { "true" } else { "false" }).to_string(),
            CellValue::Float(f) => display_float(*f),
            CellValue::String(s) => s.clone(),
            CellValue::DateTime(serial) => match serial_to_datetime(*serial) {
                Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => display_float(*serial),
            },
            CellValue::Formula(f) => f.clone(),
        }
    }
}

/// Format a float, using the integer display form when the value is
/// integral.
pub fn display_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 {
        let mut buf = itoa::Buffer::new();
        buf.format(f as i64).to_string()
    } else {
        let mut buf = ryu::Buffer::new();
        buf.format(f).to_string()
    }
}

// Implement From for convenient cell value creation

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        Self::Float(i as f64)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        Self::Float(i as f64)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_float_display() {
        assert_eq!(CellValue::Float(30.0).display(), "30");
        assert_eq!(CellValue::Float(-2.0).display(), "-2");
        assert_eq!(CellValue::Float(2.5).display(), "2.5");
    }

    #[test]
    fn test_blank_detection() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::String("  ".to_string()).is_blank());
        assert!(!CellValue::String("x".to_string()).is_blank());
        assert!(!CellValue::Float(0.0).is_blank());
    }
}
