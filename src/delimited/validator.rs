//! Column-count validation for delimited sources.
//!
//! The expectation is the count observed on the first non-empty logical
//! row (usually the header). Strict mode fails fast on the first
//! mismatch; collecting mode returns every mismatched line so the caller
//! can still read the good rows.

use crate::common::{Error, ErrorRow, Result};
use crate::delimited::writer::format_record;
use crate::delimited::open_rows;
use crate::options::ReadOptions;
use std::io::Read;

/// Maximum preview length attached to mismatch errors.
const PREVIEW_LIMIT: usize = 120;

/// Pre-scan validator for delimited sources.
#[derive(Debug, Clone)]
pub struct ColumnCountValidator {
    options: ReadOptions,
}

impl ColumnCountValidator {
    /// Create a validator with the given read options (charset and
    /// dialect are honored; mapping options are ignored).
    pub fn new(options: ReadOptions) -> Self {
        Self { options }
    }

    /// Strict pre-scan: raise on the first mismatched row.
    pub fn validate(&self, source: Box<dyn Read>) -> Result<()> {
        self.scan(source, |line, expected, actual, preview| {
            Err(Error::ColumnCountMismatch {
                line,
                expected,
                actual,
                preview,
            })
        })
    }

    /// Collecting pre-scan: return every mismatched row without raising.
    pub fn validate_and_collect(&self, source: Box<dyn Read>) -> Result<Vec<ErrorRow>> {
        let mut errors = Vec::new();
        self.scan(source, |line, expected, actual, preview| {
            errors.push(ErrorRow {
                line,
                expected,
                actual,
                message: format!(
                    "line {line}: expected {expected} columns, found {actual}: {preview}"
                ),
            });
            Ok(())
        })?;
        Ok(errors)
    }

    fn scan<F>(&self, source: Box<dyn Read>, mut on_mismatch: F) -> Result<()>
    where
        F: FnMut(u64, usize, usize, String) -> Result<()>,
    {
        let rows = open_rows(source, &self.options)?;
        let mut expected: Option<usize> = None;

        for row in rows {
            let row = row?;
            // Empty logical rows are not counted against the expectation
            if row.is_empty() {
                continue;
            }

            let actual = row.fields.len();
            match expected {
                None => expected = Some(actual),
                Some(expected) if expected == actual => {}
                Some(expected) => {
                    let preview = preview(&row.fields, &self.options);
                    on_mismatch(row.line, expected, actual, preview)?;
                }
            }
        }

        Ok(())
    }
}

/// Reconstruct the offending row, truncated at 120 characters.
fn preview(fields: &[String], options: &ReadOptions) -> String {
    let line = format_record(fields, &options.dialect);
    if line.chars().count() <= PREVIEW_LIMIT {
        return line;
    }
    let truncated: String = line.chars().take(PREVIEW_LIMIT).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ColumnCountValidator {
        ColumnCountValidator::new(ReadOptions::new())
    }

    #[test]
    fn test_consistent_source_passes() {
        let input = "a,b\n1,2\n3,4\n";
        validator().validate(Box::new(input.as_bytes())).unwrap();
    }

    #[test]
    fn test_strict_raises_first_mismatch() {
        let input = "a,b\n1,2,3\n4\n";
        let err = validator().validate(Box::new(input.as_bytes())).unwrap_err();
        match err {
            Error::ColumnCountMismatch {
                line,
                expected,
                actual,
                ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_collecting_returns_every_mismatch() {
        let input = "a,b\n1,2\n1,2,3\n4,5\n6\n";
        let errors = validator()
            .validate_and_collect(Box::new(input.as_bytes()))
            .unwrap();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 3);
        assert_eq!(errors[0].actual, 3);
        assert_eq!(errors[1].line, 5);
        assert_eq!(errors[1].actual, 1);
    }

    #[test]
    fn test_empty_rows_ignored() {
        let input = "a,b\n\n1,2\n";
        validator().validate(Box::new(input.as_bytes())).unwrap();
    }

    #[test]
    fn test_preview_truncated() {
        let long = "x".repeat(200);
        let input = format!("a,b\n{long},1,2\n");
        let errors = validator()
            .validate_and_collect(Box::new(std::io::Cursor::new(input.into_bytes())))
            .unwrap();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.ends_with('…'));
        // The embedded preview is capped at 120 chars plus the ellipsis
        let preview = errors[0].message.rsplit(": ").next().unwrap();
        assert_eq!(preview.chars().count(), 121);
    }
}
