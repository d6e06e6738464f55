//! Header location for worksheets whose header is not the first row.
//!
//! Scans a bounded window of rows for a cell whose trimmed text equals
//! the trimmed key; the first matching row becomes the header. The
//! resulting name-to-column map may be sparse (a header starting at
//! column B maps its names to columns 1..).

use crate::common::{Error, Result};
use crate::xlsx::worksheet::{Row, SheetRows};
use std::collections::HashMap;

/// A located header row: its sheet row number and name-to-column map.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    /// 1-based sheet row number of the header
    pub row: u32,
    /// Trimmed column names to 0-based column indices
    pub columns: HashMap<String, usize>,
}

/// Build the name-to-column map from a header row's non-blank cells.
///
/// Cell text is trimmed; on duplicate names the first column wins.
pub fn header_map_of(row: &Row) -> HashMap<String, usize> {
    let mut columns = HashMap::new();
    for (i, cell) in row.cells.iter().enumerate() {
        if cell.is_blank() {
            continue;
        }
        let name = cell.display().trim().to_string();
        columns.entry(name).or_insert(i);
    }
    columns
}

/// Locate the header row by key column within the scan window.
///
/// Consumes rows from the iterator up to and including the header; the
/// iterator is left positioned at the first data row. Raises
/// [`Error::HeaderNotFound`] when no cell matches within `window` rows
/// and [`Error::KeyColumnNotFound`] when the matched row's map somehow
/// lacks the key.
pub fn locate_header(rows: &mut SheetRows, key: &str, window: usize) -> Result<HeaderMap> {
    let key = key.trim();

    for _ in 0..window {
        let Some(row) = rows.next() else {
            break;
        };
        let row = row?;

        let matched = row
            .cells
            .iter()
            .any(|cell| !cell.is_blank() && cell.display().trim() == key);
        if !matched {
            continue;
        }

        let columns = header_map_of(&row);
        if !columns.contains_key(key) {
            return Err(Error::KeyColumnNotFound {
                key: key.to_string(),
            });
        }

        log::debug!("header row located at sheet row {}", row.number);
        return Ok(HeaderMap {
            row: row.number,
            columns,
        });
    }

    Err(Error::HeaderNotFound {
        key: key.to_string(),
        window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::CellValue;
    use crate::xlsx::styles::Styles;
    use std::sync::Arc;

    fn sheet(xml: &str) -> SheetRows {
        SheetRows::new(
            xml.as_bytes().to_vec(),
            Arc::new(Vec::new()),
            Arc::new(Styles::default()),
        )
    }

    const SHEET_WITH_TITLE: &str = r#"<worksheet><sheetData>
        <row r="1"><c r="A1" t="str"><v>Title</v></c></row>
        <row r="2"/>
        <row r="3">
            <c r="B3" t="str"><v> name </v></c>
            <c r="C3" t="str"><v>age</v></c>
        </row>
        <row r="4"><c r="B4" t="str"><v>Alice</v></c><c r="C4"><v>30</v></c></row>
    </sheetData></worksheet>"#;

    #[test]
    fn test_header_found_past_preamble() {
        let mut rows = sheet(SHEET_WITH_TITLE);
        let header = locate_header(&mut rows, "name", 10).unwrap();

        assert_eq!(header.row, 3);
        // Sparse header: names map to their actual columns
        assert_eq!(header.columns["name"], 1);
        assert_eq!(header.columns["age"], 2);

        // Iterator is positioned at the first data row
        let data = rows.next().unwrap().unwrap();
        assert_eq!(data.number, 4);
        assert_eq!(data.cells[1], CellValue::String("Alice".to_string()));
    }

    #[test]
    fn test_key_is_trimmed_on_both_sides() {
        let mut rows = sheet(SHEET_WITH_TITLE);
        let header = locate_header(&mut rows, "  name ", 10).unwrap();
        assert_eq!(header.row, 3);
    }

    #[test]
    fn test_header_not_found_within_window() {
        let mut rows = sheet(SHEET_WITH_TITLE);
        let err = locate_header(&mut rows, "name", 2).unwrap_err();
        assert!(matches!(err, Error::HeaderNotFound { window: 2, .. }));
    }

    #[test]
    fn test_missing_key_entirely() {
        let mut rows = sheet(SHEET_WITH_TITLE);
        let err = locate_header(&mut rows, "salary", 10).unwrap_err();
        assert!(matches!(err, Error::HeaderNotFound { .. }));
    }
}
