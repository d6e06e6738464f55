//! Domain model for composite workbook output.
//!
//! A [`Book`] declares worksheets, each carrying one or more [`Table`]s
//! placed at explicit anchors. The writer consumes this model verbatim:
//! placement is never inferred, and overlapping tables are the caller's
//! responsibility.

use crate::common::Result;
use crate::options::SheetSelector;
use crate::schema::{FieldValue, Record, schema_of};
use crate::sheet::CellValue;
use crate::xlsx::workbook::Workbook;
use std::path::Path;

/// (row, column) origin of a table on a sheet, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchor {
    /// 0-based row of the table's first (header) row
    pub row: u32,
    /// 0-based column of the table's first column
    pub column: u32,
}

impl Anchor {
    /// Create an anchor at the given 0-based coordinates.
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// One table placement: a header row at the anchor and data rows beneath.
///
/// An empty header vector writes no header row; data then starts at the
/// anchor itself.
#[derive(Debug, Clone)]
pub struct Table {
    /// Placement origin
    pub anchor: Anchor,
    /// Header cell texts, left-to-right from the anchor column
    pub header: Vec<String>,
    /// Data rows; each value maps to one cell
    pub rows: Vec<Vec<FieldValue>>,
}

impl Table {
    /// Create an empty table at an anchor.
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            header: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Set the header row.
    pub fn with_header<S: Into<String>>(mut self, header: Vec<S>) -> Self {
        self.header = header.into_iter().map(Into::into).collect();
        self
    }

    /// Append one data row.
    pub fn push_row(&mut self, row: Vec<FieldValue>) {
        self.rows.push(row);
    }

    /// Build a table from typed records.
    ///
    /// The header comes from the schema's declared column names (empty
    /// for position-based schemas); values follow schema declaration
    /// order with line-number fields omitted.
    pub fn from_records<R: Record>(anchor: Anchor, records: &[R]) -> Result<Self> {
        let schema = schema_of::<R>()?;
        let line_field = schema.line_number_field().map(|(i, _)| i);

        let mut table = Table::new(anchor).with_header(schema.header_row());
        for record in records {
            let values = record
                .to_values()
                .into_iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != line_field)
                .map(|(_, v)| v)
                .collect();
            table.push_row(values);
        }

        Ok(table)
    }

    /// Number of rows this table occupies, header included.
    pub fn height(&self) -> u32 {
        let header_rows = if self.header.is_empty() { 0 } else { 1 };
        header_rows + self.rows.len() as u32
    }
}

/// One declared worksheet.
#[derive(Debug, Clone)]
pub struct Sheet {
    /// Worksheet name
    pub name: String,
    /// Tables placed on this sheet
    pub tables: Vec<Table>,
}

impl Sheet {
    /// Create an empty sheet.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Add a table placement.
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }
}

/// A workbook declaration consumed by the writer.
#[derive(Debug, Clone, Default)]
pub struct Book {
    /// Worksheets in workbook order
    pub sheets: Vec<Sheet>,
}

impl Book {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet.
    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Load an existing workbook into the declaration model.
    ///
    /// Each worksheet becomes one table anchored at A1 holding the
    /// sheet's rows as plain values; tables can then be added alongside
    /// and the whole book saved again.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook = Workbook::open(path)?;
        let names = workbook.sheet_names();

        let mut book = Book::new();
        for name in names {
            let mut table = Table::new(Anchor::default());
            let mut max_row = 0u32;

            for row in workbook.rows(&SheetSelector::Name(name.clone()))? {
                let row = row?;
                // Preserve the original vertical position of sparse sheets
                while max_row + 1 < row.number {
                    table.push_row(Vec::new());
                    max_row += 1;
                }
                table.push_row(row.cells.iter().map(cell_to_field).collect());
                max_row = row.number;
            }

            book.sheets.push(Sheet::new(name).with_table(table));
        }

        Ok(book)
    }
}

fn cell_to_field(cell: &CellValue) -> FieldValue {
    match cell {
        CellValue::Empty => FieldValue::Null,
        CellValue::Bool(b) => FieldValue::Bool(*b),
        CellValue::Float(f) => FieldValue::Double(*f),
        CellValue::String(s) => FieldValue::Str(s.clone()),
        CellValue::DateTime(serial) => match crate::sheet::serial_to_datetime(*serial) {
            Some(dt) => FieldValue::DateTime(dt),
            None => FieldValue::Double(*serial),
        },
        CellValue::Formula(f) => FieldValue::Str(f.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, Schema, TargetType};

    struct Pair {
        key: String,
        value: i32,
        line: i64,
    }

    impl Record for Pair {
        fn schema() -> Result<Schema> {
            Schema::builder("Pair")
                .field(FieldDef::new("key", TargetType::Str).by_name("key"))
                .field(FieldDef::new("value", TargetType::Int).by_name("value"))
                .field(FieldDef::new("line", TargetType::Long).line_number())
                .build()
        }

        fn from_values(values: Vec<FieldValue>) -> Result<Self> {
            let mut it = values.into_iter();
            Ok(Pair {
                key: it
                    .next()
                    .and_then(|v| v.as_str().map(String::from))
                    .unwrap_or_default(),
                value: it.next().and_then(|v| v.as_int()).unwrap_or_default(),
                line: it.next().and_then(|v| v.as_long()).unwrap_or_default(),
            })
        }

        fn to_values(&self) -> Vec<FieldValue> {
            vec![
                FieldValue::Str(self.key.clone()),
                FieldValue::Int(self.value),
                FieldValue::Long(self.line),
            ]
        }
    }

    #[test]
    fn test_load_round_trips_written_book() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");

        let mut table = Table::new(Anchor::new(0, 0)).with_header(vec!["k", "v"]);
        table.push_row(vec![FieldValue::Str("a".to_string()), FieldValue::Double(1.0)]);
        let original = Book::new().with_sheet(Sheet::new("Data").with_table(table));
        crate::xlsx::writer::save(&original, &path).unwrap();

        let loaded = Book::load(&path).unwrap();
        assert_eq!(loaded.sheets.len(), 1);
        assert_eq!(loaded.sheets[0].name, "Data");

        let table = &loaded.sheets[0].tables[0];
        // Loaded books carry raw rows, header included, anchored at A1
        assert_eq!(table.anchor, Anchor::default());
        assert!(table.header.is_empty());
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], FieldValue::Str("k".to_string()));
        assert_eq!(table.rows[1][1], FieldValue::Double(1.0));

        // Saving the loaded model again produces a readable workbook
        let path2 = dir.path().join("book2.xlsx");
        crate::xlsx::writer::save(&loaded, &path2).unwrap();
        let reloaded = Book::load(&path2).unwrap();
        assert_eq!(reloaded.sheets[0].tables[0].rows.len(), 2);
    }

    #[test]
    fn test_table_from_records_omits_line_number() {
        let records = vec![
            Pair {
                key: "a".to_string(),
                value: 1,
                line: 2,
            },
            Pair {
                key: "b".to_string(),
                value: 2,
                line: 3,
            },
        ];

        let table = Table::from_records(Anchor::new(0, 0), &records).unwrap();
        assert_eq!(table.header, vec!["key", "value"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].len(), 2);
        assert_eq!(table.height(), 3);
    }
}
