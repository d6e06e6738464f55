//! Worksheet XML emission.
//!
//! Tables from the [`Book`](crate::xlsx::book::Book) model are merged
//! into one cell grid per sheet and emitted in row order. Dates become
//! native serials with the date or date-time style, booleans native
//! boolean cells, integral numbers display without a fractional part,
//! and nulls stay blank (the cell is omitted).

use crate::common::xml::escape_xml;
use crate::schema::FieldValue;
use crate::sheet::types::display_float;
use crate::sheet::{date_to_serial, datetime_to_serial};
use crate::xlsx::book::Sheet;
use crate::xlsx::cell::coords_to_reference;
use crate::xlsx::writer::strings::MutableSharedStrings;
use crate::xlsx::writer::styles::{DATE_STYLE, DATETIME_STYLE};
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

/// Serialize one declared sheet to its worksheet XML part.
pub(crate) fn sheet_to_xml(sheet: &Sheet, shared_strings: &mut MutableSharedStrings) -> String {
    // Merge all table placements into one grid, later tables winning
    let mut grid: BTreeMap<(u32, u32), &FieldValue> = BTreeMap::new();
    let header_cells: Vec<((u32, u32), &str)> = sheet
        .tables
        .iter()
        .flat_map(|table| {
            table.header.iter().enumerate().map(move |(i, name)| {
                (
                    (table.anchor.row, table.anchor.column + i as u32),
                    name.as_str(),
                )
            })
        })
        .collect();

    for table in &sheet.tables {
        let data_start = table.anchor.row + if table.header.is_empty() { 0 } else { 1 };
        for (r, row) in table.rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                grid.insert(
                    (data_start + r as u32, table.anchor.column + c as u32),
                    value,
                );
            }
        }
    }

    let mut xml = String::with_capacity(4096);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);
    xml.push_str("<sheetData>");

    // Group cells by row; headers and data share the ordering
    let mut rows: BTreeMap<u32, Vec<(u32, Cell)>> = BTreeMap::new();
    for ((row, col), name) in &header_cells {
        rows.entry(*row)
            .or_default()
            .push((*col, Cell::SharedString(shared_strings.add_string(name))));
    }
    for ((row, col), value) in &grid {
        if let Some(cell) = field_cell(value, shared_strings) {
            rows.entry(*row).or_default().push((*col, cell));
        }
    }

    for (row_num, mut cells) in rows {
        cells.sort_by_key(|(col, _)| *col);

        let _ = write!(xml, r#"<row r="{}">"#, row_num + 1);
        for (col_num, cell) in cells {
            let cell_ref = coords_to_reference(col_num + 1, row_num + 1);
            write_cell(&mut xml, &cell_ref, &cell);
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData>");
    xml.push_str("</worksheet>");
    xml
}

/// A cell ready for emission.
enum Cell {
    SharedString(usize),
    Number(f64),
    Bool(bool),
    Date(f64),
    DateTime(f64),
}

fn field_cell(value: &FieldValue, shared_strings: &mut MutableSharedStrings) -> Option<Cell> {
    match value {
        FieldValue::Null => None,
        FieldValue::Str(s) => Some(Cell::SharedString(shared_strings.add_string(s))),
        FieldValue::Int(i) => Some(Cell::Number(*i as f64)),
        FieldValue::Long(i) => Some(Cell::Number(*i as f64)),
        FieldValue::Double(f) => Some(Cell::Number(*f)),
        FieldValue::Bool(b) => Some(Cell::Bool(*b)),
        FieldValue::Date(d) => Some(Cell::Date(date_to_serial(*d))),
        FieldValue::DateTime(dt) => Some(Cell::DateTime(datetime_to_serial(*dt))),
    }
}

/// Write a single cell to XML.
fn write_cell(xml: &mut String, cell_ref: &str, cell: &Cell) {
    match cell {
        Cell::SharedString(index) => {
            let _ = write!(xml, r#"<c r="{}" t="s"><v>{}</v></c>"#, cell_ref, index);
        }
        Cell::Number(f) => {
            let _ = write!(
                xml,
                r#"<c r="{}"><v>{}</v></c>"#,
                cell_ref,
                escape_xml(&display_float(*f))
            );
        }
        Cell::Bool(b) => {
            let _ = write!(
                xml,
                r#"<c r="{}" t="b"><v>{}</v></c>"#,
                cell_ref,
                if *b { "1" } else { "0" }
            );
        }
        Cell::Date(serial) => {
            let _ = write!(
                xml,
                r#"<c r="{}" s="{}"><v>{}</v></c>"#,
                cell_ref,
                DATE_STYLE,
                display_float(*serial)
            );
        }
        Cell::DateTime(serial) => {
            let _ = write!(
                xml,
                r#"<c r="{}" s="{}"><v>{}</v></c>"#,
                cell_ref,
                DATETIME_STYLE,
                display_float(*serial)
            );
        }
    }
}
