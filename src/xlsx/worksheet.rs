//! Streaming worksheet rows.
//!
//! [`SheetRows`] is a forward-only iterator over the rows of one
//! worksheet part, driven by `quick-xml` events over the part bytes. Each
//! cell yields a tagged [`CellValue`]; shared-string references resolve
//! through the workbook's string table and numeric cells with a date
//! style decode to their serial value. Sparse rows keep their gaps as
//! empty cells, and sheet row numbers (1-based) are preserved for
//! line-number tracking.

use crate::common::{Error, Result};
use crate::sheet::CellValue;
use crate::xlsx::cell::reference_to_coords;
use crate::xlsx::styles::Styles;
use quick_xml::Reader;
use quick_xml::events::{BytesRef, BytesStart, Event};
use std::io::Cursor;
use std::sync::Arc;

/// Resolve a `&name;` or `&#NN;` general reference to its literal text.
fn resolve_general_ref(r: &BytesRef<'_>) -> Result<String> {
    if let Some(c) = r
        .resolve_char_ref()
        .map_err(|e| Error::Xml(e.to_string()))?
    {
        return Ok(c.to_string());
    }
    let name = r.decode().map_err(|e| Error::Xml(e.to_string()))?;
    Ok(quick_xml::escape::resolve_predefined_entity(&name)
        .map(str::to_string)
        .unwrap_or_else(|| format!("&{name};")))
}

/// One worksheet row: its 1-based sheet row number and its cells in
/// column order starting at column A.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based sheet row number
    pub number: u32,
    /// Cells from column A; gaps are `Empty`
    pub cells: Vec<CellValue>,
}

impl Row {
    /// True when every cell is blank.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_blank())
    }
}

/// Attributes of one `<c>` element.
#[derive(Debug, Default)]
struct CellMeta {
    /// 0-based column index from the `r` attribute
    column: Option<usize>,
    /// The `t` attribute
    cell_type: Option<String>,
    /// The `s` attribute
    style: Option<u32>,
}

enum Step {
    Row { number: u32, self_closed: bool },
    Eof,
    Other,
}

/// Forward-only iterator over worksheet rows.
pub struct SheetRows {
    reader: Reader<Cursor<Vec<u8>>>,
    buf: Vec<u8>,
    shared: Arc<Vec<String>>,
    styles: Arc<Styles>,
    next_number: u32,
    done: bool,
}

impl SheetRows {
    /// Create an iterator over a worksheet part's bytes.
    pub(crate) fn new(content: Vec<u8>, shared: Arc<Vec<String>>, styles: Arc<Styles>) -> Self {
        Self {
            reader: Reader::from_reader(Cursor::new(content)),
            buf: Vec::new(),
            shared,
            styles,
            next_number: 1,
            done: false,
        }
    }

    fn step(&mut self) -> Result<Step> {
        let event = self.reader.read_event_into(&mut self.buf)?;
        let step = match &event {
            Event::Start(e) if e.local_name().as_ref() == b"row" => Step::Row {
                number: row_number(e).unwrap_or(self.next_number),
                self_closed: false,
            },
            Event::Empty(e) if e.local_name().as_ref() == b"row" => Step::Row {
                number: row_number(e).unwrap_or(self.next_number),
                self_closed: true,
            },
            Event::Eof => Step::Eof,
            _ => Step::Other,
        };
        Ok(step)
    }

    fn read_row_cells(&mut self, number: u32) -> Result<Row> {
        let mut cells: Vec<CellValue> = Vec::new();
        let mut buf = Vec::new();

        loop {
            let event = self.reader.read_event_into(&mut buf)?;
            let pending = match &event {
                Event::Start(e) if e.local_name().as_ref() == b"c" => {
                    Some((cell_meta(e)?, false))
                }
                Event::Empty(e) if e.local_name().as_ref() == b"c" => Some((cell_meta(e)?, true)),
                Event::End(e) if e.local_name().as_ref() == b"row" => None,
                Event::Eof => {
                    return Err(Error::Xml("unexpected end of worksheet XML".to_string()));
                }
                _ => {
                    buf.clear();
                    continue;
                }
            };

            let Some((meta, self_closed)) = pending else {
                break;
            };
            buf.clear();

            let value = if self_closed {
                CellValue::Empty
            } else {
                self.read_cell_value(&meta)?
            };
            place_cell(&mut cells, meta.column, value);
        }

        Ok(Row { number, cells })
    }

    /// Consume the children of one `<c>` element and build its value.
    fn read_cell_value(&mut self, meta: &CellMeta) -> Result<CellValue> {
        let mut buf = Vec::new();
        let mut value_text: Option<String> = None;
        let mut formula: Option<String> = None;
        let mut inline: Option<String> = None;

        #[derive(PartialEq)]
        enum Capture {
            None,
            Value,
            Formula,
            InlineText,
        }
        let mut capture = Capture::None;
        let mut in_inline = false;

        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"v" => capture = Capture::Value,
                    b"f" => capture = Capture::Formula,
                    b"is" => in_inline = true,
                    b"t" if in_inline => capture = Capture::InlineText,
                    _ => {}
                },
                Event::Text(t) => {
                    let decoded = t.decode().map_err(|e| Error::Xml(e.to_string()))?;
                    let text = quick_xml::escape::unescape(&decoded)
                        .map_err(|e| Error::Xml(e.to_string()))?;
                    match capture {
                        Capture::Value => {
                            value_text.get_or_insert_with(String::new).push_str(&text)
                        }
                        Capture::Formula => {
                            formula.get_or_insert_with(String::new).push_str(&text)
                        }
                        Capture::InlineText => {
                            inline.get_or_insert_with(String::new).push_str(&text)
                        }
                        Capture::None => {}
                    }
                }
                Event::GeneralRef(r) => {
                    let text = resolve_general_ref(&r)?;
                    match capture {
                        Capture::Value => {
                            value_text.get_or_insert_with(String::new).push_str(&text)
                        }
                        Capture::Formula => {
                            formula.get_or_insert_with(String::new).push_str(&text)
                        }
                        Capture::InlineText => {
                            inline.get_or_insert_with(String::new).push_str(&text)
                        }
                        Capture::None => {}
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"c" => break,
                    b"is" => in_inline = false,
                    b"v" | b"f" | b"t" => capture = Capture::None,
                    _ => {}
                },
                Event::Eof => {
                    return Err(Error::Xml("unexpected end of worksheet XML".to_string()));
                }
                _ => {}
            }
            buf.clear();
        }

        self.build_cell(meta, value_text, formula, inline)
    }

    fn build_cell(
        &self,
        meta: &CellMeta,
        value_text: Option<String>,
        formula: Option<String>,
        inline: Option<String>,
    ) -> Result<CellValue> {
        // Formula cells yield their source text, never the cached value
        if let Some(f) = formula {
            return Ok(CellValue::Formula(f));
        }

        let cell_type = meta.cell_type.as_deref();
        let value = match (cell_type, value_text) {
            (Some("s"), Some(v)) => {
                let index: usize = v
                    .trim()
                    .parse()
                    .map_err(|_| Error::Xml(format!("bad shared string index: {v}")))?;
                let text = self
                    .shared
                    .get(index)
                    .ok_or_else(|| Error::Xml(format!("shared string {index} out of range")))?;
                CellValue::String(text.clone())
            }
            (Some("str"), Some(v)) => CellValue::String(v),
            (Some("b"), Some(v)) => CellValue::Bool(v.trim() == "1"),
            (Some("inlineStr"), _) | (None, None) if inline.is_some() => {
                CellValue::String(inline.unwrap_or_default())
            }
            (Some("e"), Some(v)) => CellValue::String(v),
            (_, Some(v)) => {
                let number: f64 = fast_float2::parse(v.trim())
                    .map_err(|_| Error::Xml(format!("bad numeric cell value: {v}")))?;
                let is_date = meta
                    .style
                    .is_some_and(|s| self.styles.is_date_style(s));
                if is_date {
                    CellValue::DateTime(number)
                } else {
                    CellValue::Float(number)
                }
            }
            (_, None) => CellValue::Empty,
        };

        Ok(value)
    }
}

impl Iterator for SheetRows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let step = self.step();
            self.buf.clear();

            match step {
                Ok(Step::Row {
                    number,
                    self_closed,
                }) => {
                    self.next_number = number + 1;
                    if self_closed {
                        return Some(Ok(Row {
                            number,
                            cells: Vec::new(),
                        }));
                    }
                    return Some(self.read_row_cells(number));
                }
                Ok(Step::Eof) => {
                    self.done = true;
                    return None;
                }
                Ok(Step::Other) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

fn row_number(e: &BytesStart) -> Option<u32> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"r" {
            return attr
                .unescape_value()
                .ok()
                .and_then(|v| v.trim().parse().ok());
        }
    }
    None
}

fn cell_meta(e: &BytesStart) -> Result<CellMeta> {
    let mut meta = CellMeta::default();

    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(e.to_string()))?;
        match attr.key.local_name().as_ref() {
            b"r" => {
                let (col, _) = reference_to_coords(value.trim())?;
                meta.column = Some((col - 1) as usize);
            }
            b"t" => meta.cell_type = Some(value.into_owned()),
            b"s" => meta.style = value.trim().parse().ok(),
            _ => {}
        }
    }

    Ok(meta)
}

/// Place a cell at its column, padding gaps with empty cells.
fn place_cell(cells: &mut Vec<CellValue>, column: Option<usize>, value: CellValue) {
    match column {
        Some(i) => {
            while cells.len() < i {
                cells.push(CellValue::Empty);
            }
            if i < cells.len() {
                cells[i] = value;
            } else {
                cells.push(value);
            }
        }
        None => cells.push(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_of(sheet_xml: &str, shared: Vec<&str>) -> Vec<Row> {
        let shared = Arc::new(shared.into_iter().map(String::from).collect::<Vec<_>>());
        let styles = Arc::new(Styles::default());
        SheetRows::new(sheet_xml.as_bytes().to_vec(), shared, styles)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_typed_cells() {
        let xml = r#"<worksheet><sheetData>
            <row r="1">
                <c r="A1" t="s"><v>0</v></c>
                <c r="B1"><v>30</v></c>
                <c r="C1" t="b"><v>1</v></c>
            </row>
        </sheetData></worksheet>"#;

        let rows = rows_of(xml, vec!["Alice"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].number, 1);
        assert_eq!(
            rows[0].cells,
            vec![
                CellValue::String("Alice".to_string()),
                CellValue::Float(30.0),
                CellValue::Bool(true),
            ]
        );
    }

    #[test]
    fn test_sparse_row_keeps_gaps() {
        let xml = r#"<worksheet><sheetData>
            <row r="3"><c r="B3"><v>1</v></c><c r="D3"><v>2</v></c></row>
        </sheetData></worksheet>"#;

        let rows = rows_of(xml, vec![]);
        assert_eq!(rows[0].number, 3);
        assert_eq!(
            rows[0].cells,
            vec![
                CellValue::Empty,
                CellValue::Float(1.0),
                CellValue::Empty,
                CellValue::Float(2.0),
            ]
        );
    }

    #[test]
    fn test_formula_yields_source_text() {
        let xml = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="str"><f>SUM(B1:B3)</f><v>6</v></c></row>
        </sheetData></worksheet>"#;

        let rows = rows_of(xml, vec![]);
        assert_eq!(
            rows[0].cells,
            vec![CellValue::Formula("SUM(B1:B3)".to_string())]
        );
    }

    #[test]
    fn test_inline_string() {
        let xml = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="inlineStr"><is><t>hello</t></is></c></row>
        </sheetData></worksheet>"#;

        let rows = rows_of(xml, vec![]);
        assert_eq!(rows[0].cells, vec![CellValue::String("hello".to_string())]);
    }

    #[test]
    fn test_date_styled_cell_decodes_serial() {
        let styles_xml = br#"<styleSheet>
            <cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs>
        </styleSheet>"#;
        let styles = Arc::new(Styles::parse(styles_xml).unwrap());

        let xml = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" s="1"><v>43831</v></c><c r="B1" s="0"><v>43831</v></c></row>
        </sheetData></worksheet>"#;

        let rows = SheetRows::new(xml.as_bytes().to_vec(), Arc::new(Vec::new()), styles)
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(
            rows[0].cells,
            vec![CellValue::DateTime(43831.0), CellValue::Float(43831.0)]
        );
    }

    #[test]
    fn test_missing_row_numbers_are_sequential() {
        let xml = r#"<worksheet><sheetData>
            <row><c><v>1</v></c></row>
            <row><c><v>2</v></c></row>
        </sheetData></worksheet>"#;

        let rows = rows_of(xml, vec![]);
        assert_eq!(rows[0].number, 1);
        assert_eq!(rows[1].number, 2);
    }

    #[test]
    fn test_empty_self_closed_row() {
        let xml = r#"<worksheet><sheetData>
            <row r="1"><c r="A1"><v>1</v></c></row>
            <row r="2"/>
            <row r="3"><c r="A3"><v>3</v></c></row>
        </sheetData></worksheet>"#;

        let rows = rows_of(xml, vec![]);
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_empty());
        assert_eq!(rows[2].number, 3);
    }
}
