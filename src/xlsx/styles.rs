//! Workbook styles, read side.
//!
//! The mapper only needs one fact from `xl/styles.xml`: whether a cell's
//! style formats its number as a date/time. Cell XF records are reduced
//! to their number-format id, and custom format codes are classified with
//! a scanning heuristic over the format string.

use crate::common::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::Cursor;

/// Number formats relevant to cell typing, parsed from `xl/styles.xml`.
#[derive(Debug, Default)]
pub struct Styles {
    /// Custom format codes by format id (ids >= 164)
    custom_formats: HashMap<u32, String>,
    /// Number-format id of each cell XF, indexed by the cell's `s` attribute
    cell_xfs: Vec<u32>,
}

impl Styles {
    /// Parse `xl/styles.xml`.
    pub fn parse(content: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(Cursor::new(content));
        let mut buf = Vec::new();

        let mut styles = Styles::default();
        let mut in_cell_xfs = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"cellXfs" => in_cell_xfs = true,
                    b"numFmt" => {
                        let mut id = None;
                        let mut code = None;
                        for attr in e.attributes() {
                            let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
                            let value = attr
                                .unescape_value()
                                .map_err(|e| Error::Xml(e.to_string()))?;
                            match attr.key.local_name().as_ref() {
                                b"numFmtId" => id = value.parse::<u32>().ok(),
                                b"formatCode" => code = Some(value.into_owned()),
                                _ => {}
                            }
                        }
                        if let (Some(id), Some(code)) = (id, code) {
                            styles.custom_formats.insert(id, code);
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        let mut fmt = 0u32;
                        for attr in e.attributes() {
                            let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
                            if attr.key.local_name().as_ref() == b"numFmtId" {
                                let value = attr
                                    .unescape_value()
                                    .map_err(|e| Error::Xml(e.to_string()))?;
                                fmt = value.parse::<u32>().unwrap_or(0);
                            }
                        }
                        styles.cell_xfs.push(fmt);
                    }
                    _ => {}
                },
                Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(styles)
    }

    /// Whether the cell style at `xf_index` formats numbers as dates.
    pub fn is_date_style(&self, xf_index: u32) -> bool {
        let Some(&fmt_id) = self.cell_xfs.get(xf_index as usize) else {
            return false;
        };
        self.is_date_format_id(fmt_id)
    }

    fn is_date_format_id(&self, fmt_id: u32) -> bool {
        if is_builtin_date_format(fmt_id) {
            return true;
        }
        match self.custom_formats.get(&fmt_id) {
            Some(code) => is_date_format(code),
            None => false,
        }
    }
}

/// Built-in date/time format ids (the CJK era formats included).
fn is_builtin_date_format(id: u32) -> bool {
    matches!(id, 14..=22 | 27..=36 | 45..=47 | 50..=58)
}

/// Check if a custom format code represents a date/time format.
///
/// Scans the first section of the code, skipping quoted literals,
/// escapes, and bracketed specifiers; a bare d/m/h/y/s token or an
/// AM/PM marker classifies the format as a date. Bracketed elapsed-time
/// tokens like `[h]` mark a duration, not a date.
pub fn is_date_format(format: &str) -> bool {
    let mut escaped = false;
    let mut in_quote = false;
    let mut brackets = 0u8;
    let mut elapsed = false;
    let mut am_pm = false;
    let mut prev = ' ';

    for c in format.chars() {
        match (c, escaped, in_quote, am_pm, brackets) {
            (_, true, ..) => escaped = false,
            ('_' | '\\', ..) => escaped = true,
            ('"', _, true, _, _) => in_quote = false,
            (_, _, true, _, _) => {}
            ('"', ..) => in_quote = true,
            // Only the first format section decides
            (';', ..) => return false,
            ('[', ..) => brackets += 1,
            (']', .., 1) if elapsed => return false, // elapsed time, not a date
            (']', ..) => brackets = brackets.saturating_sub(1),
            ('a' | 'A', _, _, false, 0) => am_pm = true,
            ('p' | 'm' | '/' | 'P' | 'M', _, _, true, 0) => return true,
            ('d' | 'm' | 'h' | 'y' | 's' | 'D' | 'M' | 'H' | 'Y' | 'S', _, _, false, 0) => {
                return true;
            }
            _ => {
                if !(elapsed && c.eq_ignore_ascii_case(&prev)) {
                    elapsed = prev == '[' && matches!(c, 'm' | 'h' | 's' | 'M' | 'H' | 'S');
                }
            }
        }
        prev = c;
    }

    false
}
