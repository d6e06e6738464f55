//! Shared strings table, read side.
//!
//! Workbooks store frequently used strings in `xl/sharedStrings.xml`;
//! string cells reference entries by index. Rich-text runs inside one
//! entry are concatenated to their plain text.

use crate::common::Result;
use quick_xml::Reader;
use quick_xml::events::{BytesRef, Event};
use std::io::Cursor;

/// Resolve a `&name;` or `&#NN;` general reference to its literal text.
fn resolve_general_ref(r: &BytesRef<'_>) -> Result<String> {
    if let Some(c) = r
        .resolve_char_ref()
        .map_err(|e| crate::common::Error::Xml(e.to_string()))?
    {
        return Ok(c.to_string());
    }
    let name = r
        .decode()
        .map_err(|e| crate::common::Error::Xml(e.to_string()))?;
    Ok(quick_xml::escape::resolve_predefined_entity(&name)
        .map(str::to_string)
        .unwrap_or_else(|| format!("&{name};")))
}

/// Parse `xl/sharedStrings.xml` into the index-ordered string list.
pub fn parse_shared_strings(content: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(Cursor::new(content));
    let mut buf = Vec::new();

    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"t" if in_si => in_text = true,
                _ => {}
            },
            Event::Text(t) if in_text => {
                let decoded = t
                    .decode()
                    .map_err(|e| crate::common::Error::Xml(e.to_string()))?;
                let text = quick_xml::escape::unescape(&decoded)
                    .map_err(|e| crate::common::Error::Xml(e.to_string()))?;
                current.push_str(&text);
            }
            Event::GeneralRef(r) if in_text => {
                current.push_str(&resolve_general_ref(&r)?);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = false;
                    strings.push(std::mem::take(&mut current));
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) if in_si && e.local_name().as_ref() == b"t" => {}
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}
