/// Shared strings table for written workbooks.
use crate::common::xml::escape_xml;
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

/// Mutable shared strings table.
///
/// Workbooks store frequently used strings in a shared table to reduce
/// file size. This structure manages the collection of unique strings and
/// their indices.
#[derive(Debug, Default)]
pub struct MutableSharedStrings {
    /// List of unique strings
    strings: Vec<String>,
    /// Map from string to index for fast lookup
    string_to_index: HashMap<String, usize>,
}

impl MutableSharedStrings {
    /// Create a new empty shared strings table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string to the table and return its index.
    ///
    /// If the string already exists, returns the existing index.
    pub fn add_string(&mut self, s: &str) -> usize {
        if let Some(&index) = self.string_to_index.get(s) {
            index
        } else {
            let index = self.strings.len();
            self.strings.push(s.to_string());
            self.string_to_index.insert(s.to_string(), index);
            index
        }
    }

    /// Get the number of unique strings.
    pub fn count(&self) -> usize {
        self.strings.len()
    }

    /// Serialize the table to `xl/sharedStrings.xml`.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        let _ = write!(
            xml,
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.strings.len(),
            self.strings.len()
        );

        for s in &self.strings {
            let _ = write!(xml, "<si><t xml:space=\"preserve\">{}</t></si>", escape_xml(s));
        }

        xml.push_str("</sst>");
        xml
    }
}
