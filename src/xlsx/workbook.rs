//! Workbook access: sheet discovery and row iteration.

use crate::common::{Error, Result};
use crate::options::SheetSelector;
use crate::xlsx::package::Container;
use crate::xlsx::shared_strings::parse_shared_strings;
use crate::xlsx::styles::Styles;
use crate::xlsx::worksheet::SheetRows;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use std::sync::Arc;

/// Information about one worksheet.
#[derive(Debug, Clone)]
pub struct SheetInfo {
    /// Worksheet name
    pub name: String,
    /// Container member holding the sheet part
    part: String,
}

/// An open workbook.
///
/// Holds the container plus the parsed shared strings and styles; sheet
/// parts are loaded lazily when their rows are requested.
pub struct Workbook<R: Read + Seek> {
    container: Container<R>,
    sheets: Vec<SheetInfo>,
    shared: Arc<Vec<String>>,
    styles: Arc<Styles>,
}

impl Workbook<BufReader<File>> {
    /// Open a workbook file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_container(Container::open(path)?)
    }
}

impl<R: Read + Seek> Workbook<R> {
    /// Open a workbook from a reader.
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::from_container(Container::new(reader)?)
    }

    fn from_container(mut container: Container<R>) -> Result<Self> {
        let workbook_xml = container.blob("xl/workbook.xml")?;
        let rels_xml = container.blob("xl/_rels/workbook.xml.rels")?;
        let rels = parse_relationships(&rels_xml)?;
        let sheets = parse_sheet_list(&workbook_xml, &rels)?;

        let shared = if container.contains("xl/sharedStrings.xml") {
            parse_shared_strings(&container.blob("xl/sharedStrings.xml")?)?
        } else {
            Vec::new()
        };

        let styles = if container.contains("xl/styles.xml") {
            Styles::parse(&container.blob("xl/styles.xml")?)?
        } else {
            Styles::default()
        };

        Ok(Self {
            container,
            sheets,
            shared: Arc::new(shared),
            styles: Arc::new(styles),
        })
    }

    /// Names of every worksheet, in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Number of worksheets.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Iterate the rows of the selected worksheet.
    pub fn rows(&mut self, selector: &SheetSelector) -> Result<SheetRows> {
        let info = match selector {
            SheetSelector::Index(i) => self.sheets.get(*i).ok_or_else(|| {
                Error::SheetNotFound(format!("index {i} of {}", self.sheets.len()))
            })?,
            SheetSelector::Name(name) => self
                .sheets
                .iter()
                .find(|s| &s.name == name)
                .ok_or_else(|| Error::SheetNotFound(name.clone()))?,
        };

        let part = info.part.clone();
        let content = self.container.blob(&part)?;
        Ok(SheetRows::new(
            content,
            Arc::clone(&self.shared),
            Arc::clone(&self.styles),
        ))
    }
}

/// Parse `xl/_rels/workbook.xml.rels` into an id-to-member map.
fn parse_relationships(content: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(Cursor::new(content));
    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
                    let value = attr
                        .unescape_value()
                        .map_err(|e| Error::Xml(e.to_string()))?;
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = Some(value.into_owned()),
                        b"Target" => target = Some(value.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rels.insert(id, resolve_target(&target));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Resolve a relationship target to a container member name.
///
/// Workbook-relative targets live under `xl/`; absolute targets carry a
/// leading slash.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

/// Parse the `<sheets>` section of `xl/workbook.xml`.
fn parse_sheet_list(
    content: &[u8],
    rels: &HashMap<String, String>,
) -> Result<Vec<SheetInfo>> {
    let mut reader = Reader::from_reader(Cursor::new(content));
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rel_id = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
                    let value = attr
                        .unescape_value()
                        .map_err(|e| Error::Xml(e.to_string()))?;
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(value.into_owned()),
                        b"id" => rel_id = Some(value.into_owned()),
                        _ => {}
                    }
                }

                let name =
                    name.ok_or_else(|| Error::Xml("sheet element without name".to_string()))?;
                let part = rel_id
                    .as_ref()
                    .and_then(|id| rels.get(id))
                    .ok_or_else(|| {
                        Error::Xml(format!("sheet {name} has no matching relationship"))
                    })?;

                sheets.push(SheetInfo {
                    name,
                    part: part.clone(),
                });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sheet_list() {
        let workbook = br#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets>
                <sheet name="First" sheetId="1" r:id="rId1"/>
                <sheet name="Second" sheetId="2" r:id="rId2"/>
            </sheets>
        </workbook>"#;
        let rels_xml = br#"<Relationships>
            <Relationship Id="rId1" Type="t" Target="worksheets/sheet1.xml"/>
            <Relationship Id="rId2" Type="t" Target="/xl/worksheets/sheet2.xml"/>
        </Relationships>"#;

        let rels = parse_relationships(rels_xml).unwrap();
        let sheets = parse_sheet_list(workbook, &rels).unwrap();

        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name, "First");
        assert_eq!(sheets[0].part, "xl/worksheets/sheet1.xml");
        assert_eq!(sheets[1].part, "xl/worksheets/sheet2.xml");
    }
}
