//! Workbook assembly: serialize a [`Book`] declaration to an XLSX
//! package.

use crate::common::xml::escape_xml;
use crate::common::{Error, Result};
use crate::xlsx::book::Book;
use crate::xlsx::package::ContainerWriter;
use crate::xlsx::writer::sheet::sheet_to_xml;
use crate::xlsx::writer::strings::MutableSharedStrings;
use crate::xlsx::writer::styles::styles_xml;
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

/// Write a book declaration to an XLSX file.
pub fn save<P: AsRef<Path>>(book: &Book, path: P) -> Result<()> {
    let file = File::create(path)?;
    write_to(book, BufWriter::new(file))
}

/// Write a book declaration to any seekable sink.
pub fn write_to<W: Write + Seek>(book: &Book, sink: W) -> Result<()> {
    if book.sheets.is_empty() {
        return Err(Error::Schema("a workbook needs at least one sheet".to_string()));
    }

    let mut shared_strings = MutableSharedStrings::new();
    let sheet_xmls: Vec<String> = book
        .sheets
        .iter()
        .map(|sheet| sheet_to_xml(sheet, &mut shared_strings))
        .collect();

    let mut container = ContainerWriter::new(sink);
    container.write_part("[Content_Types].xml", content_types_xml(book).as_bytes())?;
    container.write_part("_rels/.rels", ROOT_RELS.as_bytes())?;
    container.write_part("docProps/core.xml", CORE_PROPS.as_bytes())?;
    container.write_part("docProps/app.xml", APP_PROPS.as_bytes())?;
    container.write_part("xl/workbook.xml", workbook_xml(book).as_bytes())?;
    container.write_part(
        "xl/_rels/workbook.xml.rels",
        workbook_rels_xml(book).as_bytes(),
    )?;
    container.write_part("xl/styles.xml", styles_xml().as_bytes())?;
    container.write_part("xl/sharedStrings.xml", shared_strings.to_xml().as_bytes())?;

    for (i, xml) in sheet_xmls.iter().enumerate() {
        container.write_part(&format!("xl/worksheets/sheet{}.xml", i + 1), xml.as_bytes())?;
    }

    container.finish()?;
    log::debug!(
        "wrote workbook: {} sheet(s), {} shared string(s)",
        book.sheets.len(),
        shared_strings.count()
    );
    Ok(())
}

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>"#,
    r#"</Relationships>"#
);

const CORE_PROPS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
    r#"xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:creator>tatami</dc:creator></cp:coreProperties>"#
);

const APP_PROPS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
    r#"<Application>tatami</Application></Properties>"#
);

fn content_types_xml(book: &Book) -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);

    for i in 0..book.sheets.len() {
        let _ = write!(
            xml,
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i + 1
        );
    }

    xml.push_str("</Types>");
    xml
}

fn workbook_xml(book: &Book) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(concat!(
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#
    ));
    xml.push_str("<sheets>");

    for (i, sheet) in book.sheets.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        );
    }

    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels_xml(book: &Book) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );

    for i in 0..book.sheets.len() {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i + 1,
            i + 1
        );
    }

    let styles_id = book.sheets.len() + 1;
    let strings_id = book.sheets.len() + 2;
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{styles_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    );
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{strings_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
    );

    xml.push_str("</Relationships>");
    xml
}
