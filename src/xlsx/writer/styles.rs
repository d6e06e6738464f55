//! Styles part for written workbooks.
//!
//! Written cells use three styles: general, date, and date-time. The two
//! date styles carry custom number formats `yyyy-mm-dd` (id 164) and
//! `yyyy-mm-dd hh:mm:ss` (id 165) so date serials display as calendar
//! values.

/// Cell XF index for date cells.
pub const DATE_STYLE: u32 = 1;

/// Cell XF index for date-time cells.
pub const DATETIME_STYLE: u32 = 2;

const DATE_FORMAT_ID: u32 = 164;
const DATETIME_FORMAT_ID: u32 = 165;

/// Serialize the fixed `xl/styles.xml` part.
pub fn styles_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
            r#"<numFmts count="2">"#,
            r#"<numFmt numFmtId="{date_id}" formatCode="yyyy-mm-dd"/>"#,
            r#"<numFmt numFmtId="{datetime_id}" formatCode="yyyy-mm-dd hh:mm:ss"/>"#,
            r#"</numFmts>"#,
            r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
            r#"<fills count="2"><fill><patternFill patternType="none"/></fill>"#,
            r#"<fill><patternFill patternType="gray125"/></fill></fills>"#,
            r#"<borders count="1"><border/></borders>"#,
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
            r#"<cellXfs count="3">"#,
            r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
            r#"<xf numFmtId="{date_id}" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#,
            r#"<xf numFmtId="{datetime_id}" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#,
            r#"</cellXfs>"#,
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
            r#"</styleSheet>"#
        ),
        date_id = DATE_FORMAT_ID,
        datetime_id = DATETIME_FORMAT_ID,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::styles::Styles;

    #[test]
    fn test_written_styles_read_back_as_dates() {
        let styles = Styles::parse(styles_xml().as_bytes()).unwrap();
        assert!(!styles.is_date_style(0));
        assert!(styles.is_date_style(DATE_STYLE));
        assert!(styles.is_date_style(DATETIME_STYLE));
    }
}
