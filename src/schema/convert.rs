//! Built-in cell conversions and the custom-converter capability.
//!
//! A converter is a pure pair of functions: raw cell to target value for
//! reading, target value back to cell text for writing. Built-ins accept
//! both the native cell representation and string forms (numeric strings
//! for numeric targets, "true"/"false" or 0/1 for booleans, ISO-8601 or a
//! workbook serial for dates). Empty cells convert to `Null` for every
//! target.

use crate::schema::TargetType;
use crate::schema::record::FieldValue;
use crate::sheet::types::display_float;
use crate::sheet::{CellValue, serial_to_date, serial_to_datetime};
use chrono::{NaiveDate, NaiveDateTime};

/// Cause type for conversion failures; wrapped into
/// [`Error::CellConversion`](crate::common::Error::CellConversion) by the
/// binder, which adds row/column context.
pub type ConvertResult = std::result::Result<FieldValue, String>;

/// A user-supplied converter between raw cells and one field's values.
pub trait CellConverter: Send + Sync {
    /// Parse a raw cell into the field's value.
    fn parse(&self, raw: &CellValue) -> ConvertResult;

    /// Render a field value back to cell text for writing.
    fn render(&self, value: &FieldValue) -> String;
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a raw cell to the target type with the built-in rules.
pub fn convert(raw: &CellValue, target: TargetType) -> ConvertResult {
    if raw.is_blank() {
        return Ok(FieldValue::Null);
    }

    match target {
        TargetType::Str => convert_str(raw),
        TargetType::Int => convert_int(raw),
        TargetType::Long => convert_long(raw),
        TargetType::Double => convert_double(raw),
        TargetType::Bool => convert_bool(raw),
        TargetType::Date => convert_date(raw),
        TargetType::DateTime => convert_datetime(raw),
    }
}

/// Render a field value to its canonical cell text.
///
/// Integral doubles render without a fractional part; dates use
/// `yyyy-mm-dd` and date-times `yyyy-mm-dd HH:MM:SS`; `Null` renders
/// empty.
pub fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => String::new(),
        FieldValue::Str(s) => s.clone(),
        FieldValue::Int(i) => {
            let mut buf = itoa::Buffer::new();
            buf.format(*i).to_string()
        }
        FieldValue::Long(i) => {
            let mut buf = itoa::Buffer::new();
            buf.format(*i).to_string()
        }
        FieldValue::Double(f) => display_float(*f),
        FieldValue::Bool(b) => (if *b { "true" } else { "false" }).to_string(),
        FieldValue::Date(d) => d.format(DATE_FORMAT).to_string(),
        FieldValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
    }
}

fn convert_str(raw: &CellValue) -> ConvertResult {
    Ok(FieldValue::Str(raw.display()))
}

fn convert_int(raw: &CellValue) -> ConvertResult {
    match raw {
        CellValue::Float(f) => {
            if f.fract() == 0.0 && *f >= i32::MIN as f64 && *f <= i32::MAX as f64 {
                Ok(FieldValue::Int(*f as i32))
            } else {
                Err(format!("{f} is not a 32-bit integer"))
            }
        }
        CellValue::String(s) => s
            .trim()
            .parse::<i32>()
            .map(FieldValue::Int)
            .map_err(|e| e.to_string()),
        other => Err(unexpected(other, "an integer")),
    }
}

fn convert_long(raw: &CellValue) -> ConvertResult {
    match raw {
        CellValue::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 {
                Ok(FieldValue::Long(*f as i64))
            } else {
                Err(format!("{f} is not a 64-bit integer"))
            }
        }
        CellValue::String(s) => s
            .trim()
            .parse::<i64>()
            .map(FieldValue::Long)
            .map_err(|e| e.to_string()),
        other => Err(unexpected(other, "an integer")),
    }
}

fn convert_double(raw: &CellValue) -> ConvertResult {
    match raw {
        CellValue::Float(f) => Ok(FieldValue::Double(*f)),
        CellValue::String(s) => fast_float2::parse(s.trim())
            .map(FieldValue::Double)
            .map_err(|_| format!("{:?} is not a number", s)),
        other => Err(unexpected(other, "a number")),
    }
}

fn convert_bool(raw: &CellValue) -> ConvertResult {
    match raw {
        CellValue::Bool(b) => Ok(FieldValue::Bool(*b)),
        CellValue::Float(f) if *f == 0.0 => Ok(FieldValue::Bool(false)),
        CellValue::Float(f) if *f == 1.0 => Ok(FieldValue::Bool(true)),
        CellValue::Float(f) => Err(format!("{f} is not a boolean")),
        CellValue::String(s) => match s.trim() {
            t if t.eq_ignore_ascii_case("true") || t == "1" => Ok(FieldValue::Bool(true)),
            t if t.eq_ignore_ascii_case("false") || t == "0" => Ok(FieldValue::Bool(false)),
            t => Err(format!("{t:?} is not a boolean")),
        },
        other => Err(unexpected(other, "a boolean")),
    }
}

fn convert_date(raw: &CellValue) -> ConvertResult {
    match raw {
        CellValue::DateTime(serial) => serial_to_date(*serial)
            .map(FieldValue::Date)
            .ok_or_else(|| format!("serial {serial} is out of range")),
        CellValue::Float(serial) => serial_to_date(*serial)
            .map(FieldValue::Date)
            .ok_or_else(|| format!("serial {serial} is out of range")),
        CellValue::String(s) => parse_date(s.trim()).map(FieldValue::Date),
        other => Err(unexpected(other, "a date")),
    }
}

fn convert_datetime(raw: &CellValue) -> ConvertResult {
    match raw {
        CellValue::DateTime(serial) => serial_to_datetime(*serial)
            .map(FieldValue::DateTime)
            .ok_or_else(|| format!("serial {serial} is out of range")),
        CellValue::Float(serial) => serial_to_datetime(*serial)
            .map(FieldValue::DateTime)
            .ok_or_else(|| format!("serial {serial} is out of range")),
        CellValue::String(s) => parse_datetime(s.trim()).map(FieldValue::DateTime),
        other => Err(unexpected(other, "a date-time")),
    }
}

fn parse_date(text: &str) -> std::result::Result<NaiveDate, String> {
    if let Ok(d) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        return Ok(d);
    }
    parse_datetime(text).map(|dt| dt.date())
}

fn parse_datetime(text: &str) -> std::result::Result<NaiveDateTime, String> {
    for format in [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(format!("{text:?} is not an ISO-8601 date or date-time"))
}

fn unexpected(raw: &CellValue, wanted: &str) -> String {
    let kind = match raw {
        CellValue::Empty => "an empty cell",
        CellValue::Bool(_) => "a boolean cell",
        CellValue::Float(_) => "a numeric cell",
        CellValue::String(_) => "a string cell",
        CellValue::DateTime(_) => "a date cell",
        CellValue::Formula(_) => "a formula cell",
    };
    format!("{kind} cannot become {wanted}")
}
