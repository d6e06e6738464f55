//! The record contract: typed field values and the `Record` trait.

use crate::common::Result;
use crate::schema::Schema;
use chrono::{NaiveDate, NaiveDateTime};

/// A typed value of one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent value
    Null,
    /// UTF-8 string
    Str(String),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 64-bit float
    Double(f64),
    /// Boolean
    Bool(bool),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time of day
    DateTime(NaiveDateTime),
}

impl FieldValue {
    /// True for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Extract a string, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract an `i32`, if this is an `Int`.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract an `i64`, if this is a `Long`.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            FieldValue::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract an `f64`, if this is a `Double`.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            FieldValue::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Extract a `bool`, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract a date, if this is a `Date`.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Extract a date-time, if this is a `DateTime`.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

/// Contract between user record types and the mappers.
///
/// Implementations declare their schema once; construction-time problems
/// (mixed bindings, duplicate line-number fields) surface from
/// [`schema`](Record::schema) on first use and are cached alongside valid
/// schemas. `from_values` and `to_values` exchange field values in schema
/// declaration order.
///
/// # Example
///
/// ```
/// use tatami::schema::{FieldDef, FieldValue, Record, Schema, TargetType};
///
/// struct Person {
///     name: String,
///     age: i32,
/// }
///
/// impl Record for Person {
///     fn schema() -> tatami::Result<Schema> {
///         Schema::builder("Person")
///             .field(FieldDef::new("name", TargetType::Str).by_name("name"))
///             .field(FieldDef::new("age", TargetType::Int).by_name("age"))
///             .build()
///     }
///
///     fn from_values(values: Vec<FieldValue>) -> tatami::Result<Self> {
///         let mut it = values.into_iter();
///         Ok(Person {
///             name: it.next().and_then(|v| v.as_str().map(String::from)).unwrap_or_default(),
///             age: it.next().and_then(|v| v.as_int()).unwrap_or_default(),
///         })
///     }
///
///     fn to_values(&self) -> Vec<FieldValue> {
///         vec![
///             FieldValue::Str(self.name.clone()),
///             FieldValue::Int(self.age),
///         ]
///     }
/// }
/// ```
pub trait Record: Sized + Send + 'static {
    /// Build the schema describing this record type.
    fn schema() -> Result<Schema>;

    /// Construct a record from field values in schema declaration order.
    fn from_values(values: Vec<FieldValue>) -> Result<Self>;

    /// Extract field values in schema declaration order.
    fn to_values(&self) -> Vec<FieldValue>;
}
