//! Record schemas: field descriptors, source bindings, and mapping plans.
//!
//! A [`Schema`] is built once per record type through [`SchemaBuilder`] and
//! memoized process-wide (see [`cache`]). It describes, for each field of
//! the user's record type, the target type, the source binding (header
//! name or 0-based column position), an optional custom converter, and the
//! optional line-number marker. Bindings within one schema are homogeneous:
//! mixing name and position bindings is a construction-time error.

use crate::common::{Error, Result};
use crate::sheet::CellValue;
use std::collections::HashMap;
use std::sync::Arc;

// Submodule declarations
pub mod cache;
pub mod convert;
pub mod record;

// Re-exports for convenience
pub use cache::schema_of;
pub use convert::{CellConverter, render_value};
pub use record::{FieldValue, Record};

/// Target type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    /// UTF-8 string
    Str,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 64-bit float
    Double,
    /// Boolean
    Bool,
    /// Calendar date
    Date,
    /// Date and time of day
    DateTime,
}

impl TargetType {
    /// Type name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            TargetType::Str => "string",
            TargetType::Int => "int",
            TargetType::Long => "long",
            TargetType::Double => "double",
            TargetType::Bool => "bool",
            TargetType::Date => "date",
            TargetType::DateTime => "datetime",
        }
    }
}

/// Source binding of a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Bind by header column name
    Name(String),
    /// Bind by 0-based column position
    Position(usize),
}

/// Descriptor for one field of a record type.
#[derive(Clone)]
pub struct FieldDef {
    name: &'static str,
    target: TargetType,
    binding: Option<Binding>,
    converter: Option<Arc<dyn CellConverter>>,
    line_number: bool,
    required: bool,
}

impl FieldDef {
    /// Create a field descriptor with the given Rust-side field name.
    pub fn new(name: &'static str, target: TargetType) -> Self {
        Self {
            name,
            target,
            binding: None,
            converter: None,
            line_number: false,
            required: true,
        }
    }

    /// Bind this field to a header column name.
    pub fn by_name(mut self, column: &str) -> Self {
        self.binding = Some(Binding::Name(column.to_string()));
        self
    }

    /// Bind this field to a 0-based column position.
    pub fn at_position(mut self, position: usize) -> Self {
        self.binding = Some(Binding::Position(position));
        self
    }

    /// Mark this field optional: a missing source column leaves it `Null`
    /// instead of raising.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Mark this field as the line-number field. The mapper fills it with
    /// the 1-based source row ordinal; it must not carry a source binding.
    pub fn line_number(mut self) -> Self {
        self.line_number = true;
        self
    }

    /// Attach a custom converter, overriding the built-in for the target
    /// type.
    pub fn with_converter(mut self, converter: Arc<dyn CellConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Rust-side field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Target type.
    pub fn target(&self) -> TargetType {
        self.target
    }

    /// Source binding, if any.
    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    /// Label used for the column in diagnostics: the bound name, the bound
    /// position, or the field name.
    fn column_label(&self) -> String {
        match &self.binding {
            Some(Binding::Name(n)) => n.clone(),
            Some(Binding::Position(p)) => p.to_string(),
            None => self.name.to_string(),
        }
    }
}

impl std::fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("binding", &self.binding)
            .field("line_number", &self.line_number)
            .field("required", &self.required)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}

/// Integer width of the line-number field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    /// 32-bit
    W32,
    /// 64-bit
    W64,
}

/// The mapping plan computed from a schema's bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingPlan {
    /// Header-name lookup: (column name, field index) pairs
    ByName(Vec<(String, usize)>),
    /// Positional lookup: (column position, field index) pairs
    ByPosition(Vec<(usize, usize)>),
}

impl MappingPlan {
    /// True for name-based plans.
    pub fn is_by_name(&self) -> bool {
        matches!(self, MappingPlan::ByName(_))
    }
}

/// Schema of one record type.
#[derive(Debug, Clone)]
pub struct Schema {
    record_name: &'static str,
    fields: Vec<FieldDef>,
    plan: MappingPlan,
    line_number_field: Option<(usize, IntWidth)>,
}

impl Schema {
    /// Start building a schema for the named record type.
    pub fn builder(record_name: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            record_name,
            fields: Vec::new(),
        }
    }

    /// Record type name used in diagnostics.
    pub fn record_name(&self) -> &'static str {
        self.record_name
    }

    /// Field descriptors in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// The computed mapping plan.
    pub fn plan(&self) -> &MappingPlan {
        &self.plan
    }

    /// Index and width of the line-number field, if declared.
    pub fn line_number_field(&self) -> Option<(usize, IntWidth)> {
        self.line_number_field
    }

    /// Header row declared by this schema, for writers: bound column names
    /// in declaration order. Empty for position-based schemas.
    pub fn header_row(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter_map(|f| match &f.binding {
                Some(Binding::Name(n)) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    /// Resolve the source column for each field against a header index.
    ///
    /// A required name with no matching column raises
    /// [`Error::KeyColumnNotFound`]; optional fields resolve to `None` and
    /// are left `Null` by the binder.
    pub fn resolve_by_header(&self, header: &HashMap<String, usize>) -> Result<ResolvedColumns> {
        let mut columns = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            let col = match &field.binding {
                Some(Binding::Name(name)) => match header.get(name) {
                    Some(&idx) => Some(idx),
                    None if field.required => {
                        return Err(Error::KeyColumnNotFound { key: name.clone() });
                    }
                    None => None,
                },
                Some(Binding::Position(_)) | None => None,
            };
            columns.push(col);
        }

        Ok(ResolvedColumns { columns })
    }

    /// Resolve source columns for a position-based schema.
    pub fn resolve_by_position(&self) -> ResolvedColumns {
        let columns = self
            .fields
            .iter()
            .map(|field| match &field.binding {
                Some(Binding::Position(p)) => Some(*p),
                _ => None,
            })
            .collect();
        ResolvedColumns { columns }
    }

    /// Bind one source row to field values in declaration order.
    ///
    /// `line` is the 1-based source row ordinal; it feeds the line-number
    /// field and conversion diagnostics. Cells beyond the end of `row`
    /// read as empty.
    pub fn bind_row(
        &self,
        cols: &ResolvedColumns,
        row: &[CellValue],
        line: u64,
    ) -> Result<Vec<FieldValue>> {
        let mut values = Vec::with_capacity(self.fields.len());

        for (i, field) in self.fields.iter().enumerate() {
            if field.line_number {
                values.push(match self.line_number_field {
                    Some((_, IntWidth::W32)) => FieldValue::Int(line as i32),
                    _ => FieldValue::Long(line as i64),
                });
                continue;
            }

            let raw = cols.columns[i]
                .and_then(|c| row.get(c))
                .unwrap_or(CellValue::EMPTY);

            let converted = match &field.converter {
                Some(custom) => custom.parse(raw),
                None => convert::convert(raw, field.target),
            };

            match converted {
                Ok(value) => values.push(value),
                Err(cause) => {
                    return Err(Error::CellConversion {
                        row: line,
                        column: field.column_label(),
                        raw: raw.display(),
                        target: field.target.name(),
                        cause,
                    });
                }
            }
        }

        Ok(values)
    }

    /// Render one record's field values to cell text in declaration order,
    /// skipping the line-number field.
    ///
    /// Used by the delimited writer.
    pub fn render_row(&self, values: &[FieldValue]) -> Vec<String> {
        self.fields
            .iter()
            .zip(values)
            .filter(|(f, _)| !f.line_number)
            .map(|(f, v)| match &f.converter {
                Some(custom) => custom.render(v),
                None => convert::render_value(v),
            })
            .collect()
    }

    /// Render every field value, the line-number field included.
    ///
    /// This is the group-partition spill format: a lossless textual image
    /// of the record, so a spilled record round-trips with its original
    /// source line number intact.
    pub fn render_values(&self, values: &[FieldValue]) -> Vec<String> {
        self.fields
            .iter()
            .zip(values)
            .map(|(f, v)| match &f.converter {
                Some(custom) => custom.render(v),
                None => convert::render_value(v),
            })
            .collect()
    }

    /// Parse a full textual field image produced by
    /// [`render_values`](Schema::render_values) back into field values.
    pub fn parse_values(&self, fields: &[String], line: u64) -> Result<Vec<FieldValue>> {
        let mut values = Vec::with_capacity(self.fields.len());

        for (i, field) in self.fields.iter().enumerate() {
            let raw = fields
                .get(i)
                .map(|s| CellValue::String(s.clone()))
                .unwrap_or(CellValue::Empty);

            let converted = match &field.converter {
                Some(custom) => custom.parse(&raw),
                None => convert::convert(&raw, field.target),
            };

            match converted {
                Ok(value) => values.push(value),
                Err(cause) => {
                    return Err(Error::CellConversion {
                        row: line,
                        column: field.column_label(),
                        raw: raw.display(),
                        target: field.target.name(),
                        cause,
                    });
                }
            }
        }

        Ok(values)
    }
}

/// Per-field source column indices computed by schema resolution.
#[derive(Debug, Clone)]
pub struct ResolvedColumns {
    /// One entry per schema field; `None` for line-number fields and
    /// optional fields without a source column.
    pub columns: Vec<Option<usize>>,
}

/// Builder for [`Schema`].
///
/// Validates on [`build`](SchemaBuilder::build): bindings must be
/// homogeneous, at most one line-number field may exist, and the
/// line-number field must be an unbound integer field.
#[derive(Debug)]
pub struct SchemaBuilder {
    record_name: &'static str,
    fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    /// Append a field descriptor.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate the descriptors and compute the mapping plan.
    pub fn build(self) -> Result<Schema> {
        let mut by_name = Vec::new();
        let mut by_position = Vec::new();
        let mut line_number_field = None;

        for (i, field) in self.fields.iter().enumerate() {
            if field.line_number {
                if field.binding.is_some() {
                    return Err(Error::Schema(format!(
                        "line-number field {} of {} must not carry a source binding",
                        field.name, self.record_name
                    )));
                }
                let width = match field.target {
                    TargetType::Int => IntWidth::W32,
                    TargetType::Long => IntWidth::W64,
                    other => {
                        return Err(Error::Schema(format!(
                            "line-number field {} of {} must be int or long, not {}",
                            field.name,
                            self.record_name,
                            other.name()
                        )));
                    }
                };
                if line_number_field.replace((i, width)).is_some() {
                    return Err(Error::Schema(format!(
                        "record type {} declares more than one line-number field",
                        self.record_name
                    )));
                }
                continue;
            }

            match &field.binding {
                Some(Binding::Name(name)) => by_name.push((name.clone(), i)),
                Some(Binding::Position(pos)) => by_position.push((*pos, i)),
                None => {
                    return Err(Error::Schema(format!(
                        "field {} of {} has no source binding",
                        field.name, self.record_name
                    )));
                }
            }
        }

        let plan = match (by_name.is_empty(), by_position.is_empty()) {
            (false, true) => MappingPlan::ByName(by_name),
            (true, false) => MappingPlan::ByPosition(by_position),
            (false, false) => return Err(Error::MixedBinding(self.record_name)),
            (true, true) => {
                return Err(Error::Schema(format!(
                    "record type {} declares no bound fields",
                    self.record_name
                )));
            }
        };

        Ok(Schema {
            record_name: self.record_name,
            fields: self.fields,
            plan,
            line_number_field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_schema() -> Schema {
        Schema::builder("Person")
            .field(FieldDef::new("name", TargetType::Str).by_name("name"))
            .field(FieldDef::new("age", TargetType::Int).by_name("age"))
            .field(FieldDef::new("line", TargetType::Long).line_number())
            .build()
            .unwrap()
    }

    #[test]
    fn test_by_name_plan() {
        let schema = name_schema();
        assert!(schema.plan().is_by_name());
        assert_eq!(schema.line_number_field(), Some((2, IntWidth::W64)));
        assert_eq!(schema.header_row(), vec!["name", "age"]);
    }

    #[test]
    fn test_mixed_binding_rejected() {
        let err = Schema::builder("Broken")
            .field(FieldDef::new("a", TargetType::Str).by_name("a"))
            .field(FieldDef::new("b", TargetType::Str).at_position(1))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MixedBinding("Broken")));
    }

    #[test]
    fn test_duplicate_line_number_rejected() {
        let err = Schema::builder("Broken")
            .field(FieldDef::new("a", TargetType::Str).by_name("a"))
            .field(FieldDef::new("l1", TargetType::Int).line_number())
            .field(FieldDef::new("l2", TargetType::Long).line_number())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_line_number_must_be_integer() {
        let err = Schema::builder("Broken")
            .field(FieldDef::new("a", TargetType::Str).by_name("a"))
            .field(FieldDef::new("line", TargetType::Str).line_number())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_resolve_missing_required_column() {
        let schema = name_schema();
        let mut header = HashMap::new();
        header.insert("name".to_string(), 0);

        let err = schema.resolve_by_header(&header).unwrap_err();
        assert!(matches!(err, Error::KeyColumnNotFound { key } if key == "age"));
    }

    #[test]
    fn test_resolve_optional_column() {
        let schema = Schema::builder("Person")
            .field(FieldDef::new("name", TargetType::Str).by_name("name"))
            .field(FieldDef::new("nick", TargetType::Str).by_name("nick").optional())
            .build()
            .unwrap();

        let mut header = HashMap::new();
        header.insert("name".to_string(), 0);

        let cols = schema.resolve_by_header(&header).unwrap();
        assert_eq!(cols.columns, vec![Some(0), None]);

        let row = vec![CellValue::from("Alice")];
        let values = schema.bind_row(&cols, &row, 2).unwrap();
        assert_eq!(values[1], FieldValue::Null);
    }

    #[test]
    fn test_bind_row_fills_line_number() {
        let schema = name_schema();
        let mut header = HashMap::new();
        header.insert("name".to_string(), 0);
        header.insert("age".to_string(), 1);

        let cols = schema.resolve_by_header(&header).unwrap();
        let row = vec![CellValue::from("Alice"), CellValue::from("30")];
        let values = schema.bind_row(&cols, &row, 2).unwrap();

        assert_eq!(values[0], FieldValue::Str("Alice".to_string()));
        assert_eq!(values[1], FieldValue::Int(30));
        assert_eq!(values[2], FieldValue::Long(2));
    }

    #[test]
    fn test_bind_row_conversion_error_context() {
        let schema = name_schema();
        let mut header = HashMap::new();
        header.insert("name".to_string(), 0);
        header.insert("age".to_string(), 1);

        let cols = schema.resolve_by_header(&header).unwrap();
        let row = vec![CellValue::from("Alice"), CellValue::from("old")];
        let err = schema.bind_row(&cols, &row, 3).unwrap_err();

        match err {
            Error::CellConversion { row, column, raw, target, .. } => {
                assert_eq!(row, 3);
                assert_eq!(column, "age");
                assert_eq!(raw, "old");
                assert_eq!(target, "int");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
