//! Typed record reading from delimited sources.

use crate::common::{Error, ErrorRow, Result};
use crate::delimited::parser::ParsedRow;
use crate::delimited::validator::ColumnCountValidator;
use crate::delimited::{DecodedRows, open_rows};
use crate::options::ReadOptions;
use crate::schema::{MappingPlan, Record, ResolvedColumns, Schema, schema_of};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

/// Streaming typed reader over one delimited source.
///
/// The reader owns its byte source; dropping it releases every derived
/// handle. Rows surface in source order. For name-based schemas the first
/// logical row is the header (line 1, so data starts at line 2); for
/// position-based schemas data starts at line 1.
pub struct RecordReader<R: Record> {
    rows: DecodedRows,
    schema: Arc<Schema>,
    cols: ResolvedColumns,
    options: ReadOptions,
    skip_remaining: usize,
    elide: Option<HashSet<u64>>,
    done: bool,
    _marker: PhantomData<R>,
}

impl<R: Record> RecordReader<R> {
    /// Create a reader over a byte source.
    pub fn new(source: impl Read + 'static, options: ReadOptions) -> Result<Self> {
        Self::with_elided_lines(Box::new(source), options, None)
    }

    /// Open a file for typed reading.
    pub fn open(path: impl AsRef<Path>, options: ReadOptions) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::new(file, options)
    }

    /// Create a reader that silently skips the listed logical lines.
    ///
    /// Used by [`read_with_validation`]: the elided rows keep their
    /// original line numbers, so the line-number field still reflects the
    /// source position of every surfaced record.
    pub(crate) fn with_elided_lines(
        source: Box<dyn Read>,
        options: ReadOptions,
        elide: Option<HashSet<u64>>,
    ) -> Result<Self> {
        let schema = schema_of::<R>()?;
        let mut rows = open_rows(source, &options)?;

        let cols = match schema.plan() {
            MappingPlan::ByName(_) => {
                let header = match rows.next() {
                    Some(row) => row?,
                    None => {
                        return Err(Error::HeaderNotFound {
                            key: schema
                                .header_row()
                                .first()
                                .cloned()
                                .unwrap_or_default(),
                            window: 1,
                        });
                    }
                };
                let index = header_index(&header);
                schema.resolve_by_header(&index)?
            }
            MappingPlan::ByPosition(_) => schema.resolve_by_position(),
        };

        Ok(Self {
            rows,
            schema,
            cols,
            skip_remaining: options.skip_lines,
            options,
            elide,
            done: false,
            _marker: PhantomData,
        })
    }

    fn bind(&self, row: ParsedRow) -> Result<R> {
        let line = row.line;
        let cells = row.into_cells();
        let values = self.schema.bind_row(&self.cols, &cells, line)?;
        R::from_values(values)
    }
}

impl<R: Record> Iterator for RecordReader<R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            if let Some(elide) = &self.elide {
                if elide.contains(&row.line) {
                    continue;
                }
            }

            if self.options.skip_empty_rows && row.is_empty() {
                continue;
            }

            if self.skip_remaining > 0 {
                self.skip_remaining -= 1;
                continue;
            }

            return match self.bind(row) {
                Ok(record) => Some(Ok(record)),
                Err(e) => {
                    self.done = true;
                    Some(Err(e))
                }
            };
        }
    }
}

/// Build the name-to-column index from a header row.
///
/// Cell text is trimmed; blank headers produce no entry. On duplicate
/// names the first column wins.
fn header_index(header: &ParsedRow) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (i, cell) in header.fields.iter().enumerate() {
        let name = cell.trim();
        if !name.is_empty() {
            index.entry(name.to_string()).or_insert(i);
        }
    }
    index
}

/// Read every record of a delimited file, surfacing the first error.
pub fn read_path<R: Record>(path: impl AsRef<Path>, options: ReadOptions) -> Result<Vec<R>> {
    RecordReader::open(path, options)?.collect()
}

/// Read a delimited file, collecting column-count mismatches instead of
/// failing on them.
///
/// Runs the collecting validator in a pre-scan pass, then maps the file
/// with the mismatched rows elided. Returns the good records together
/// with the error-row list; other errors still surface immediately.
pub fn read_with_validation<R: Record>(
    path: impl AsRef<Path>,
    options: ReadOptions,
) -> Result<(Vec<R>, Vec<ErrorRow>)> {
    let path = path.as_ref();

    let validator = ColumnCountValidator::new(options.clone());
    let errors = validator.validate_and_collect(Box::new(std::fs::File::open(path)?))?;

    let elide: HashSet<u64> = errors.iter().map(|e| e.line).collect();
    let reader = RecordReader::<R>::with_elided_lines(
        Box::new(std::fs::File::open(path)?),
        options,
        Some(elide),
    )?;
    let records = reader.collect::<Result<Vec<_>>>()?;

    Ok((records, errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldValue, TargetType};

    #[derive(Debug, PartialEq)]
    struct Person {
        name: String,
        age: i32,
        line: i64,
    }

    impl Record for Person {
        fn schema() -> Result<Schema> {
            Schema::builder("Person")
                .field(FieldDef::new("name", TargetType::Str).by_name("name"))
                .field(FieldDef::new("age", TargetType::Int).by_name("age"))
                .field(FieldDef::new("line", TargetType::Long).line_number())
                .build()
        }

        fn from_values(values: Vec<FieldValue>) -> Result<Self> {
            let mut it = values.into_iter();
            Ok(Person {
                name: it
                    .next()
                    .and_then(|v| v.as_str().map(String::from))
                    .unwrap_or_default(),
                age: it.next().and_then(|v| v.as_int()).unwrap_or_default(),
                line: it.next().and_then(|v| v.as_long()).unwrap_or_default(),
            })
        }

        fn to_values(&self) -> Vec<FieldValue> {
            vec![
                FieldValue::Str(self.name.clone()),
                FieldValue::Int(self.age),
                FieldValue::Long(self.line),
            ]
        }
    }

    #[derive(Debug, PartialEq)]
    struct Positional {
        value: String,
    }

    impl Record for Positional {
        fn schema() -> Result<Schema> {
            Schema::builder("Positional")
                .field(FieldDef::new("value", TargetType::Str).at_position(0))
                .build()
        }

        fn from_values(values: Vec<FieldValue>) -> Result<Self> {
            Ok(Positional {
                value: values[0].as_str().unwrap_or_default().to_string(),
            })
        }

        fn to_values(&self) -> Vec<FieldValue> {
            vec![FieldValue::Str(self.value.clone())]
        }
    }

    #[test]
    fn test_read_by_name() {
        let input = "name,age\nAlice,30\nBob,25\n";
        let records: Vec<Person> = RecordReader::new(input.as_bytes(), ReadOptions::new())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[0].age, 30);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[1].name, "Bob");
        assert_eq!(records[1].line, 3);
    }

    #[test]
    fn test_read_by_position_with_bom() {
        let mut input = vec![0xEF, 0xBB, 0xBF];
        input.extend_from_slice(b"\"x\"\n\"y\"\n");

        let records: Vec<Positional> =
            RecordReader::new(std::io::Cursor::new(input), ReadOptions::new())
                .unwrap()
                .collect::<Result<Vec<_>>>()
                .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value, "x");
        assert_eq!(records[1].value, "y");
    }

    #[test]
    fn test_skip_lines_applies_to_data() {
        let input = "name,age\nAlice,30\nBob,25\nCarol,41\n";
        let options = ReadOptions::new().with_skip_lines(2);
        let records: Vec<Person> = RecordReader::new(input.as_bytes(), options)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Carol");
        assert_eq!(records[0].line, 4);
    }

    #[test]
    fn test_empty_rows_skipped_but_counted() {
        let input = "name,age\nAlice,30\n\nBob,25\n";
        let records: Vec<Person> = RecordReader::new(input.as_bytes(), ReadOptions::new())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].line, 4);
    }

    #[test]
    fn test_shift_jis_autodetected() {
        // "名前,年齢\n田中,25\n" in Shift_JIS
        let bytes: Vec<u8> = vec![
            0x96, 0xBC, 0x91, 0x4F, b',', 0x94, 0x4E, 0x97, 0xEE, b'\n', 0x93, 0x63, 0x92, 0x86,
            b',', b'2', b'5', b'\n',
        ];

        #[derive(Debug)]
        struct Jp {
            name: String,
            age: i32,
        }

        impl Record for Jp {
            fn schema() -> Result<Schema> {
                Schema::builder("Jp")
                    .field(FieldDef::new("name", TargetType::Str).by_name("名前"))
                    .field(FieldDef::new("age", TargetType::Int).by_name("年齢"))
                    .build()
            }

            fn from_values(values: Vec<FieldValue>) -> Result<Self> {
                let mut it = values.into_iter();
                Ok(Jp {
                    name: it
                        .next()
                        .and_then(|v| v.as_str().map(String::from))
                        .unwrap_or_default(),
                    age: it.next().and_then(|v| v.as_int()).unwrap_or_default(),
                })
            }

            fn to_values(&self) -> Vec<FieldValue> {
                vec![FieldValue::Str(self.name.clone()), FieldValue::Int(self.age)]
            }
        }

        let records: Vec<Jp> = RecordReader::new(std::io::Cursor::new(bytes), ReadOptions::new())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "田中");
        assert_eq!(records[0].age, 25);
    }

    #[test]
    fn test_read_with_validation_elides_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "name,age\nAlice,30\nBob,25,extra\nCarol,41\n").unwrap();

        let (records, errors) = read_with_validation::<Person>(&path, ReadOptions::new()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[1].name, "Carol");
        // Line numbers reflect the original source, not the elided view
        assert_eq!(records[1].line, 4);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 3);
        assert_eq!(errors[0].expected, 2);
        assert_eq!(errors[0].actual, 3);
    }
}
