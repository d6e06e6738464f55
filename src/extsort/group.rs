//! Group partitioning with per-group external sort.
//!
//! Records stream from the input once; each is routed by its group key to
//! a per-key spill file. After partitioning, every group is loaded alone,
//! sorted, written back, and handed to the caller as a lazy stream, so
//! peak memory follows the largest single group rather than the whole
//! input. Groups are handed out in first-appearance order of their keys.

use crate::common::{Result, TempWorkspace};
use crate::delimited::dialect::Dialect;
use crate::delimited::parser::LogicalRows;
use crate::delimited::writer::format_record;
use crate::delimited::RecordReader;
use crate::options::ReadOptions;
use crate::schema::{Record, Schema, schema_of};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Group partitioner configuration.
#[derive(Debug, Clone, Default)]
pub struct GroupProcessor {
    temp_dir: Option<PathBuf>,
}

impl GroupProcessor {
    /// Create a processor spilling under the OS temp root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put the spill workspace under this directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Partition the input by key and hand each group, ordered by the
    /// record type's natural order, to `handler`.
    pub fn process_groups<R, K, H>(
        &self,
        input: impl AsRef<Path>,
        options: ReadOptions,
        key_fn: K,
        handler: H,
    ) -> Result<()>
    where
        R: Record + Ord,
        K: Fn(&R) -> String,
        H: FnMut(&str, &mut GroupStream<R>) -> Result<()>,
    {
        self.process_groups_by(input, options, key_fn, |a: &R, b: &R| a.cmp(b), handler)
    }

    /// Partition the input by key and hand each group, ordered by `cmp`,
    /// to `handler`.
    ///
    /// The handler may consume its stream partially; the stream closes
    /// when the handler returns. The spill workspace is removed on every
    /// exit path, success or error.
    pub fn process_groups_by<R, K, C, H>(
        &self,
        input: impl AsRef<Path>,
        options: ReadOptions,
        key_fn: K,
        cmp: C,
        mut handler: H,
    ) -> Result<()>
    where
        R: Record,
        K: Fn(&R) -> String,
        C: Fn(&R, &R) -> Ordering,
        H: FnMut(&str, &mut GroupStream<R>) -> Result<()>,
    {
        let workspace = TempWorkspace::create("tatami-group-", self.temp_dir.as_deref())?;
        let schema = schema_of::<R>()?;

        // Phase 1: route records to per-key spill files. All writers stay
        // open until partitioning completes.
        let mut spills: IndexMap<String, Spill> = IndexMap::new();
        let mut used_names: HashSet<String> = HashSet::new();
        let mut total = 0u64;

        let reader = RecordReader::<R>::open(input, options)?;
        for record in reader {
            let record = record?;
            let key = key_fn(&record);

            let spill = match spills.entry(key) {
                indexmap::map::Entry::Occupied(entry) => entry.into_mut(),
                indexmap::map::Entry::Vacant(entry) => {
                    let file_name = spill_file_name(entry.key(), &mut used_names);
                    let path = workspace.file(&file_name);
                    let writer = BufWriter::new(File::create(&path)?);
                    entry.insert(Spill { path, writer })
                }
            };

            let fields = schema.render_values(&record.to_values());
            spill.writer.write_all(format_record(&fields, &Dialect::csv()).as_bytes())?;
            spill.writer.write_all(b"\n")?;
            total += 1;
        }
        log::debug!("partitioned {total} record(s) into {} group(s)", spills.len());

        // Phase 2: per group, sort in isolation and hand out a lazy
        // stream; insertion order of the map is first-appearance order.
        for (key, mut spill) in spills {
            spill.writer.flush()?;
            drop(spill.writer);

            sort_spill_file::<R, _>(&schema, &spill.path, &cmp)?;

            let mut stream = GroupStream::open(&spill.path, Arc::clone(&schema))?;
            handler(&key, &mut stream)?;
        }

        Ok(())
    }
}

struct Spill {
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Sanitize a group key into an unused spill file name.
///
/// Characters outside `[A-Za-z0-9._-]` become underscores; keys that
/// collide after sanitization get a numeric disambiguator.
fn spill_file_name(key: &str, used: &mut HashSet<String>) -> String {
    let base: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let base = if base.is_empty() {
        "_".to_string()
    } else {
        base
    };

    let mut name = format!("{base}.spill");
    let mut n = 1u32;
    while used.contains(&name) {
        name = format!("{base}.{n}.spill");
        n += 1;
    }
    used.insert(name.clone());
    name
}

/// Read a spill file back, sort its records, and overwrite it sorted.
fn sort_spill_file<R, C>(schema: &Schema, path: &Path, cmp: &C) -> Result<()>
where
    R: Record,
    C: Fn(&R, &R) -> Ordering,
{
    let mut records: Vec<R> = Vec::new();
    for row in LogicalRows::new(BufReader::new(File::open(path)?), Dialect::csv()) {
        let row = row?;
        let values = schema.parse_values(&row.fields, row.line)?;
        records.push(R::from_values(values)?);
    }

    records.sort_by(|a, b| cmp(a, b));

    let mut writer = BufWriter::new(File::create(path)?);
    for record in &records {
        let fields = schema.render_values(&record.to_values());
        writer.write_all(format_record(&fields, &Dialect::csv()).as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Lazy record stream over one sorted group.
pub struct GroupStream<R: Record> {
    rows: LogicalRows<BufReader<File>>,
    schema: Arc<Schema>,
    done: bool,
    _marker: PhantomData<R>,
}

impl<R: Record> GroupStream<R> {
    fn open(path: &Path, schema: Arc<Schema>) -> Result<Self> {
        Ok(Self {
            rows: LogicalRows::new(BufReader::new(File::open(path)?), Dialect::csv()),
            schema,
            done: false,
            _marker: PhantomData,
        })
    }
}

impl<R: Record> Iterator for GroupStream<R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        let result = self
            .schema
            .parse_values(&row.fields, row.line)
            .and_then(R::from_values);
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldValue, TargetType};

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
    struct Employee {
        dept: String,
        name: String,
        age: i32,
    }

    impl Record for Employee {
        fn schema() -> Result<Schema> {
            Schema::builder("Employee")
                .field(FieldDef::new("dept", TargetType::Str).at_position(0))
                .field(FieldDef::new("name", TargetType::Str).at_position(1))
                .field(FieldDef::new("age", TargetType::Int).at_position(2))
                .build()
        }

        fn from_values(values: Vec<FieldValue>) -> Result<Self> {
            let mut it = values.into_iter();
            Ok(Employee {
                dept: it
                    .next()
                    .and_then(|v| v.as_str().map(String::from))
                    .unwrap_or_default(),
                name: it
                    .next()
                    .and_then(|v| v.as_str().map(String::from))
                    .unwrap_or_default(),
                age: it.next().and_then(|v| v.as_int()).unwrap_or_default(),
            })
        }

        fn to_values(&self) -> Vec<FieldValue> {
            vec![
                FieldValue::Str(self.dept.clone()),
                FieldValue::Str(self.name.clone()),
                FieldValue::Int(self.age),
            ]
        }
    }

    fn write_input(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("input.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_groups_in_first_appearance_order_sorted_within() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "eng,A,30\ndes,B,25\neng,C,22\n");

        let mut seen: Vec<(String, Vec<Employee>)> = Vec::new();
        GroupProcessor::new()
            .process_groups_by(
                &input,
                ReadOptions::new(),
                |r: &Employee| r.dept.clone(),
                |a, b| a.age.cmp(&b.age),
                |key, stream| {
                    let records = stream.collect::<Result<Vec<_>>>()?;
                    seen.push((key.to_string(), records));
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "eng");
        let eng_names: Vec<&str> = seen[0].1.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(eng_names, vec!["C", "A"]); // ages 22, 30

        assert_eq!(seen[1].0, "des");
        assert_eq!(seen[1].1[0].name, "B");
    }

    #[test]
    fn test_record_totals_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "a,w,1\nb,x,2\na,y,3\nc,z,4\nb,v,5\n",
        );

        let mut total = 0usize;
        GroupProcessor::new()
            .process_groups(
                &input,
                ReadOptions::new(),
                |r: &Employee| r.dept.clone(),
                |_key, stream| {
                    total += stream.collect::<Result<Vec<_>>>()?.len();
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(total, 5);
    }

    #[test]
    fn test_partial_consumption_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "a,w,3\na,x,1\na,y,2\n");

        let mut first: Option<Employee> = None;
        GroupProcessor::new()
            .process_groups_by(
                &input,
                ReadOptions::new(),
                |r: &Employee| r.dept.clone(),
                |a, b| a.age.cmp(&b.age),
                |_key, stream| {
                    first = stream.next().transpose()?;
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(first.unwrap().name, "x"); // age 1 sorts first
    }

    #[test]
    fn test_keys_needing_sanitization() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "a/b,w,1\na?b,x,2\nplain,y,3\n");

        let mut keys = Vec::new();
        GroupProcessor::new()
            .process_groups(
                &input,
                ReadOptions::new(),
                |r: &Employee| r.dept.clone(),
                |key, stream| {
                    let n = stream.collect::<Result<Vec<_>>>()?.len();
                    keys.push((key.to_string(), n));
                    Ok(())
                },
            )
            .unwrap();

        // Both sanitize to a_b but stay distinct groups
        assert_eq!(
            keys,
            vec![
                ("a/b".to_string(), 1),
                ("a?b".to_string(), 1),
                ("plain".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_fields_with_delimiters_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "g,\"name, with comma\",1\n");

        let mut names = Vec::new();
        GroupProcessor::new()
            .process_groups(
                &input,
                ReadOptions::new(),
                |r: &Employee| r.dept.clone(),
                |_key, stream| {
                    for record in stream {
                        names.push(record?.name);
                    }
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(names, vec!["name, with comma"]);
    }
}
