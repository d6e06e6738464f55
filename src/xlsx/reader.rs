//! Typed record reading from worksheets.

use crate::common::{Error, Result};
use crate::options::ReadOptions;
use crate::schema::{MappingPlan, Record, ResolvedColumns, Schema, schema_of};
use crate::xlsx::header::{header_map_of, locate_header};
use crate::xlsx::workbook::Workbook;
use crate::xlsx::worksheet::{Row, SheetRows};
use std::io::{Read, Seek};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

/// Streaming typed reader over one worksheet.
///
/// For name-based schemas the header row is located first: by the
/// configured header key within the scan window, or as the first
/// non-empty row when no key is set. The line-number field receives the
/// 1-based sheet row number, so with the header on row 3 the first data
/// record reports line 4.
pub struct SheetRecordReader<R: Record> {
    rows: SheetRows,
    schema: Arc<Schema>,
    cols: ResolvedColumns,
    options: ReadOptions,
    skip_remaining: usize,
    done: bool,
    _marker: PhantomData<R>,
}

impl<R: Record> std::fmt::Debug for SheetRecordReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetRecordReader").finish_non_exhaustive()
    }
}

impl<R: Record> SheetRecordReader<R> {
    /// Open the selected sheet of a workbook file for typed reading.
    pub fn open(path: impl AsRef<Path>, options: ReadOptions) -> Result<Self> {
        let mut workbook = Workbook::open(path)?;
        Self::from_workbook(&mut workbook, options)
    }

    /// Create a reader over the selected sheet of an open workbook.
    pub fn from_workbook<S: Read + Seek>(
        workbook: &mut Workbook<S>,
        options: ReadOptions,
    ) -> Result<Self> {
        let schema = schema_of::<R>()?;
        let mut rows = workbook.rows(&options.sheet)?;

        let cols = match schema.plan() {
            MappingPlan::ByName(_) => {
                let header = match &options.header_key {
                    Some(key) => locate_header(&mut rows, key, options.header_search_rows)?,
                    None => first_row_header(&mut rows)?,
                };
                schema.resolve_by_header(&header.columns)?
            }
            MappingPlan::ByPosition(_) => schema.resolve_by_position(),
        };

        Ok(Self {
            rows,
            schema,
            cols,
            skip_remaining: options.skip_lines,
            options,
            done: false,
            _marker: PhantomData,
        })
    }

    fn bind(&self, row: Row) -> Result<R> {
        let values = self
            .schema
            .bind_row(&self.cols, &row.cells, row.number as u64)?;
        R::from_values(values)
    }
}

impl<R: Record> Iterator for SheetRecordReader<R> {
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

/// Take the first non-empty row as the header.
fn first_row_header(
    rows: &mut SheetRows,
) -> Result<crate::xlsx::header::HeaderMap> {
    for row in rows.by_ref() {
        let row = row?;
        if row.is_empty() {
            continue;
        }
        return Ok(crate::xlsx::header::HeaderMap {
            row: row.number,
            columns: header_map_of(&row),
        });
    }

    Err(Error::HeaderNotFound {
        key: String::new(),
        window: 0,
    })
}

/// Read every record of the selected sheet, surfacing the first error.
pub fn read_sheet<R: Record>(path: impl AsRef<Path>, options: ReadOptions) -> Result<Vec<R>> {
    SheetRecordReader::open(path, options)?.collect()
}
