//! Parallel multi-file reading.
//!
//! Reads N files with the same record type on a bounded thread pool.
//! Results collect into per-file slots and concatenate in input order
//! regardless of completion order; the first failing file aborts the
//! whole operation. Tasks share no mutable state beyond the schema
//! cache, which is read-only after first build.

use crate::common::Result;
use crate::delimited;
use crate::options::ReadOptions;
use crate::schema::Record;
use crate::xlsx;
use rayon::prelude::*;
use std::path::Path;

/// Read many files and concatenate their records in input order.
///
/// Files ending in `.xlsx` read as workbooks, everything else as
/// delimited text. `parallelism` bounds the number of concurrent file
/// tasks; `1` executes sequentially on the caller thread.
pub fn read_files<R, P>(paths: &[P], options: &ReadOptions, parallelism: usize) -> Result<Vec<R>>
where
    R: Record,
    P: AsRef<Path> + Sync,
{
    let per_file: Vec<Vec<R>> = if parallelism <= 1 {
        paths
            .iter()
            .map(|p| read_one(p.as_ref(), options))
            .collect::<Result<_>>()?
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parallelism)
            .build()
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        log::debug!("reading {} file(s) with parallelism {parallelism}", paths.len());
        pool.install(|| {
            paths
                .par_iter()
                .map(|p| read_one(p.as_ref(), options))
                .collect::<Result<_>>()
        })?
    };

    Ok(per_file.into_iter().flatten().collect())
}

fn read_one<R: Record>(path: &Path, options: &ReadOptions) -> Result<Vec<R>> {
    let is_workbook = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));

    if is_workbook {
        xlsx::read_sheet(path, options.clone())
    } else {
        delimited::read_path(path, options.clone())
    }
}
