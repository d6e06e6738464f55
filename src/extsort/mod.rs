//! External-memory ordering for delimited files.
//!
//! [`ExternalSorter`] sorts files larger than available memory with
//! bounded peak usage: input lines accumulate into size-capped chunks,
//! each chunk is sorted in memory and spilled to a temp file, and the
//! spilled chunks interleave through a k-way merge. The
//! [`GroupProcessor`](group::GroupProcessor) builds on the same spill
//! machinery to partition records by key and hand out ordered per-group
//! streams.

use crate::common::bom::{strip_bom, write_bom};
use crate::common::charset::{Charset, decoding_reader, detect_charset_in_stream};
use crate::common::{Result, TempWorkspace};
use crate::delimited::dialect::LineTerminator;
use memchr::memchr2;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

// Submodule declarations
pub mod group;
pub mod merge;

// Re-exports for convenience
pub use group::{GroupProcessor, GroupStream};

use merge::k_way_merge;

/// Default chunk size: 100 MB.
const DEFAULT_CHUNK_SIZE: usize = 100 * 1024 * 1024;

/// External sorter configuration.
///
/// The comparator orders raw decoded lines; ties preserve input order
/// (the chunk sort is stable and the merge breaks ties toward the
/// earlier chunk). Empty lines are dropped. On error the output file is
/// left partially written and must be treated as invalid; the temp
/// workspace is removed on every exit path.
#[derive(Debug, Clone)]
pub struct ExternalSorter {
    chunk_size: usize,
    has_header: bool,
    charset: Option<Charset>,
    terminator: LineTerminator,
    temp_dir: Option<PathBuf>,
}

impl Default for ExternalSorter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            has_header: false,
            charset: None,
            terminator: LineTerminator::Lf,
            temp_dir: None,
        }
    }
}

impl ExternalSorter {
    /// Create a sorter with defaults: 100 MB chunks, no header, charset
    /// auto-detection, LF output terminator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the in-memory chunk size in bytes.
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    /// Treat the first line as a header: it is kept out of the sort and
    /// written back verbatim at the top of the output.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set an explicit charset, disabling auto-detection.
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = Some(charset);
        self
    }

    /// Set the output line terminator.
    pub fn with_terminator(mut self, terminator: LineTerminator) -> Self {
        self.terminator = terminator;
        self
    }

    /// Put the spill workspace under this directory instead of the OS
    /// temp root.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Sort `input` into `output` under `cmp`.
    pub fn sort<C>(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        cmp: C,
    ) -> Result<()>
    where
        C: Fn(&str, &str) -> Ordering,
    {
        let workspace = TempWorkspace::create("tatami-sort-", self.temp_dir.as_deref())?;

        let (charset, mut lines) = self.open_lines(input.as_ref())?;
        let header = if self.has_header {
            lines.next().transpose()?
        } else {
            None
        };

        // Phase 1: chunk, sort, spill
        let mut chunk_paths: Vec<PathBuf> = Vec::new();
        let mut chunk: Vec<String> = Vec::new();
        let mut chunk_bytes = 0usize;

        for line in &mut lines {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let line_bytes = line.len() + 1;
            if chunk_bytes + line_bytes > self.chunk_size && !chunk.is_empty() {
                chunk_paths.push(spill_chunk(
                    &workspace,
                    chunk_paths.len(),
                    &mut chunk,
                    &cmp,
                )?);
                chunk_bytes = 0;
            }

            chunk.push(line);
            chunk_bytes += line_bytes;
        }

        if !chunk.is_empty() {
            chunk_paths.push(spill_chunk(&workspace, chunk_paths.len(), &mut chunk, &cmp)?);
        }
        log::debug!("external sort spilled {} chunk(s)", chunk_paths.len());

        // Phase 2: k-way merge into the output
        let file = File::create(output.as_ref())?;
        let mut sink = BufWriter::new(file);

        if charset.emits_bom() {
            write_bom(&mut sink)?;
        }
        if let Some(header) = header {
            self.write_line(&mut sink, charset, &header)?;
        }

        let readers = chunk_paths
            .iter()
            .map(|p| Ok(Lines::new(BufReader::new(File::open(p)?))))
            .collect::<Result<Vec<_>>>()?;

        k_way_merge(readers, &cmp, |line| self.write_line(&mut sink, charset, line))?;
        sink.flush()?;
        Ok(())
    }

    fn open_lines(&self, input: &Path) -> Result<(Charset, Lines<Box<dyn BufRead>>)> {
        let file = File::open(input)?;
        let (had_bom, stream) = strip_bom(file)?;

        let (charset, stream): (Charset, Box<dyn Read>) = match self.charset {
            Some(charset) => (charset, Box::new(stream)),
            None if had_bom => (Charset::Utf8Bom, Box::new(stream)),
            None => {
                let (charset, probed) = detect_charset_in_stream(stream)?;
                (charset, Box::new(probed))
            }
        };

        let decoded: Box<dyn BufRead> = Box::new(BufReader::new(decoding_reader(charset, stream)));
        Ok((charset, Lines::new(decoded)))
    }

    fn write_line<W: Write>(&self, sink: &mut W, charset: Charset, line: &str) -> Result<()> {
        sink.write_all(&charset.encode(line))?;
        sink.write_all(&charset.encode(self.terminator.as_str()))?;
        Ok(())
    }
}

/// Sort a chunk stably and spill it to `chunk_<i>.tmp`.
fn spill_chunk<C>(
    workspace: &TempWorkspace,
    index: usize,
    chunk: &mut Vec<String>,
    cmp: &C,
) -> Result<PathBuf>
where
    C: Fn(&str, &str) -> Ordering,
{
    chunk.sort_by(|a, b| cmp(a.as_str(), b.as_str()));

    let path = workspace.file(&format!("chunk_{index}.tmp"));
    let mut writer = BufWriter::new(File::create(&path)?);
    for line in chunk.iter() {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    chunk.clear();
    Ok(path)
}

/// Physical line iterator accepting CRLF, LF, and CR terminators.
pub(crate) struct Lines<B: BufRead> {
    src: B,
    done: bool,
    skip_lf: bool,
}

impl<B: BufRead> Lines<B> {
    pub(crate) fn new(src: B) -> Self {
        Self {
            src,
            done: false,
            skip_lf: false,
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line: Vec<u8> = Vec::new();
        let mut have_line = false;

        loop {
            let buf = self.src.fill_buf()?;
            if buf.is_empty() {
                return Ok(if have_line || !line.is_empty() {
                    Some(into_utf8(line)?)
                } else {
                    None
                });
            }

            if self.skip_lf {
                self.skip_lf = false;
                if buf[0] == b'\n' {
                    self.src.consume(1);
                    continue;
                }
            }

            match memchr2(b'\r', b'\n', buf) {
                Some(i) => {
                    line.extend_from_slice(&buf[..i]);
                    let terminator = buf[i];
                    let mut used = i + 1;
                    if terminator == b'\r' {
                        if used < buf.len() {
                            if buf[used] == b'\n' {
                                used += 1;
                            }
                        } else {
                            self.skip_lf = true;
                        }
                    }
                    self.src.consume(used);
                    return Ok(Some(into_utf8(line)?));
                }
                None => {
                    line.extend_from_slice(buf);
                    have_line = true;
                    let len = buf.len();
                    self.src.consume(len);
                }
            }
        }
    }
}

impl<B: BufRead> Iterator for Lines<B> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn into_utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|_| crate::common::Error::Encoding("line is not valid UTF-8".to_string()))
}
