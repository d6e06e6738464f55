//! Delimited text (CSV/TSV) record I/O.
//!
//! Reading composes a fixed pipeline: BOM strip, charset detection or the
//! configured charset, streaming transcode to UTF-8, then the logical
//! record parser. Typed reads bind each parsed row to a user record type
//! through its schema; typed writes run the inverse converters.

use crate::common::bom::strip_bom;
use crate::common::charset::{Charset, decoding_reader, detect_charset_in_stream};
use crate::common::Result;
use crate::options::ReadOptions;
use encoding_rs_io::DecodeReaderBytes;
use std::io::{BufReader, Read};

// Submodule declarations
pub mod dialect;
pub mod parser;
pub mod reader;
pub mod validator;
pub mod writer;

// Re-exports for convenience
pub use dialect::{Dialect, LineTerminator};
pub use parser::{LogicalRows, ParsedRow};
pub use reader::{RecordReader, read_path, read_with_validation};
pub use validator::ColumnCountValidator;
pub use writer::{RecordWriter, write_path};

/// Logical rows over the decoded read pipeline.
pub(crate) type DecodedRows = LogicalRows<BufReader<DecodeReaderBytes<Box<dyn Read>, Vec<u8>>>>;

/// Open the decoded logical-row pipeline over a byte source.
pub(crate) fn open_rows(source: Box<dyn Read>, options: &ReadOptions) -> Result<DecodedRows> {
    let (had_bom, stream) = strip_bom(source)?;

    let (charset, stream): (Charset, Box<dyn Read>) = match options.charset {
        Some(charset) => (charset, Box::new(stream)),
        None if had_bom => (Charset::Utf8Bom, Box::new(stream)),
        None => {
            let (charset, probed) = detect_charset_in_stream(stream)?;
            (charset, Box::new(probed))
        }
    };
    log::debug!("delimited read pipeline: charset {charset:?}, bom {had_bom}");

    let decoded = decoding_reader(charset, stream);
    Ok(LogicalRows::new(BufReader::new(decoded), options.dialect))
}
