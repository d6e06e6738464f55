//! Byte Order Mark (BOM) utilities shared across modules.
//!
//! Delimited sources may carry a UTF-8 BOM regardless of whether the
//! configured charset asks for one on write. Detection and stripping treat
//! the BOM as a property of the byte source; emission is a writer policy
//! (see [`Charset::emits_bom`](crate::common::charset::Charset::emits_bom)).

use crate::common::Result;
use std::io::{Chain, Cursor, Read, Write};

/// UTF-8 BOM bytes.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Returns true when the buffer starts with the UTF-8 BOM.
#[inline]
pub fn has_bom(bytes: &[u8]) -> bool {
    bytes.len() >= UTF8_BOM.len() && bytes[..UTF8_BOM.len()] == UTF8_BOM
}

/// A reader with any leading BOM already resolved.
///
/// Bytes read ahead of a non-BOM prefix are replayed before the underlying
/// source continues.
pub type BomStripped<R> = Chain<Cursor<Vec<u8>>, R>;

/// Detects and consumes a leading UTF-8 BOM if present.
///
/// Reads up to three bytes from `reader`. When they form the UTF-8 BOM the
/// bytes are consumed and `true` is returned; otherwise they are pushed
/// back so the returned reader yields the source unchanged.
pub fn strip_bom<R: Read>(mut reader: R) -> Result<(bool, BomStripped<R>)> {
    let mut buf = [0u8; 3];
    let mut read = 0usize;

    while read < buf.len() {
        match reader.read(&mut buf[read..])? {
            0 => break,
            n => read += n,
        }
    }

    if read == UTF8_BOM.len() && buf == UTF8_BOM {
        return Ok((true, Cursor::new(Vec::new()).chain(reader)));
    }

    Ok((false, Cursor::new(buf[..read].to_vec()).chain(reader)))
}

/// Writes the three-byte UTF-8 BOM to the writer.
pub fn write_bom<W: Write>(writer: &mut W) -> Result<()> {
    writer.write_all(&UTF8_BOM)?;
    Ok(())
}
