//! Character set handling for delimited text sources.
//!
//! Detection reads a bounded probe from the head of the byte source and
//! applies ordered rules: a UTF-8 BOM wins outright, bytes that decode as
//! UTF-8 stay UTF-8, and everything else is scored against the Shift_JIS
//! and EUC-JP byte patterns. Decoding and encoding go through `encoding_rs`.

use crate::common::Result;
use crate::common::bom::{BomStripped, has_bom};
use encoding_rs::Encoding;
use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};
use std::io::{Cursor, Read};

/// Number of bytes inspected by charset detection.
const PROBE_LEN: usize = 4096;

/// Supported character sets for delimited sources and sinks.
///
/// `Utf8Bom` decodes identically to `Utf8`; the distinction is a writer
/// policy telling the emitter to prepend the three-byte BOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// UTF-8 without BOM (default)
    #[default]
    Utf8,
    /// UTF-8, BOM emitted on write
    Utf8Bom,
    /// Shift_JIS
    ShiftJis,
    /// EUC-JP
    EucJp,
    /// Windows-31J (codepage 932, a superset of Shift_JIS)
    Windows31J,
}

impl Charset {
    /// The `encoding_rs` encoding used for decode and encode.
    ///
    /// `encoding_rs` implements the WHATWG Shift_JIS definition, which
    /// covers the Windows-31J extensions, so both map to the same encoding.
    #[inline]
    pub fn encoding(&self) -> &'static Encoding {
        match self {
            Charset::Utf8 | Charset::Utf8Bom => encoding_rs::UTF_8,
            Charset::ShiftJis | Charset::Windows31J => encoding_rs::SHIFT_JIS,
            Charset::EucJp => encoding_rs::EUC_JP,
        }
    }

    /// Whether writers emit a UTF-8 BOM before the first record.
    #[inline]
    pub fn emits_bom(&self) -> bool {
        matches!(self, Charset::Utf8Bom)
    }

    /// Encode a string into this charset.
    ///
    /// Unmappable characters are replaced with numeric character
    /// references, mirroring `encoding_rs` encoder defaults.
    pub fn encode<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, [u8]> {
        let (bytes, _, _) = self.encoding().encode(text);
        bytes
    }

    /// Resolve a configuration label to a charset.
    ///
    /// Accepts the canonical names plus the usual aliases
    /// (case-insensitive): `UTF-8`, `UTF-8-BOM`, `Shift_JIS`/`SJIS`,
    /// `EUC-JP`, `Windows-31J`/`MS932`/`CP932`.
    pub fn from_label(label: &str) -> Option<Charset> {
        let normalized: String = label
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "utf8" => Some(Charset::Utf8),
            "utf8bom" | "utf8withbom" => Some(Charset::Utf8Bom),
            "shiftjis" | "sjis" => Some(Charset::ShiftJis),
            "eucjp" => Some(Charset::EucJp),
            "windows31j" | "ms932" | "cp932" => Some(Charset::Windows31J),
            _ => None,
        }
    }
}

/// Detect the charset of a byte probe.
///
/// Rules are ordered: (1) UTF-8 BOM prefix; (2) probe decodes as UTF-8
/// (a sequence truncated at the probe edge still counts); (3) Japanese
/// double-byte heuristic; (4) default UTF-8.
pub fn detect_charset(probe: &[u8]) -> Charset {
    if has_bom(probe) {
        return Charset::Utf8Bom;
    }

    if is_probably_utf8(probe) {
        return Charset::Utf8;
    }

    let sjis = score_shift_jis(probe);
    let euc = score_euc_jp(probe);
    log::debug!("charset probe scores: shift_jis={sjis}, euc_jp={euc}");

    if euc > sjis {
        Charset::EucJp
    } else if sjis > 0 {
        Charset::ShiftJis
    } else {
        Charset::Utf8
    }
}

/// Detect the charset at the head of a stream without losing bytes.
///
/// Reads up to 4 KiB, detects, and returns the charset together with a
/// reader that replays the probe before continuing with the source.
pub fn detect_charset_in_stream<R: Read>(mut reader: R) -> Result<(Charset, BomStripped<R>)> {
    let mut probe = vec![0u8; PROBE_LEN];
    let mut read = 0usize;

    while read < probe.len() {
        match reader.read(&mut probe[read..])? {
            0 => break,
            n => read += n,
        }
    }
    probe.truncate(read);

    let charset = detect_charset(&probe);
    Ok((charset, Cursor::new(probe).chain(reader)))
}

/// Wrap a byte source in a reader that yields UTF-8.
///
/// BOM sniffing is disabled; leading BOMs are handled by the caller so the
/// probe logic stays in one place.
pub fn decoding_reader<R: Read>(charset: Charset, reader: R) -> DecodeReaderBytes<R, Vec<u8>> {
    DecodeReaderBytesBuilder::new()
        .encoding(Some(charset.encoding()))
        .bom_sniffing(false)
        .build(reader)
}

/// True when the bytes are valid UTF-8, tolerating one multi-byte sequence
/// cut off at the end of the probe.
fn is_probably_utf8(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        // error_len() == None means the input ended mid-sequence
        Err(e) => e.error_len().is_none(),
    }
}

/// Count byte pairs that look like Shift_JIS double-byte characters or
/// half-width katakana.
fn score_shift_jis(bytes: &[u8]) -> usize {
    let mut score = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            0x81..=0x9F | 0xE0..=0xFC if i + 1 < bytes.len() => {
                let t = bytes[i + 1];
                if matches!(t, 0x40..=0x7E | 0x80..=0xFC) {
                    score += 2;
                    i += 2;
                    continue;
                }
                i += 1;
            }
            // Half-width katakana
            0xA1..=0xDF => {
                score += 1;
                i += 1;
            }
            _ => i += 1,
        }
    }

    score
}

/// Count byte pairs that look like EUC-JP double-byte characters.
fn score_euc_jp(bytes: &[u8]) -> usize {
    let mut score = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            0xA1..=0xFE if i + 1 < bytes.len() && matches!(bytes[i + 1], 0xA1..=0xFE) => {
                score += 2;
                i += 2;
            }
            // Single-shift half-width katakana
            0x8E if i + 1 < bytes.len() && matches!(bytes[i + 1], 0xA1..=0xDF) => {
                score += 2;
                i += 2;
            }
            _ => i += 1,
        }
    }

    score
}
