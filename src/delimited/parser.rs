//! Delimited record parsing.
//!
//! [`LogicalRows`] turns a UTF-8 byte source into logical records: quoting
//! is resolved, doubled quotes collapse to one, and a quoted field may
//! span physical lines. Logical line numbers count records, not physical
//! lines, and are 1-based.

use crate::common::{Error, Result};
use crate::delimited::dialect::{Dialect, QUOTE};
use crate::sheet::CellValue;
use std::io::BufRead;

/// One parsed logical record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    /// 1-based logical line number
    pub line: u64,
    /// Field values with quoting resolved
    pub fields: Vec<String>,
}

impl ParsedRow {
    /// True for rows consisting of a single empty field.
    pub fn is_empty(&self) -> bool {
        self.fields.len() == 1 && self.fields[0].is_empty()
    }

    /// Convert the fields into raw cells for record binding.
    pub fn into_cells(self) -> Vec<CellValue> {
        self.fields.into_iter().map(CellValue::String).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Iterator of logical records over a UTF-8 byte source.
pub struct LogicalRows<B: BufRead> {
    src: B,
    dialect: Dialect,
    peeked: Option<u8>,
    next_line: u64,
    done: bool,
}

impl<B: BufRead> LogicalRows<B> {
    /// Create a parser over a UTF-8 source.
    pub fn new(src: B, dialect: Dialect) -> Self {
        Self {
            src,
            dialect,
            peeked: None,
            next_line: 1,
            done: false,
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        loop {
            return match self.src.read(&mut buf) {
                Ok(0) => Ok(None),
                Ok(_) => Ok(Some(buf[0])),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => Err(e.into()),
            };
        }
    }

    /// After a CR, consume the LF of a CRLF pair if present.
    fn eat_lf(&mut self) -> Result<()> {
        if let Some(b) = self.next_byte()? {
            if b != b'\n' {
                self.peeked = Some(b);
            }
        }
        Ok(())
    }

    fn finish_field(&self, fields: &mut Vec<String>, field: &mut Vec<u8>) -> Result<()> {
        let bytes = std::mem::take(field);
        let text = String::from_utf8(bytes)
            .map_err(|_| Error::Encoding("field is not valid UTF-8".to_string()))?;
        fields.push(text);
        Ok(())
    }

    fn parse_record(&mut self) -> Result<Option<ParsedRow>> {
        let delimiter = self.dialect.delimiter();
        let line = self.next_line;

        let mut state = State::FieldStart;
        let mut fields: Vec<String> = Vec::new();
        let mut field: Vec<u8> = Vec::new();

        loop {
            let byte = match self.next_byte()? {
                Some(b) => b,
                None => {
                    // End of input
                    if state == State::Quoted {
                        return Err(Error::MalformedRecord { line });
                    }
                    if fields.is_empty() && field.is_empty() && state == State::FieldStart {
                        self.done = true;
                        return Ok(None);
                    }
                    self.finish_field(&mut fields, &mut field)?;
                    self.next_line += 1;
                    return Ok(Some(ParsedRow { line, fields }));
                }
            };

            match state {
                State::FieldStart => match byte {
                    QUOTE => state = State::Quoted,
                    b if b == delimiter => fields.push(String::new()),
                    b'\n' | b'\r' => {
                        if byte == b'\r' {
                            self.eat_lf()?;
                        }
                        fields.push(String::new());
                        self.next_line += 1;
                        return Ok(Some(ParsedRow { line, fields }));
                    }
                    // Leading whitespace of unquoted fields is stripped
                    b' ' => {}
                    b'\t' if delimiter != b'\t' => {}
                    other => {
                        field.push(other);
                        state = State::Unquoted;
                    }
                },
                State::Unquoted => match byte {
                    b if b == delimiter => {
                        self.finish_field(&mut fields, &mut field)?;
                        state = State::FieldStart;
                    }
                    b'\n' | b'\r' => {
                        if byte == b'\r' {
                            self.eat_lf()?;
                        }
                        self.finish_field(&mut fields, &mut field)?;
                        self.next_line += 1;
                        return Ok(Some(ParsedRow { line, fields }));
                    }
                    // A quote inside an unquoted field is data
                    other => field.push(other),
                },
                State::Quoted => match byte {
                    QUOTE => state = State::QuoteInQuoted,
                    // Everything else, including newlines, is data
                    other => field.push(other),
                },
                State::QuoteInQuoted => match byte {
                    QUOTE => {
                        field.push(QUOTE);
                        state = State::Quoted;
                    }
                    b if b == delimiter => {
                        self.finish_field(&mut fields, &mut field)?;
                        state = State::FieldStart;
                    }
                    b'\n' | b'\r' => {
                        if byte == b'\r' {
                            self.eat_lf()?;
                        }
                        self.finish_field(&mut fields, &mut field)?;
                        self.next_line += 1;
                        return Ok(Some(ParsedRow { line, fields }));
                    }
                    _ => return Err(Error::MalformedRecord { line }),
                },
            }
        }
    }
}

impl<B: BufRead> Iterator for LogicalRows<B> {
    type Item = Result<ParsedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.parse_record() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
