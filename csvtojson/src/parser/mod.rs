//! Incremental delimited-text reader.
//!
//! Wraps [`csv::Reader`] so the pipeline pulls one record at a time into a
//! reused buffer. Quoted fields may hold the separator, doubled quotes and
//! line breaks. Every row must have as many fields as the header row; a short
//! or long row is a read error.
//!
//! The `csv` crate tolerates malformed quoting, so a [`QuoteGuard`] sits
//! between the source and the reader and tracks the quote grammar byte by
//! byte. A bare `"` in an unquoted field, stray bytes after a closing quote
//! and a quoted field still open at end of input are all read errors,
//! reported with the record that contains them.
//!
//! Field bytes that are not valid UTF-8 are decoded lossily (U+FFFD) rather
//! than failing the stream.

use csv::{ByteRecord, ReaderBuilder};
use std::borrow::Cow;
use std::io::{self, Read};

use crate::error::{CsvError, CsvResult};

const QUOTE: u8 = b'"';

/// Pull-based record reader over any byte source.
pub struct RecordReader<R: Read> {
    inner: csv::Reader<QuoteGuard<R>>,
}

impl<R: Read> RecordReader<R> {
    /// Create a reader splitting fields on `delimiter`.
    ///
    /// The header row is treated like any other record so that an empty
    /// source can be told apart from a source with headers and no rows.
    pub fn new(source: R, delimiter: u8) -> Self {
        let inner = ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(QUOTE)
            .double_quote(true)
            .has_headers(false)
            .flexible(false)
            .from_reader(QuoteGuard::new(source, delimiter));
        Self { inner }
    }

    /// Read the first row as headers.
    pub fn read_headers(&mut self) -> CsvResult<Vec<String>> {
        let mut record = ByteRecord::new();
        if !self.read_record(&mut record)? {
            return Err(CsvError::EmptyInput);
        }
        Ok(decode_fields(&record).map(Cow::into_owned).collect())
    }

    /// Read the next row into `record`, returning `false` at end of input.
    pub fn read_record(&mut self, record: &mut ByteRecord) -> CsvResult<bool> {
        let more = self.inner.read_byte_record(record)?;

        // the guard runs ahead of the reader's buffer; only report what
        // lies inside the bytes consumed so far
        let consumed = self.inner.position().byte();
        let guard = self.inner.get_ref();
        if let Some(violation) = guard.violation {
            if violation.offset < consumed || !more {
                return Err(violation.into());
            }
        }
        if guard.eof && guard.state == QuoteState::Quoted {
            return Err(CsvError::UnterminatedQuote { line: guard.line });
        }

        Ok(more)
    }
}

/// Decode each field of `record` as UTF-8, replacing invalid sequences.
pub fn decode_fields(record: &ByteRecord) -> impl Iterator<Item = Cow<'_, str>> {
    record.iter().map(String::from_utf8_lossy)
}

// =============================================================================
// Quote grammar tracking
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    /// A `"` seen inside a quoted field: closing quote or first half of `""`.
    QuoteInQuoted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViolationKind {
    BareQuote,
    ExtraneousQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Violation {
    kind: ViolationKind,
    offset: u64,
    line: u64,
}

impl From<Violation> for CsvError {
    fn from(v: Violation) -> Self {
        match v.kind {
            ViolationKind::BareQuote => CsvError::BareQuote { line: v.line },
            ViolationKind::ExtraneousQuote => CsvError::ExtraneousQuote { line: v.line },
        }
    }
}

/// Pass-through reader that checks the quote grammar of the bytes it yields.
///
/// Records the first violation with its byte offset and stops tracking after it.
pub struct QuoteGuard<R> {
    inner: R,
    delimiter: u8,
    state: QuoteState,
    offset: u64,
    line: u64,
    eof: bool,
    violation: Option<Violation>,
}

impl<R: Read> QuoteGuard<R> {
    pub fn new(inner: R, delimiter: u8) -> Self {
        Self {
            inner,
            delimiter,
            state: QuoteState::FieldStart,
            offset: 0,
            line: 1,
            eof: false,
            violation: None,
        }
    }

    fn scan(&mut self, byte: u8) {
        if self.violation.is_none() {
            match self.next_state(byte) {
                Ok(state) => self.state = state,
                Err(kind) => {
                    self.violation = Some(Violation {
                        kind,
                        offset: self.offset,
                        line: self.line,
                    })
                }
            }
        }
        self.offset += 1;
        if byte == b'\n' {
            self.line += 1;
        }
    }

    fn next_state(&self, byte: u8) -> Result<QuoteState, ViolationKind> {
        let ends_field = byte == self.delimiter || byte == b'\n' || byte == b'\r';
        match self.state {
            QuoteState::FieldStart if byte == QUOTE => Ok(QuoteState::Quoted),
            QuoteState::FieldStart | QuoteState::Unquoted if ends_field => Ok(QuoteState::FieldStart),
            QuoteState::FieldStart | QuoteState::Unquoted if byte == QUOTE => Err(ViolationKind::BareQuote),
            QuoteState::FieldStart | QuoteState::Unquoted => Ok(QuoteState::Unquoted),
            QuoteState::Quoted if byte == QUOTE => Ok(QuoteState::QuoteInQuoted),
            QuoteState::Quoted => Ok(QuoteState::Quoted),
            QuoteState::QuoteInQuoted if byte == QUOTE => Ok(QuoteState::Quoted),
            QuoteState::QuoteInQuoted if ends_field => Ok(QuoteState::FieldStart),
            QuoteState::QuoteInQuoted => Err(ViolationKind::ExtraneousQuote),
        }
    }
}

impl<R: Read> Read for QuoteGuard<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.eof = true;
        }
        for &byte in &buf[..n] {
            self.scan(byte);
        }
        Ok(n)
    }
}
