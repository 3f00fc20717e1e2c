//! Streaming pipeline: CSV source -> JSON lines sink.
//!
//! ```text
//! Start ──▶ HeadersRead ──▶ Validating ──▶ Streaming ──▶ Done
//!   │            │              │              │
//!   └────────────┴──────────────┴──────────────┴──▶ Aborted
//! ```
//!
//! Only one record and one output object are alive at a time, so memory
//! grows with the number of columns, never with the number of rows. The
//! cancellation token is polled before every record read. Source and sink
//! are borrowed: the pipeline reads and writes them but never closes them.
//!
//! # Example
//!
//! ```rust,ignore
//! use csvtojson::{transform, CancelToken, Settings};
//!
//! let mut out = Vec::new();
//! let stats = transform(&CancelToken::none(), "id,name\n1,a\n".as_bytes(), &mut out, &Settings::default())?;
//! assert_eq!(stats.records, 1);
//! assert_eq!(out, b"{\"id\":\"1\",\"name\":\"a\"}\n");
//! ```

use csv::ByteRecord;
use std::borrow::Cow;
use std::fmt;
use std::io::{Read, Write};

use super::emitter::JsonLineEmitter;
use super::record::transform_record;
use crate::config::Settings;
use crate::context::CancelToken;
use crate::error::{TransformError, TransformResult};
use crate::logs::{log_error, log_info, log_success, log_warning};
use crate::parser::{decode_fields, RecordReader};
use crate::validation::validate_headers;

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    HeadersRead,
    Validating,
    Streaming,
    Done,
    Aborted,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Aborted)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Start => "start",
            PipelineState::HeadersRead => "headers read",
            PipelineState::Validating => "validating",
            PipelineState::Streaming => "streaming",
            PipelineState::Done => "done",
            PipelineState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformStats {
    /// Columns in the header row
    pub headers: usize,
    /// JSON lines written
    pub records: u64,
}

/// Stream every record of `source` to `sink` as one JSON object per line.
///
/// Reads the header row, validates `settings` against it, then transforms
/// and writes records in input order until the source is exhausted. Any
/// read, validation, write or cancellation error stops the run at once;
/// lines already written stay in the sink.
pub fn transform<R, W>(
    cancel: &CancelToken,
    source: R,
    sink: W,
    settings: &Settings,
) -> TransformResult<TransformStats>
where
    R: Read,
    W: Write,
{
    let mut run = Run {
        state: PipelineState::Start,
        records: 0,
    };

    match run.execute(cancel, source, sink, settings) {
        Ok(stats) => {
            run.enter(PipelineState::Done);
            log_success(format!("Wrote {} record(s)", stats.records));
            Ok(stats)
        }
        Err(err) => {
            let failed_in = run.state;
            run.enter(PipelineState::Aborted);
            match err {
                TransformError::Cancelled(ref cancel_err) => log_warning(format!(
                    "Stopped after {} record(s): {}",
                    run.records, cancel_err
                )),
                ref other => log_error(format!("Aborted while {}: {}", failed_in, other)),
            }
            Err(err)
        }
    }
}

struct Run {
    state: PipelineState,
    records: u64,
}

impl Run {
    fn enter(&mut self, state: PipelineState) {
        debug_assert!(!self.state.is_terminal(), "no transition out of {}", self.state);
        self.state = state;
    }

    fn execute<R: Read, W: Write>(
        &mut self,
        cancel: &CancelToken,
        source: R,
        sink: W,
        settings: &Settings,
    ) -> TransformResult<TransformStats> {
        let delimiter = settings.delimiter()?;
        let mut reader = RecordReader::new(source, delimiter);

        let headers = reader.read_headers()?;
        self.enter(PipelineState::HeadersRead);
        log_info(format!("Read {} header(s): {}", headers.len(), headers.join(", ")));

        self.enter(PipelineState::Validating);
        validate_headers(settings, &headers)?;

        self.enter(PipelineState::Streaming);
        let mut emitter = JsonLineEmitter::new(sink);
        let mut record = ByteRecord::new();

        loop {
            cancel.check()?;

            if !reader.read_record(&mut record)? {
                break;
            }

            let fields: Vec<Cow<'_, str>> = decode_fields(&record).collect();
            let object = transform_record(&headers, settings, fields.iter().map(|f| f.as_ref()));
            emitter.emit(&object)?;
            self.records = emitter.written();
        }

        emitter.flush()?;

        Ok(TransformStats {
            headers: headers.len(),
            records: self.records,
        })
    }
}
