//! Newline-delimited JSON emitter.

use serde::Serialize;
use std::io::Write;

use crate::error::EmitResult;

/// Writes one compact JSON object per line to a sink.
///
/// Each object is serialized into a reused line buffer and handed to the sink
/// with a single `write_all`, so a record is either fully written or the
/// error surfaces before the next one starts. The sink is borrowed, never
/// closed.
pub struct JsonLineEmitter<W: Write> {
    sink: W,
    line: Vec<u8>,
    written: u64,
}

impl<W: Write> JsonLineEmitter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            line: Vec::with_capacity(256),
            written: 0,
        }
    }

    /// Serialize `object` and write it followed by `\n`.
    pub fn emit<T: Serialize + ?Sized>(&mut self, object: &T) -> EmitResult<()> {
        self.line.clear();
        serde_json::to_writer(&mut self.line, object)?;
        self.line.push(b'\n');
        self.sink.write_all(&self.line)?;
        self.written += 1;
        Ok(())
    }

    /// Number of lines written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> EmitResult<()> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Write a single object as one JSON line.
pub fn emit<W: Write, T: Serialize + ?Sized>(sink: W, object: &T) -> EmitResult<()> {
    JsonLineEmitter::new(sink).emit(object)
}
