//! Error types for the csvtojson streaming pipeline.
//!
//! One enum per stage, all funnelled into [`TransformError`]:
//!
//! - [`CsvError`] - reading delimited text from the source
//! - [`ConfigError`] - malformed settings at the CLI / settings-file boundary
//! - [`ValidationError`] - header mapping and injection consistency
//! - [`EmitError`] - writing JSON lines to the sink
//! - [`CancelError`] - cancellation or deadline hit mid-stream
//!
//! Conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while reading delimited text from the source.
#[derive(Debug, Error)]
pub enum CsvError {
    /// The source held no header row.
    #[error("CSV input is empty: no header row")]
    EmptyInput,

    /// A `"` inside a field that did not start with one.
    #[error("bare \" in non-quoted field (line {line})")]
    BareQuote { line: u64 },

    /// Bytes between a closing `"` and the next separator or line end.
    #[error("extraneous or missing \" in quoted field (line {line})")]
    ExtraneousQuote { line: u64 },

    /// The input ended inside a quoted field.
    #[error("unterminated quoted field at end of input (line {line})")]
    UnterminatedQuote { line: u64 },

    /// Malformed input reported by the reader (field count mismatch, I/O).
    #[error("{0}")]
    Read(#[from] csv::Error),
}

impl CsvError {
    /// True when the reader rejected a row whose arity differs from the header row.
    pub fn is_unequal_lengths(&self) -> bool {
        matches!(
            self,
            CsvError::Read(e) if matches!(e.kind(), csv::ErrorKind::UnequalLengths { .. })
        )
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while turning user input into [`crate::Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The separator is not a single usable character.
    #[error("invalid separator {0:?}: {1}")]
    InvalidSeparator(String, &'static str),

    /// A mapping/injection flag did not hold a JSON object of strings.
    #[error("invalid {flag} json: {source}")]
    InvalidJson {
        flag: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A timeout value could not be parsed.
    #[error("invalid timeout {0:?}: expected a number with an optional ms, s, m or h suffix")]
    InvalidTimeout(String),

    /// The settings file could not be read.
    #[error("cannot read settings file: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Header checks run once, before the first record is transformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Mapping keys absent from the incoming header row.
    #[error("missing header(s) in incoming csv: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    /// Injection keys that collide with an output key derived from the headers.
    #[error("clashing key(s) in injection: {}", .0.join(", "))]
    ClashingInjectionKeys(Vec<String>),
}

// =============================================================================
// Sink Errors
// =============================================================================

/// Errors while writing a JSON line to the sink.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The sink refused the write (closed pipe, full disk, ...).
    #[error("failed to write record: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialized.
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

// =============================================================================
// Cancellation Errors
// =============================================================================

/// Why the pipeline stopped before reaching the end of its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelError {
    /// The token was cancelled explicitly.
    #[error("operation cancelled")]
    Cancelled,

    /// The token's deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

// =============================================================================
// Transform Errors (top-level)
// =============================================================================

/// Top-level error returned by [`crate::transform`].
///
/// Every variant is terminal for the invocation.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Malformed or empty source.
    #[error(transparent)]
    Csv(#[from] CsvError),

    /// Settings unusable by the reader.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Header validation failed; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Writing to the sink failed; earlier lines remain in the sink.
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// Cancelled mid-stream; earlier lines remain in the sink.
    #[error(transparent)]
    Cancelled(#[from] CancelError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for source reads.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for settings construction.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for sink writes.
pub type EmitResult<T> = Result<T, EmitError>;

/// Result type for the whole pipeline.
pub type TransformResult<T> = Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let csv_err = CsvError::EmptyInput;
        let err: TransformError = csv_err.into();
        assert!(err.to_string().contains("empty"));

        let validation = ValidationError::MissingHeaders(vec!["field2".into()]);
        let err: TransformError = validation.into();
        assert!(matches!(err, TransformError::Validation(_)));
        assert!(err.to_string().contains("field2"));
    }

    #[test]
    fn test_validation_error_lists_every_key() {
        let err = ValidationError::MissingHeaders(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "missing header(s) in incoming csv: a, b");

        let err = ValidationError::ClashingInjectionKeys(vec!["id".into(), "other".into()]);
        assert_eq!(err.to_string(), "clashing key(s) in injection: id, other");
    }

    #[test]
    fn test_cancel_error_kinds_are_distinct() {
        assert_ne!(CancelError::Cancelled.to_string(), CancelError::DeadlineExceeded.to_string());
        let err: TransformError = CancelError::DeadlineExceeded.into();
        assert!(err.to_string().contains("deadline"));
    }
}
