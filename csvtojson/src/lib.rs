//! # csvtojson - streaming CSV to newline-delimited JSON
//!
//! Reads delimited text from any [`std::io::Read`] and writes one compact JSON
//! object per data row to any [`std::io::Write`], optionally renaming headers
//! and injecting static key/value pairs.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV source │────▶│   Headers   │────▶│  Transform  │────▶│ JSON lines  │
//! │ (any Read)  │     │ (validated) │     │ (per record)│     │ (any Write) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! Memory use is bounded by the number of columns: records are read,
//! transformed and written one at a time.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csvtojson::{transform, CancelToken, SettingsBuilder};
//!
//! let settings = SettingsBuilder::new()
//!     .field_mapping([("field1", "id"), ("field2", "name")])
//!     .injection([("source", "import")])
//!     .build();
//!
//! let stdin = std::io::stdin();
//! let stdout = std::io::stdout();
//! transform(&CancelToken::none(), stdin.lock(), stdout.lock(), &settings)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`config`] - Settings and boundary parsing
//! - [`context`] - Cancellation token
//! - [`logs`] - Log broadcasting
//! - [`parser`] - Incremental CSV reader
//! - [`validation`] - Header mapping / injection checks
//! - [`transform`] - Record transformer, JSON emitter, pipeline

// Core modules
pub mod config;
pub mod context;
pub mod error;
pub mod logs;

// Parsing
pub mod parser;

// Validation
pub mod validation;

// Transformation
pub mod transform;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{
    CancelError,
    ConfigError,
    CsvError,
    EmitError,
    TransformError,
    TransformResult,
    ValidationError,
};

pub use config::{
    parse_separator,
    parse_string_map,
    parse_timeout,
    Settings,
    SettingsBuilder,
    StringMap,
    DEFAULT_SEPARATOR,
};

pub use context::CancelToken;

pub use parser::RecordReader;

pub use validation::validate_headers;

pub use transform::{
    emit,
    transform,
    transform_record,
    JsonLineEmitter,
    OutputObject,
    PipelineState,
    TransformStats,
};
