//! Transformation module.
//!
//! - Record: one CSV record to one output object
//! - Emitter: output objects to newline-delimited JSON
//! - Pipeline: read, validate, transform and emit under a cancel token

pub mod emitter;
pub mod pipeline;
pub mod record;

pub use emitter::{emit, JsonLineEmitter};
pub use pipeline::{transform, PipelineState, TransformStats};
pub use record::{transform_record, OutputObject};
