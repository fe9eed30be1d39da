//! # Query execution
//!
//! Runs a [`RequestEnvelope`] against the composed schema and reports the
//! outcome as an [`ExecutionResult`]. Every failure the engine reports is
//! converted to a [`StructuredError`] with its classification, path and source
//! locations.

pub mod context;
pub mod engine;
pub mod error;
pub mod locate;
pub mod request;
pub mod result;
pub mod strategy;

pub use context::{Capability, ExecutionContext, RequestSnapshot, ResponseHandle};
pub use engine::{execute, ExecutionEngine, ExecutionOptions};
pub use error::{ErrorKind, PathSegment, SourceLocation, StructuredError};
pub use request::{BatchEnvelope, EnvelopeError, Payload, RequestEnvelope};
pub use result::ExecutionResult;
