//! # Exception Events
//!
//! Flattens deduplicated `ExceptionData` build events into one
//! self-contained record per exception, ready for line-delimited bulk load.
//!
//! ```text
//! raw build event line
//!     ↓
//! Indexer filter (indexer.rs)
//!     ↓
//! Envelope Model (envelope.rs)
//!     ↓
//! Transformer (transform.rs) ── null-safe encoding (encoding.rs)
//!     ↓                          schema check (schema.rs)
//! one JSON line per exception
//! ```

pub mod encoding;
pub mod envelope;
pub mod error;
pub mod indexer;
pub mod schema;
pub mod transform;
pub mod types;

pub use envelope::{Envelope, ExceptionDescriptor, StackFrameDescriptor, StackTraceDescriptor};
pub use error::{DanglingReference, ErrorKind, TransformError, TransformResult};
pub use indexer::{is_exception_event, ExceptionEventsIndexer, IndexingReport};
pub use schema::{exception_events_schema, SchemaViolation, TableFieldSchema, TableSchema};
pub use transform::ExceptionDataTransformer;
pub use types::{ExceptionRecord, StackFrameRecord, StackTraceRecord};
