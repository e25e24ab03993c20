//! Flattened output records, one per exception
//!
//! Field order and names match the `exception_events` table schema. Every
//! scalar is a plain value rather than an `Option`: absent source values are
//! replaced by the null-safe defaults in [`crate::encoding`] before a record is
//! built, so a record cannot carry a JSON `null`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionRecord {
    pub exception_id: String,
    pub class_name: String,
    pub message: String,
    pub stacktrace: StackTraceRecord,
    /// Exception ids, kept as references
    pub causes: Vec<String>,
    /// Metadata serialized as compact JSON text
    pub metadata: String,
    pub class_level_annotations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceRecord {
    pub stack_trace_id: String,
    pub stack_frames: Vec<StackFrameRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrameRecord {
    pub stack_frame_id: String,
    pub declaring_class: String,
    pub method_name: String,
    pub file_name: String,
    pub line_number: i64,
    pub file_ref: String,
}
