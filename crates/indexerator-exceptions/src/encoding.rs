//! Null-safe encoding policy for the bulk-load sink
//!
//! The sink rejects explicit `null` for declared scalar columns. Absent
//! values are therefore replaced when a record is assembled:
//!
//! | source                  | encoded as               |
//! |-------------------------|--------------------------|
//! | missing string          | `""`                     |
//! | missing `lineNumber`    | [`LINE_NUMBER_SENTINEL`] |
//! | missing string sequence | `[]`                     |
//! | missing/null metadata   | `""`                     |
//!
//! [`encode_record`] additionally checks every record against the declared
//! table schema before it is rendered.

use serde_json::Value;

use crate::error::{TransformError, TransformResult};
use crate::schema::TableSchema;
use crate::types::ExceptionRecord;

/// Line number written for frames whose source omits `lineNumber`
pub const LINE_NUMBER_SENTINEL: i64 = 0;

/// Replaces an absent value with the value the sink accepts for it
pub trait NullSafe {
    type Output;

    fn null_safe(self) -> Self::Output;
}

impl NullSafe for Option<String> {
    type Output = String;

    fn null_safe(self) -> String {
        self.unwrap_or_default()
    }
}

impl NullSafe for Option<&String> {
    type Output = String;

    fn null_safe(self) -> String {
        self.cloned().unwrap_or_default()
    }
}

impl NullSafe for Option<i64> {
    type Output = i64;

    fn null_safe(self) -> i64 {
        self.unwrap_or(LINE_NUMBER_SENTINEL)
    }
}

impl NullSafe for Option<&Vec<String>> {
    type Output = Vec<String>;

    fn null_safe(self) -> Vec<String> {
        self.cloned().unwrap_or_default()
    }
}

/// Serializes the opaque metadata blob to compact JSON, keeping key order.
pub fn encode_metadata(metadata: Option<&Value>) -> Result<String, serde_json::Error> {
    match metadata {
        None | Some(Value::Null) => Ok(String::new()),
        Some(value) => serde_json::to_string(value),
    }
}

/// Renders a record as a single JSON line after checking it against `schema`.
pub fn encode_record(record: &ExceptionRecord, schema: &TableSchema) -> TransformResult<String> {
    let encoding_failure = |reason: String| TransformError::EncodingFailure {
        exception_id: record.exception_id.clone(),
        reason,
    };

    let value = serde_json::to_value(record).map_err(|e| encoding_failure(e.to_string()))?;
    schema
        .check(&value)
        .map_err(|violation| encoding_failure(violation.to_string()))?;

    // serde_json never emits raw newlines in compact output; string content is escaped
    serde_json::to_string(&value).map_err(|e| encoding_failure(e.to_string()))
}
