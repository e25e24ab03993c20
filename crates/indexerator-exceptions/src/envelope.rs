//! Envelope model for `ExceptionData` build events
//!
//! An envelope stores every exception, stack trace and stack frame of one
//! build event exactly once and links them by id:
//!
//! ```text
//! {
//!   "exceptions":  { "<exceptionId>":  { "stackTrace": "<stackTraceId>", "causes": [...], ... } },
//!   "stackTraces": { "<stackTraceId>": { "stackFrames": ["<stackFrameId>", ...] } },
//!   "stackFrames": { "<stackFrameId>": { "declaringClass": ..., "lineNumber": ... } }
//! }
//! ```
//!
//! Build event lines wrap these mappings as
//! `{"eventType":"ExceptionData","data":{...}}`; both forms are accepted.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{TransformError, TransformResult};

const EXCEPTIONS_KEY: &str = "exceptions";
const STACK_TRACES_KEY: &str = "stackTraces";
const STACK_FRAMES_KEY: &str = "stackFrames";
const DATA_KEY: &str = "data";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDescriptor {
    pub class_name: Option<String>,
    pub message: Option<String>,
    /// Id of the exception's entry in `stackTraces`
    pub stack_trace: Option<String>,
    /// Ids of other entries in `exceptions`
    pub causes: Option<Vec<String>>,
    pub metadata: Option<Value>,
    pub class_level_annotations: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceDescriptor {
    pub stack_trace_id: Option<String>,
    /// Frame ids in call order
    #[serde(default)]
    pub stack_frames: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrameDescriptor {
    pub declaring_class: Option<String>,
    pub method_name: Option<String>,
    pub file_name: Option<String>,
    pub line_number: Option<i64>,
    pub file_ref: Option<String>,
}

/// A parsed, read-only envelope
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    exceptions: Vec<(String, ExceptionDescriptor)>,
    stack_traces: HashMap<String, StackTraceDescriptor>,
    stack_frames: HashMap<String, StackFrameDescriptor>,
}

impl Envelope {
    /// Parse an envelope from its raw JSON text
    pub fn parse(raw: &str) -> TransformResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| TransformError::malformed(format!("invalid JSON: {}", e)))?;

        let root = match value {
            Value::Object(root) => root,
            other => {
                return Err(TransformError::malformed(format!(
                    "expected a JSON object, found {}",
                    json_type_name(&other)
                )))
            }
        };

        let mut body = unwrap_build_event(root)?;

        let exceptions = take_mapping::<ExceptionDescriptor>(&mut body, EXCEPTIONS_KEY)?;
        let stack_traces = take_mapping::<StackTraceDescriptor>(&mut body, STACK_TRACES_KEY)?
            .into_iter()
            .collect();
        let stack_frames = take_mapping::<StackFrameDescriptor>(&mut body, STACK_FRAMES_KEY)?
            .into_iter()
            .collect();

        Ok(Envelope {
            exceptions,
            stack_traces,
            stack_frames,
        })
    }

    /// Exception entries in source declaration order.
    ///
    /// The iterator is `Clone`, so callers can walk the entries more than once.
    pub fn exception_entries(
        &self,
    ) -> impl Iterator<Item = (&str, &ExceptionDescriptor)> + Clone + '_ {
        self.exceptions
            .iter()
            .map(|(id, descriptor)| (id.as_str(), descriptor))
    }

    pub fn stack_trace(&self, id: &str) -> Option<&StackTraceDescriptor> {
        self.stack_traces.get(id)
    }

    pub fn stack_frame(&self, id: &str) -> Option<&StackFrameDescriptor> {
        self.stack_frames.get(id)
    }

    pub fn exception_count(&self) -> usize {
        self.exceptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exceptions.is_empty()
    }
}

impl FromStr for Envelope {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Envelope::parse(s)
    }
}

/// Returns the object holding the three mappings. A build event wrapper is
/// only unwrapped when none of the mappings sit at the top level.
fn unwrap_build_event(mut root: Map<String, Value>) -> TransformResult<Map<String, Value>> {
    let has_mappings = [EXCEPTIONS_KEY, STACK_TRACES_KEY, STACK_FRAMES_KEY]
        .iter()
        .any(|key| root.contains_key(*key));
    if has_mappings {
        return Ok(root);
    }

    match root.remove(DATA_KEY) {
        Some(Value::Object(data)) => Ok(data),
        None | Some(Value::Null) => Ok(root),
        Some(other) => Err(TransformError::malformed(format!(
            "'{}' must be an object, found {}",
            DATA_KEY,
            json_type_name(&other)
        ))),
    }
}

/// Removes `key` from `body` and decodes each of its entries, keeping the
/// source order. A missing or `null` mapping is empty.
fn take_mapping<T: DeserializeOwned>(
    body: &mut Map<String, Value>,
    key: &str,
) -> TransformResult<Vec<(String, T)>> {
    let entries = match body.remove(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            return Err(TransformError::malformed(format!(
                "'{}' must be an object, found {}",
                key,
                json_type_name(&other)
            )))
        }
    };

    entries
        .into_iter()
        .map(|(id, value)| match serde_json::from_value::<T>(value) {
            Ok(descriptor) => Ok((id, descriptor)),
            Err(e) => Err(TransformError::malformed(format!(
                "invalid entry '{}' in '{}': {}",
                id, key, e
            ))),
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
