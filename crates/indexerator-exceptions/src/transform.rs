//! ExceptionData transformer
//!
//! Converts one envelope into one self-contained record per exception by
//! resolving the exception → stack trace → stack frame references. Records
//! are encoded as single-line JSON accepted by line-delimited bulk loads
//! (no explicit nulls, fixed field set).

use tracing::debug;

use crate::encoding::{encode_metadata, encode_record, NullSafe};
use crate::envelope::{Envelope, ExceptionDescriptor, StackTraceDescriptor};
use crate::error::{DanglingReference, TransformError, TransformResult};
use crate::schema::{exception_events_schema, TableSchema};
use crate::types::{ExceptionRecord, StackFrameRecord, StackTraceRecord};

/// Stateless transformer; one value can be shared by any number of threads.
#[derive(Debug, Clone)]
pub struct ExceptionDataTransformer {
    schema: TableSchema,
}

impl Default for ExceptionDataTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionDataTransformer {
    pub fn new() -> Self {
        Self {
            schema: exception_events_schema(),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Transform a raw envelope into encoded records, one per exception, in
    /// declaration order. Any error discards the whole envelope.
    pub fn transform(&self, raw: &str) -> TransformResult<Vec<String>> {
        self.transform_records(raw)?
            .iter()
            .map(|record| encode_record(record, &self.schema))
            .collect()
    }

    /// Same as [`transform`](Self::transform) but stops before encoding.
    pub fn transform_records(&self, raw: &str) -> TransformResult<Vec<ExceptionRecord>> {
        let envelope = Envelope::parse(raw)?;
        self.flatten(&envelope)
    }

    pub fn flatten(&self, envelope: &Envelope) -> TransformResult<Vec<ExceptionRecord>> {
        let records = envelope
            .exception_entries()
            .map(|(exception_id, exception)| flatten_exception(envelope, exception_id, exception))
            .collect::<TransformResult<Vec<_>>>()?;

        debug!(
            "Flattened envelope into {} exception records",
            records.len()
        );
        Ok(records)
    }
}

fn flatten_exception(
    envelope: &Envelope,
    exception_id: &str,
    exception: &ExceptionDescriptor,
) -> TransformResult<ExceptionRecord> {
    let stack_trace_id =
        exception
            .stack_trace
            .as_deref()
            .ok_or_else(|| DanglingReference::StackTrace {
                exception_id: exception_id.to_string(),
                stack_trace_id: None,
            })?;

    let stack_trace =
        envelope
            .stack_trace(stack_trace_id)
            .ok_or_else(|| DanglingReference::StackTrace {
                exception_id: exception_id.to_string(),
                stack_trace_id: Some(stack_trace_id.to_string()),
            })?;

    let metadata = encode_metadata(exception.metadata.as_ref()).map_err(|e| {
        TransformError::EncodingFailure {
            exception_id: exception_id.to_string(),
            reason: format!("metadata: {}", e),
        }
    })?;

    Ok(ExceptionRecord {
        exception_id: exception_id.to_string(),
        class_name: exception.class_name.as_ref().null_safe(),
        message: exception.message.as_ref().null_safe(),
        stacktrace: resolve_stack_trace(envelope, stack_trace_id, stack_trace)?,
        causes: exception.causes.as_ref().null_safe(),
        metadata,
        class_level_annotations: exception.class_level_annotations.as_ref().null_safe(),
    })
}

/// Resolves every frame id of `stack_trace`, keeping the call order.
fn resolve_stack_trace(
    envelope: &Envelope,
    stack_trace_id: &str,
    stack_trace: &StackTraceDescriptor,
) -> TransformResult<StackTraceRecord> {
    let stack_frames = stack_trace
        .stack_frames
        .iter()
        .map(|stack_frame_id| -> TransformResult<StackFrameRecord> {
            let frame = envelope.stack_frame(stack_frame_id).ok_or_else(|| {
                DanglingReference::StackFrame {
                    stack_trace_id: stack_trace_id.to_string(),
                    stack_frame_id: stack_frame_id.clone(),
                }
            })?;

            Ok(StackFrameRecord {
                stack_frame_id: stack_frame_id.clone(),
                declaring_class: frame.declaring_class.as_ref().null_safe(),
                method_name: frame.method_name.as_ref().null_safe(),
                file_name: frame.file_name.as_ref().null_safe(),
                line_number: frame.line_number.null_safe(),
                file_ref: frame.file_ref.as_ref().null_safe(),
            })
        })
        .collect::<TransformResult<Vec<_>>>()?;

    Ok(StackTraceRecord {
        stack_trace_id: stack_trace_id.to_string(),
        stack_frames,
    })
}
