use std::fmt;
use thiserror::Error;

pub type TransformResult<T> = Result<T, TransformError>;

/// A cross-reference inside an envelope that points at nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DanglingReference {
    StackTrace {
        exception_id: String,
        /// `None` when the exception carries no stack trace reference at all
        stack_trace_id: Option<String>,
    },
    StackFrame {
        stack_trace_id: String,
        stack_frame_id: String,
    },
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DanglingReference::StackTrace {
                exception_id,
                stack_trace_id: Some(stack_trace_id),
            } => write!(
                f,
                "exception '{}' references unknown stack trace '{}'",
                exception_id, stack_trace_id
            ),
            DanglingReference::StackTrace {
                exception_id,
                stack_trace_id: None,
            } => write!(f, "exception '{}' has no stack trace reference", exception_id),
            DanglingReference::StackFrame {
                stack_trace_id,
                stack_frame_id,
            } => write!(
                f,
                "stack trace '{}' references unknown stack frame '{}'",
                stack_trace_id, stack_frame_id
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Dangling reference: {0}")]
    DanglingReference(DanglingReference),

    #[error("Failed to encode record for exception '{exception_id}': {reason}")]
    EncodingFailure { exception_id: String, reason: String },
}

/// Coarse category of a [`TransformError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedEnvelope,
    DanglingReference,
    EncodingFailure,
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::MalformedEnvelope(_) => ErrorKind::MalformedEnvelope,
            TransformError::DanglingReference(_) => ErrorKind::DanglingReference,
            TransformError::EncodingFailure { .. } => ErrorKind::EncodingFailure,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        TransformError::MalformedEnvelope(message.into())
    }
}

impl From<DanglingReference> for TransformError {
    fn from(reference: DanglingReference) -> Self {
        TransformError::DanglingReference(reference)
    }
}
