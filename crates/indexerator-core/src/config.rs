//! Configuration for indexing runs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{EXCEPTION_DATA_MARKER, MAX_CONCURRENT_FILES};
use crate::error::IndexingError;

/// What to do with an envelope that fails to transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Abort the whole run on the first broken envelope
    #[default]
    Fail,
    /// Log the broken envelope and continue with the next one
    Skip,
}

impl ErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPolicy::Fail => "fail",
            ErrorPolicy::Skip => "skip",
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ErrorPolicy {
    type Err = IndexingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(ErrorPolicy::Fail),
            "skip" => Ok(ErrorPolicy::Skip),
            other => Err(IndexingError::configuration(format!(
                "unknown error policy '{}', expected 'fail' or 'skip'",
                other
            ))),
        }
    }
}

/// Settings for one indexing run over local build event files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,

    /// Lines not containing this substring are never handed to the transformer
    #[serde(default = "default_marker")]
    pub event_type_marker: String,

    #[serde(default = "default_max_concurrent_files")]
    pub max_concurrent_files: usize,

    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

fn default_marker() -> String {
    EXCEPTION_DATA_MARKER.to_string()
}

fn default_max_concurrent_files() -> usize {
    *MAX_CONCURRENT_FILES
}

impl IndexingConfig {
    pub fn new(inputs: Vec<PathBuf>, output: PathBuf) -> Self {
        Self {
            inputs,
            output,
            event_type_marker: default_marker(),
            max_concurrent_files: default_max_concurrent_files(),
            error_policy: ErrorPolicy::default(),
        }
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub fn with_max_concurrent_files(mut self, max_concurrent_files: usize) -> Self {
        self.max_concurrent_files = max_concurrent_files;
        self
    }

    pub fn with_event_type_marker(mut self, marker: impl Into<String>) -> Self {
        self.event_type_marker = marker.into();
        self
    }

    /// Concurrency actually used, never below one
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrent_files.max(1)
    }

    pub fn validate(&self) -> Result<(), IndexingError> {
        if self.inputs.is_empty() {
            return Err(IndexingError::configuration("at least one input file is required"));
        }
        if self.event_type_marker.is_empty() {
            return Err(IndexingError::configuration("event type marker must not be empty"));
        }
        if self.inputs.iter().any(|input| input == &self.output) {
            return Err(IndexingError::configuration(format!(
                "output {} is also listed as an input",
                self.output.display()
            )));
        }
        Ok(())
    }
}
