//! File indexer for exception events
//!
//! Reads newline-delimited build event files, keeps the lines that carry an
//! `ExceptionData` event, flattens them and writes one output record per
//! line. Files are transformed concurrently on the blocking pool; the output
//! keeps input file order and is only written once every file succeeded.
//! Candidate lines that are not valid UTF-8 go through the error policy like
//! any other broken envelope.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use indexerator_core::{
    ErrorPolicy, IndexingConfig, IndexingError, IndexingResult, EXCEPTION_DATA_MARKER,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::transform::ExceptionDataTransformer;

/// Cheap pre-filter: does `line` carry the event type `marker`?
pub fn is_exception_event(line: &str, marker: &str) -> bool {
    line.contains(marker)
}

/// Counters for an indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexingReport {
    pub files: usize,
    pub lines_read: usize,
    pub candidate_lines: usize,
    pub envelopes: usize,
    pub records: usize,
    pub skipped_envelopes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl IndexingReport {
    fn absorb(&mut self, other: &IndexingReport) {
        self.files += other.files;
        self.lines_read += other.lines_read;
        self.candidate_lines += other.candidate_lines;
        self.envelopes += other.envelopes;
        self.records += other.records;
        self.skipped_envelopes += other.skipped_envelopes;
    }
}

/// Records produced from one input together with its counters
#[derive(Debug, Clone, Default)]
pub struct IndexedSource {
    pub records: Vec<String>,
    pub report: IndexingReport,
}

#[derive(Debug, Clone)]
pub struct ExceptionEventsIndexer {
    transformer: Arc<ExceptionDataTransformer>,
    event_type_marker: String,
    error_policy: ErrorPolicy,
}

impl Default for ExceptionEventsIndexer {
    fn default() -> Self {
        Self::new(Arc::new(ExceptionDataTransformer::new()))
    }
}

impl ExceptionEventsIndexer {
    pub fn new(transformer: Arc<ExceptionDataTransformer>) -> Self {
        Self {
            transformer,
            event_type_marker: EXCEPTION_DATA_MARKER.to_string(),
            error_policy: ErrorPolicy::default(),
        }
    }

    pub fn from_config(config: &IndexingConfig) -> Self {
        Self::default()
            .with_event_type_marker(config.event_type_marker.clone())
            .with_error_policy(config.error_policy)
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub fn with_event_type_marker(mut self, marker: impl Into<String>) -> Self {
        self.event_type_marker = marker.into();
        self
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    fn is_candidate(&self, line: &str) -> bool {
        is_exception_event(line, &self.event_type_marker)
    }

    /// Filter and transform the lines of one input. `source_name` only
    /// labels log messages and errors.
    pub fn index_lines<'a, I>(&self, source_name: &str, lines: I) -> IndexingResult<IndexedSource>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.index_decoded(source_name, lines.into_iter().map(Ok))
    }

    /// Same as [`index_lines`](Self::index_lines) for raw file contents.
    /// Lines are split on `\n` and decoded one at a time.
    pub fn index_bytes(&self, source_name: &str, contents: &[u8]) -> IndexingResult<IndexedSource> {
        let lines = split_lines(contents).map(|line| std::str::from_utf8(line).map_err(|_| line));
        self.index_decoded(source_name, lines)
    }

    fn index_decoded<'a, I>(&self, source_name: &str, lines: I) -> IndexingResult<IndexedSource>
    where
        I: IntoIterator<Item = Result<&'a str, &'a [u8]>>,
    {
        let mut output = IndexedSource::default();
        output.report.files = 1;

        for (index, line) in lines.into_iter().enumerate() {
            output.report.lines_read += 1;
            let line = match line {
                Ok(line) if self.is_candidate(line) => line,
                Ok(_) => continue,
                Err(bytes) => {
                    if !self.is_candidate(&String::from_utf8_lossy(bytes)) {
                        continue;
                    }
                    output.report.candidate_lines += 1;
                    self.reject(
                        source_name,
                        index + 1,
                        "line is not valid UTF-8".to_string(),
                        &mut output.report,
                    )?;
                    continue;
                }
            };
            output.report.candidate_lines += 1;

            match self.transformer.transform(line) {
                Ok(records) => {
                    output.report.envelopes += 1;
                    output.report.records += records.len();
                    output.records.extend(records);
                }
                Err(e) => self.reject(
                    source_name,
                    index + 1,
                    format!("{} ({:?})", e, e.kind()),
                    &mut output.report,
                )?,
            }
        }

        debug!(
            "{}: {} candidate lines, {} records",
            source_name, output.report.candidate_lines, output.report.records
        );
        Ok(output)
    }

    /// Applies the error policy to a candidate line that produced no records.
    fn reject(
        &self,
        source_name: &str,
        line: usize,
        message: String,
        report: &mut IndexingReport,
    ) -> IndexingResult<()> {
        match self.error_policy {
            ErrorPolicy::Fail => Err(IndexingError::Transform {
                source_name: source_name.to_string(),
                line,
                message,
            }),
            ErrorPolicy::Skip => {
                warn!("Skipping envelope at {}:{}: {}", source_name, line, message);
                report.skipped_envelopes += 1;
                Ok(())
            }
        }
    }

    /// Read, transform and write every input of `config`.
    pub async fn run(&self, config: &IndexingConfig) -> IndexingResult<IndexingReport> {
        config.validate()?;

        let mut report = IndexingReport {
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        let semaphore = Arc::new(Semaphore::new(config.effective_concurrency()));
        let tasks = config.inputs.iter().cloned().map(|input| {
            let indexer = self.clone();
            let semaphore = semaphore.clone();
            tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| IndexingError::Internal(e.into()))?;
                indexer.index_file(input).await
            })
        });

        let mut records = Vec::new();
        for joined in join_all(tasks).await {
            let source = joined.map_err(|e| IndexingError::Internal(e.into()))??;
            report.absorb(&source.report);
            records.extend(source.records);
        }

        write_records(&config.output, &records).await?;

        report.finished_at = Some(Utc::now());
        info!(
            "Indexed {} files: {} envelopes, {} records, {} skipped",
            report.files, report.envelopes, report.records, report.skipped_envelopes
        );
        Ok(report)
    }

    async fn index_file(self, input: PathBuf) -> IndexingResult<IndexedSource> {
        let contents = tokio::fs::read(&input)
            .await
            .map_err(|e| IndexingError::io(&input, e))?;

        let source_name = input.display().to_string();
        let source = tokio::task::spawn_blocking(move || {
            self.index_bytes(&source_name, &contents)
        })
        .await
        .map_err(|e| IndexingError::Internal(e.into()))??;

        info!(
            "Indexed {}: {} records from {} lines",
            input.display(),
            source.report.records,
            source.report.lines_read
        );
        Ok(source)
    }
}

/// Splits like `str::lines`: no trailing empty line, `\r\n` accepted.
fn split_lines(contents: &[u8]) -> impl Iterator<Item = &[u8]> {
    let contents = contents.strip_suffix(b"\n").unwrap_or(contents);
    contents
        .split(|byte| *byte == b'\n')
        .filter(move |_| !contents.is_empty())
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

async fn write_records(output: &Path, records: &[String]) -> IndexingResult<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| IndexingError::io(parent, e))?;
    }

    let file = tokio::fs::File::create(output)
        .await
        .map_err(|e| IndexingError::io(output, e))?;
    let mut writer = BufWriter::new(file);

    for record in records {
        writer
            .write_all(record.as_bytes())
            .await
            .map_err(|e| IndexingError::io(output, e))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| IndexingError::io(output, e))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| IndexingError::io(output, e))
}
