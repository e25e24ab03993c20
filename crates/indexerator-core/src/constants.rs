use once_cell::sync::Lazy;

/// Substring that identifies exception-bearing build event lines.
pub const EXCEPTION_DATA_MARKER: &str = r#""eventType":"ExceptionData""#;

pub const DEFAULT_MAX_CONCURRENT_FILES: usize = 4;

pub const ENV_MAX_CONCURRENT_FILES: &str = "INDEXERATOR_MAX_CONCURRENT_FILES";

/// Default concurrency for the file indexer - configurable via
/// INDEXERATOR_MAX_CONCURRENT_FILES, falls back to DEFAULT_MAX_CONCURRENT_FILES
pub static MAX_CONCURRENT_FILES: Lazy<usize> = Lazy::new(|| {
    std::env::var(ENV_MAX_CONCURRENT_FILES)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n: &usize| *n > 0)
        .unwrap_or(DEFAULT_MAX_CONCURRENT_FILES)
});
