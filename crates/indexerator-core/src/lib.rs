//! Core configuration and error types shared by the indexerator crates

pub mod config;
pub mod error;
mod constants;

pub use config::*;
pub use constants::*;
pub use error::*;

// Re-export external dependencies
pub use anyhow;
pub use serde;
pub use serde_json;
pub use thiserror;
