use std::path::PathBuf;

use thiserror::Error;

/// Why a single catalog source failed to produce raw records.
///
/// These never escape the fallback chain; they are logged and recorded as
/// stage failures.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Status(u16),

    #[error("Unexpected response shape: {0}")]
    Shape(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Source disabled by configuration")]
    Disabled,
}
