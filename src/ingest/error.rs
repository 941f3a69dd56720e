use std::path::PathBuf;
use thiserror::Error;

/// Reasons a single source could not be loaded.
///
/// These never abort an ingestion run; they end up as [`SkippedSource`](crate::SkippedSource)
/// entries of the [`IngestReport`](crate::IngestReport).
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Data download failed")]
    DownloadIo(#[from] std::io::Error),

    #[error("Failed to read source file '{0}'")]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
