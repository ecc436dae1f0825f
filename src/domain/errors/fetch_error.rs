//! Fetch collaborator error types.

use thiserror::Error;

/// Fetch error variants.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
}
