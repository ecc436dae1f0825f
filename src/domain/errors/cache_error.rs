//! Disk cache error types.

use thiserror::Error;

/// Result type for disk cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur during disk cache operations.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// I/O error during cache operation.
    #[error("IO error: {0}")]
    IoError(String),
    /// No writable encoder for the entry's suffix.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    /// Encoder rejected the image.
    #[error("Encode error: {0}")]
    EncodeError(String),
}
