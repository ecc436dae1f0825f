//! Image resolution error types.

use thiserror::Error;

/// Pipeline stage at which a resolution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStage {
    /// Reading or decoding an existing cache entry.
    CacheRead,
    /// Fetching bytes through the fetch collaborator.
    Fetch,
    /// Decoding freshly fetched bytes.
    Decode,
    /// Writing a cache entry.
    Persist,
}

impl std::fmt::Display for ResolveStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CacheRead => write!(f, "cache_read"),
            Self::Fetch => write!(f, "fetch"),
            Self::Decode => write!(f, "decode"),
            Self::Persist => write!(f, "persist"),
        }
    }
}

/// Failure reported in a [`LoadOutcome`](crate::domain::entities::LoadOutcome).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ResolveError {
    #[error("cached image unreadable: {message}")]
    CacheRead { message: String },

    #[error("fetch failed: {message}")]
    Fetch { message: String },

    #[error("image decode failed: {message}")]
    Decode { message: String },

    #[error("failed to persist image: {message}")]
    Persist { message: String },

    #[error("resource exhaustion while reading cache: {message}")]
    ResourceExhaustion { message: String },
}

impl ResolveError {
    /// Creates cache read error.
    #[must_use]
    pub fn cache_read(message: impl Into<String>) -> Self {
        Self::CacheRead {
            message: message.into(),
        }
    }

    /// Creates fetch error.
    #[must_use]
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates persist error.
    #[must_use]
    pub fn persist(message: impl Into<String>) -> Self {
        Self::Persist {
            message: message.into(),
        }
    }

    /// Creates resource exhaustion error.
    #[must_use]
    pub fn exhausted(message: impl Into<String>) -> Self {
        Self::ResourceExhaustion {
            message: message.into(),
        }
    }

    /// Returns the stage that produced this error.
    #[must_use]
    pub const fn stage(&self) -> ResolveStage {
        match self {
            Self::CacheRead { .. } | Self::ResourceExhaustion { .. } => ResolveStage::CacheRead,
            Self::Fetch { .. } => ResolveStage::Fetch,
            Self::Decode { .. } => ResolveStage::Decode,
            Self::Persist { .. } => ResolveStage::Persist,
        }
    }

    /// Returns true for failures that point at process-wide resource pressure.
    #[must_use]
    pub const fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Self::ResourceExhaustion { .. })
    }
}
