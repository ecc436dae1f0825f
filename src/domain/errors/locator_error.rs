//! Locator parsing error types.

use thiserror::Error;

/// Locator parsing error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum LocatorError {
    #[error("invalid image locator '{input}': {reason}")]
    Invalid { input: String, reason: String },

    #[error("image locator has no file name: {input}")]
    MissingFileName { input: String },
}

impl LocatorError {
    /// Creates invalid locator error.
    #[must_use]
    pub fn invalid(input: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Invalid {
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates missing file name error.
    #[must_use]
    pub fn missing_file_name(input: impl Into<String>) -> Self {
        Self::MissingFileName {
            input: input.into(),
        }
    }
}
