//! Error types for extraction operations.

use thiserror::Error;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur while extracting records from a fetched page.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The kind code matches no configured statement kind
    #[error("Unsupported kind code: {0}")]
    UnsupportedKind(String),

    /// The page was fetched but does not have the expected structure
    #[error("Source unavailable for {kind}: {reason}")]
    SourceUnavailable {
        /// Storage tag of the kind being extracted
        kind: String,
        /// What was missing or malformed
        reason: String,
    },

    /// A cell value matches no accepted coercion pattern
    #[error("Invalid {expected} value: {value:?}")]
    Format {
        /// The sanitized cell text
        value: String,
        /// Name of the expected value type
        expected: &'static str,
    },
}

impl ExtractError {
    /// Shorthand for a [`ExtractError::SourceUnavailable`] error.
    pub fn unavailable(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn format(value: &str, expected: &'static str) -> Self {
        Self::Format {
            value: value.to_string(),
            expected,
        }
    }
}
