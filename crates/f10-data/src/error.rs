//! Error types for fetch, storage and list-file operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(String),

    /// The upstream site has no page for this company
    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    /// Company codes are six ASCII digits
    #[error("Invalid company code: {0:?}")]
    InvalidCompanyCode(String),

    /// A list file line could not be parsed
    #[error("Invalid line {line} in {path}: {content:?}")]
    ListLine {
        /// File the line came from
        path: String,
        /// One-based line number
        line: usize,
        /// The offending line
        content: String,
    },

    /// A batch does not fit the table its tag selects
    #[error("Schema mismatch for {table}: {reason}")]
    Schema {
        /// Target table name
        table: String,
        /// What did not fit
        reason: String,
    },
}

impl DataError {
    pub(crate) fn schema(table: &str, reason: impl Into<String>) -> Self {
        Self::Schema {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}
