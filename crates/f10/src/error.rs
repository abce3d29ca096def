//! Error types for batch runs.

use f10_data::DataError;
use f10_extract::ExtractError;
use thiserror::Error;

/// Result type for batch operations.
pub type Result<T> = std::result::Result<T, BatchError>;

/// Errors that fail one unit of a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Fetch, storage or list-file failure
    #[error(transparent)]
    Data(#[from] DataError),

    /// The fetched page could not be extracted
    #[error(transparent)]
    Extract(#[from] ExtractError),
}
