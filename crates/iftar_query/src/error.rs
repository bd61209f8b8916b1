//! Error types for iftar_query

use thiserror::Error;

/// Errors surfaced by queries and mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The fetch or mutation function failed
    #[error("{0}")]
    Failed(String),

    /// A fetch was requested outside of a tokio runtime
    #[error("no async runtime available to run the fetch")]
    NoRuntime,

    /// The query settled without ever producing data
    #[error("query has no data")]
    NoData,

    /// The query was torn down while a caller was waiting on it
    #[error("query was dropped")]
    Dropped,
}

impl QueryError {
    /// Wrap any displayable error as a fetch failure
    pub fn failed(err: impl std::fmt::Display) -> Self {
        QueryError::Failed(err.to_string())
    }
}

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;
