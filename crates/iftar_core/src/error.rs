//! Error types for iftar_core

use thiserror::Error;

/// Errors returned by a `CampaignBackend`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the call
    #[error("backend rejected the call: {0}")]
    Rejected(String),
}

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;
