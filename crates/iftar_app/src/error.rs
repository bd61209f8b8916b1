//! Error types for iftar_app

use crate::amount::AmountError;
use crate::clipboard::ClipboardError;
use crate::share::ShareError;
use iftar_query::QueryError;
use thiserror::Error;

/// Errors surfaced to the campaign page
///
/// None of these are fatal: each one leaves the visible state as it was and
/// is reported to the visitor as a notification.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Amount rejected before any backend call
    #[error("invalid donation amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// The backend is not ready to accept calls
    #[error("backend not ready")]
    NotReady,

    /// The backend did not record the donation
    #[error("failed to record donation: {0}")]
    Donation(QueryError),

    /// Copying to the clipboard failed
    #[error("clipboard write failed: {0}")]
    Clipboard(#[from] ClipboardError),

    /// Sharing the campaign failed
    #[error("share failed: {0}")]
    Share(#[from] ShareError),
}

/// Result type for iftar_app operations
pub type Result<T> = std::result::Result<T, AppError>;
