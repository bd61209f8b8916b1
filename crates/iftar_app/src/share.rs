//! Campaign sharing
//!
//! Prefer the platform share sheet; fall back to copying the campaign link.

use crate::clipboard::Clipboard;
use crate::error::Result;
use crate::notify::{Notification, Notifier};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    /// The visitor dismissed the share sheet
    #[error("share cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

/// What gets shared
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareData {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Platform share sheet
pub trait ShareTarget: Send + Sync {
    fn share(&self, data: &ShareData) -> std::result::Result<(), ShareError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Handed to the share sheet
    Shared,
    /// No share sheet; the link was copied instead
    LinkCopied,
}

/// Share the campaign and notify the visitor
pub fn share_campaign(
    target: Option<&dyn ShareTarget>,
    clipboard: &dyn Clipboard,
    notifier: &dyn Notifier,
    data: &ShareData,
) -> Result<ShareOutcome> {
    let outcome = match target {
        Some(target) => target.share(data).map(|_| ShareOutcome::Shared),
        None => clipboard
            .write_text(&data.url)
            .map(|_| ShareOutcome::LinkCopied)
            .map_err(|err| ShareError::Failed(err.to_string())),
    };

    match outcome {
        Ok(ShareOutcome::Shared) => {
            notifier.notify(Notification::success("Campaign shared successfully"));
            Ok(ShareOutcome::Shared)
        }
        Ok(ShareOutcome::LinkCopied) => {
            notifier.notify(Notification::success("Link copied. Share with others."));
            Ok(ShareOutcome::LinkCopied)
        }
        Err(ShareError::Cancelled) => {
            tracing::debug!("share cancelled by visitor");
            Err(ShareError::Cancelled.into())
        }
        Err(err) => {
            tracing::warn!("share campaign failed: {}", err);
            notifier.notify(Notification::error("Failed to share campaign"));
            Err(err.into())
        }
    }
}
