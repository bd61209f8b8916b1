//! Clipboard access

use crate::error::Result;
use crate::notify::{Notification, Notifier};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("clipboard unavailable")]
    Unavailable,

    #[error("clipboard write denied: {0}")]
    Denied(String),
}

/// Platform clipboard
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> std::result::Result<(), ClipboardError>;
}

/// In-process clipboard
#[derive(Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    unavailable: AtomicBool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail, as a locked-down browser would
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> std::result::Result<(), ClipboardError> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(ClipboardError::Unavailable);
        }
        *self.contents.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

/// Copy the payee's UPI ID and tell the visitor how it went
pub fn copy_upi_id(clipboard: &dyn Clipboard, notifier: &dyn Notifier, address: &str) -> Result<()> {
    match clipboard.write_text(address) {
        Ok(()) => {
            notifier.notify(Notification::success("UPI ID copied to clipboard"));
            Ok(())
        }
        Err(err) => {
            tracing::warn!("copy UPI ID failed: {}", err);
            notifier.notify(Notification::error("Failed to copy UPI ID"));
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::notify::{NotificationLevel, ToastQueue};

    #[test]
    fn test_copy_upi_id() {
        let clipboard = MemoryClipboard::new();
        let toasts = ToastQueue::new();

        copy_upi_id(&clipboard, &toasts, "fund@oksbi").unwrap();

        assert_eq!(clipboard.contents().as_deref(), Some("fund@oksbi"));
        let toast = toasts.last().unwrap();
        assert_eq!(toast.level, NotificationLevel::Success);
        assert_eq!(toast.title, "UPI ID copied to clipboard");
    }

    #[test]
    fn test_copy_failure_is_reported() {
        let clipboard = MemoryClipboard::new();
        clipboard.set_unavailable(true);
        let toasts = ToastQueue::new();

        let err = copy_upi_id(&clipboard, &toasts, "fund@oksbi").unwrap_err();

        assert_eq!(err, AppError::Clipboard(ClipboardError::Unavailable));
        assert!(clipboard.contents().is_none());
        assert_eq!(toasts.last().unwrap().title, "Failed to copy UPI ID");
        assert_eq!(toasts.len(), 1);
    }
}
