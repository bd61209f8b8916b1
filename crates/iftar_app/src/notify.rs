//! Notifications
//!
//! Short-lived toasts shown after user actions. The page hands a `Notifier`
//! to everything that can succeed or fail visibly.

use std::sync::Mutex;
use std::time::Duration;

/// How long a toast stays up unless the caller says otherwise
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(4000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

/// A single toast
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: Option<String>,
    pub duration: Duration,
}

impl Notification {
    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title)
    }

    fn new(level: NotificationLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: None,
            duration: DEFAULT_TOAST_DURATION,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Sink for notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Collects notifications for later display
#[derive(Default)]
pub struct ToastQueue {
    toasts: Mutex<Vec<Notification>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued toast, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.toasts.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.toasts.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<Notification> {
        self.toasts.lock().unwrap().last().cloned()
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, notification: Notification) {
        self.toasts.lock().unwrap().push(notification);
    }
}

/// Writes notifications to the log
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        let description = notification.description.as_deref().unwrap_or("");
        match notification.level {
            NotificationLevel::Error => {
                tracing::warn!("{} {}", notification.title, description)
            }
            NotificationLevel::Success | NotificationLevel::Info => {
                tracing::info!("{} {}", notification.title, description)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_queue_drains_in_order() {
        let queue = ToastQueue::new();
        queue.notify(Notification::success("first"));
        queue.notify(Notification::error("second").description("details"));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.last().unwrap().title, "second");

        let toasts = queue.drain();
        assert_eq!(toasts[0].level, NotificationLevel::Success);
        assert_eq!(toasts[1].description.as_deref(), Some("details"));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_builder_defaults() {
        let n = Notification::info("hello");
        assert_eq!(n.duration, DEFAULT_TOAST_DURATION);
        assert!(n.description.is_none());

        let n = n.duration(Duration::from_secs(5));
        assert_eq!(n.duration.as_millis(), 5000);
    }
}
