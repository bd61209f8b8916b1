//! Frame scheduler
//!
//! One-shot frame callbacks in the style of `requestAnimationFrame`. The host
//! owns a `FrameScheduler` and calls `tick()` once per presented frame with a
//! monotonic timestamp in milliseconds. Components hold a weak
//! `SchedulerHandle` and register callbacks through it:
//!
//! - a callback runs at most once, on the first tick after it was requested
//! - callbacks requested while a tick is running wait for the next tick
//! - a cancelled callback never runs
//!
//! ```ignore
//! let scheduler = FrameScheduler::new();
//! let handle = scheduler.handle();
//!
//! handle.request_frame(|ts| println!("frame at {ts}ms"));
//! scheduler.tick(16.0);
//! ```

use slotmap::{new_key_type, SlotMap};
use std::sync::{Arc, Mutex, Weak};

new_key_type! {
    /// Handle to a pending frame callback
    pub struct FrameId;
}

/// Callback invoked with the frame timestamp in milliseconds
pub type FrameCallback = Box<dyn FnOnce(f64) + Send>;

struct SchedulerInner {
    frames: SlotMap<FrameId, FrameCallback>,
    last_timestamp: Option<f64>,
    frame_count: u64,
}

/// Owner of all pending frame callbacks
///
/// Dropping the scheduler drops every pending callback; handles outlive it
/// safely and turn into no-ops.
pub struct FrameScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                frames: SlotMap::with_key(),
                last_timestamp: None,
                frame_count: 0,
            })),
        }
    }

    /// Get a handle to this scheduler for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Run every callback that was pending when the tick started
    ///
    /// Returns true if callbacks are pending afterwards (another tick is needed).
    pub fn tick(&self, timestamp_ms: f64) -> bool {
        let due: Vec<(FrameId, FrameCallback)> = {
            let mut inner = self.inner.lock().unwrap();
            inner.last_timestamp = Some(timestamp_ms);
            inner.frame_count += 1;
            inner.frames.drain().collect()
        };

        if !due.is_empty() {
            tracing::trace!("FrameScheduler: running {} callbacks at {}ms", due.len(), timestamp_ms);
        }

        // The lock is released so callbacks can request follow-up frames
        for (_, callback) in due {
            callback(timestamp_ms);
        }

        self.has_pending_frames()
    }

    /// Check if any callbacks are waiting for a tick
    pub fn has_pending_frames(&self) -> bool {
        !self.inner.lock().unwrap().frames.is_empty()
    }

    /// Get the number of pending callbacks
    pub fn pending_frames(&self) -> usize {
        self.inner.lock().unwrap().frames.len()
    }

    /// Timestamp passed to the most recent tick
    pub fn last_timestamp(&self) -> Option<f64> {
        self.inner.lock().unwrap().last_timestamp
    }

    /// Number of ticks run so far
    pub fn frame_count(&self) -> u64 {
        self.inner.lock().unwrap().frame_count
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to the frame scheduler
///
/// This is passed to components that need frame callbacks.
/// It won't prevent the scheduler from being dropped.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Register a callback for the next tick
    ///
    /// Returns `None` if the scheduler no longer exists.
    pub fn request_frame<F>(&self, callback: F) -> Option<FrameId>
    where
        F: FnOnce(f64) + Send + 'static,
    {
        self.inner
            .upgrade()
            .map(|inner| inner.lock().unwrap().frames.insert(Box::new(callback)))
    }

    /// Cancel a pending callback
    ///
    /// Returns true if the callback was still pending.
    pub fn cancel_frame(&self, id: FrameId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.lock().unwrap().frames.remove(id).is_some())
            .unwrap_or(false)
    }

    /// Check if a callback is still waiting for a tick
    pub fn is_pending(&self, id: FrameId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.lock().unwrap().frames.contains_key(id))
            .unwrap_or(false)
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
