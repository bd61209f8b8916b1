//! Animated counters
//!
//! A number that tweens from whatever it currently shows to each new target
//! with an exponential ease-out. Re-targeting mid-flight starts the new tween
//! at the in-flight value, so the display never jumps.
//!
//! # Example
//!
//! ```ignore
//! let scheduler = FrameScheduler::new();
//! let mut meals = AnimatedCounter::new(scheduler.handle(), CounterFormat::default());
//!
//! meals.set_target(17.0);
//! scheduler.tick(0.0);      // first frame pins the start time
//! scheduler.tick(2000.0);   // duration elapsed
//! assert_eq!(meals.text(), "17");
//! ```

use crate::easing::Easing;
use crate::scheduler::{FrameId, SchedulerHandle};
use std::sync::{Arc, Mutex, Weak};

/// Default tween length in milliseconds
pub const DEFAULT_DURATION_MS: u32 = 2000;

/// How a counter value is turned into text
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CounterFormat {
    pub prefix: String,
    pub suffix: String,
    pub decimals: usize,
}

impl CounterFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    /// Render `value` rounded to `decimals` digits between prefix and suffix
    pub fn format(&self, value: f64) -> String {
        format!(
            "{}{:.*}{}",
            self.prefix, self.decimals, value, self.suffix
        )
    }
}

struct CounterState {
    start: f64,
    target: f64,
    display: f64,
    /// Timestamp of the first frame of the current tween
    start_time: Option<f64>,
    duration_ms: f64,
    frame: Option<FrameId>,
    /// Bumped on every restart; stale callbacks compare against it
    generation: u64,
}

impl CounterState {
    fn progress_at(&self, elapsed_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }
}

/// A number that animates towards its target on every frame
///
/// The pending frame callback is cancelled when the counter is dropped.
pub struct AnimatedCounter {
    handle: SchedulerHandle,
    state: Arc<Mutex<CounterState>>,
    format: CounterFormat,
    easing: Easing,
}

impl AnimatedCounter {
    /// Create a counter showing 0
    pub fn new(handle: SchedulerHandle, format: CounterFormat) -> Self {
        Self {
            handle,
            state: Arc::new(Mutex::new(CounterState {
                start: 0.0,
                target: 0.0,
                display: 0.0,
                start_time: None,
                duration_ms: DEFAULT_DURATION_MS as f64,
                frame: None,
                generation: 0,
            })),
            format,
            easing: Easing::EaseOutExpo,
        }
    }

    /// Create a counter and immediately start animating from 0 to `target`
    pub fn with_target(handle: SchedulerHandle, target: f64, format: CounterFormat) -> Self {
        let mut counter = Self::new(handle, format);
        counter.set_target(target);
        counter
    }

    /// Set the tween length (builder pattern)
    pub fn duration(mut self, duration_ms: u32) -> Self {
        self.set_duration(duration_ms);
        self
    }

    /// Set the easing curve (builder pattern)
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Animate to a new target
    ///
    /// Returns false (and leaves any running tween alone) if `target` equals
    /// the current target.
    pub fn set_target(&mut self, target: f64) -> bool {
        {
            let mut state = self.state.lock().unwrap();
            if same_value(state.target, target) {
                return false;
            }
            state.target = target;
        }
        self.restart();
        true
    }

    /// Change the tween length
    ///
    /// A different duration restarts the tween from the displayed value.
    pub fn set_duration(&mut self, duration_ms: u32) -> bool {
        {
            let mut state = self.state.lock().unwrap();
            if state.duration_ms == duration_ms as f64 {
                return false;
            }
            state.duration_ms = duration_ms as f64;
        }
        self.restart();
        true
    }

    /// Currently displayed value
    pub fn get(&self) -> f64 {
        self.state.lock().unwrap().display
    }

    /// Currently displayed value, formatted
    pub fn text(&self) -> String {
        self.format.format(self.get())
    }

    /// The value being animated towards
    pub fn target(&self) -> f64 {
        self.state.lock().unwrap().target
    }

    pub fn duration_ms(&self) -> u32 {
        self.state.lock().unwrap().duration_ms as u32
    }

    pub fn format_spec(&self) -> &CounterFormat {
        &self.format
    }

    /// Check if a frame callback is pending
    pub fn is_animating(&self) -> bool {
        self.state.lock().unwrap().frame.is_some()
    }

    /// Jump straight to the target, cancelling any pending frame
    pub fn snap_to_target(&mut self) {
        let mut state = self.state.lock().unwrap();
        if let Some(id) = state.frame.take() {
            self.handle.cancel_frame(id);
        }
        state.generation += 1;
        state.display = state.target;
        state.start = state.target;
        state.start_time = None;
    }

    fn restart(&mut self) {
        let easing = self.easing;
        let mut state = self.state.lock().unwrap();
        if let Some(id) = state.frame.take() {
            self.handle.cancel_frame(id);
        }
        state.generation += 1;
        state.start = state.display;
        state.start_time = None;
        state.frame = schedule(
            &self.handle,
            Arc::downgrade(&self.state),
            state.generation,
            easing,
        );
        tracing::trace!(
            "AnimatedCounter: {} -> {} over {}ms",
            state.start,
            state.target,
            state.duration_ms
        );
    }
}

impl Drop for AnimatedCounter {
    fn drop(&mut self) {
        // Clean up the pending frame when the counter is dropped
        if let Some(id) = self.state.lock().unwrap().frame.take() {
            self.handle.cancel_frame(id);
        }
    }
}

fn schedule(
    handle: &SchedulerHandle,
    state: Weak<Mutex<CounterState>>,
    generation: u64,
    easing: Easing,
) -> Option<FrameId> {
    let next = handle.clone();
    handle.request_frame(move |timestamp| on_frame(&next, &state, generation, easing, timestamp))
}

fn on_frame(
    handle: &SchedulerHandle,
    state: &Weak<Mutex<CounterState>>,
    generation: u64,
    easing: Easing,
    timestamp: f64,
) {
    let Some(state_arc) = state.upgrade() else {
        return;
    };
    let mut s = state_arc.lock().unwrap();
    if s.generation != generation {
        return;
    }
    s.frame = None;

    let start_time = *s.start_time.get_or_insert(timestamp);
    let progress = s.progress_at(timestamp - start_time);

    if progress >= 1.0 {
        s.display = s.target;
        s.start = s.target;
        return;
    }

    s.display = s.start + (s.target - s.start) * easing.apply(progress);
    s.frame = schedule(handle, state.clone(), generation, easing);
}

/// Value equality where NaN equals NaN
fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}
