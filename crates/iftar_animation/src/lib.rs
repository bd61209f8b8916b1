//! Iftar Fund Animation System
//!
//! Frame-driven tweens for the campaign figures.
//!
//! # Features
//!
//! - **Frame Scheduler**: request/cancel one-shot frame callbacks, ticked by the host
//! - **Easing**: exponential ease-out and a few companions
//! - **Animated Counters**: numbers that glide to each new target without jumps
//! - **Drop Cancels**: a dropped counter never leaves a frame callback behind

pub mod counter;
pub mod easing;
pub mod scheduler;

pub use counter::{AnimatedCounter, CounterFormat, DEFAULT_DURATION_MS};
pub use easing::Easing;
pub use scheduler::{FrameCallback, FrameId, FrameScheduler, SchedulerHandle};
