//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Everything takes an explicit `Instant`, so the lens core can be driven by
//! either the runtime clock or a test.
//!
//! - `FrameClock`: one per window (or per render loop), `tick()` once per frame
//! - `Tween`: fixed-duration interpolation used by reveal fades and tilt resets

mod frame_clock;
mod tween;

pub use frame_clock::{FrameClock, FrameTime};
pub use tween::{Easing, Tween};
