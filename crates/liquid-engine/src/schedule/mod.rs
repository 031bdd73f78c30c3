//! Frame scheduling.
//!
//! Who drives frames (`TickSource`), scroll detection with the every-other-frame
//! throttle, and the resize debounce. Nothing here reads a clock on its own;
//! callers pass `Instant`s in.

mod debounce;
mod scroll;
mod sync;

pub use debounce::{Debounce, RESIZE_DEBOUNCE};
pub use scroll::{ScrollTracker, SCROLL_SETTLE};
pub use sync::{Scheduler, ScrollDriver, SyncConfig, TickSource};
