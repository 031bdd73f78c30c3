//! The contract between the window runtime and the program hosting the glass.
//!
//! Apps implement [`App`]; each redraw they receive a [`FrameCtx`] carrying
//! the GPU, input and timing of one window.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
