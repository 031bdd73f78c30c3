//! Texture Manager.
//!
//! CPU-side bookkeeping for the single shared snapshot texture. Writes are
//! validated and clipped here and queued in submission order; the GPU layer
//! drains the queue once per frame and replays it with `Queue::write_texture`.

mod manager;

pub use manager::{TextureManager, TextureWrite};
