use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;

/// Immutable raster of the snapshot root.
///
/// Replaced wholesale on every successful full capture. Pixels are shared
/// (`Arc`) so the texture upload queue and the dynamic-patch compositor can
/// hold the same buffer without copying.
#[derive(Debug, Clone)]
pub struct SnapshotImage {
    pub pixels: Arc<RgbaImage>,
    /// Texture pixels per CSS pixel used for this capture.
    pub scale: f32,
    pub captured_at: Instant,
    pub generation: u64,
}

impl SnapshotImage {
    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}
