/// Viewport size in CSS pixels.
///
/// The overlay canvas always spans the full viewport; its device size is this
/// size multiplied by the clamped device pixel ratio.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Device pixel size of a full-viewport canvas at `dpr`, at least 1×1.
    #[inline]
    pub fn device_size(self, dpr: f32) -> (u32, u32) {
        let w = (self.width * dpr).round().max(1.0) as u32;
        let h = (self.height * dpr).round().max(1.0) as u32;
        (w, h)
    }
}
