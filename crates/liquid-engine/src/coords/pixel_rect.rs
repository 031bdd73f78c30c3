/// Integer rectangle in texture or device pixels (top-left origin).
///
/// The origin may be negative; an element partially above or left of the
/// snapshot root maps to a rectangle that starts outside the texture.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Result of clipping a `PixelRect` against a bounded surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ClippedRegion {
    /// Destination rectangle, fully inside `[0,w)×[0,h)`.
    pub dst: PixelRect,
    /// Offset into the source image of the first copied pixel.
    pub src_x: u32,
    pub src_y: u32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn right(self) -> i64 {
        self.x as i64 + self.width as i64
    }

    #[inline]
    pub fn bottom(self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Clips against `[0, bound_w) × [0, bound_h)`.
    ///
    /// Returns `None` when nothing remains. The source offset tells the caller
    /// how far into the patch image the surviving region starts.
    pub fn clip_to(self, bound_w: u32, bound_h: u32) -> Option<ClippedRegion> {
        if self.is_empty() || bound_w == 0 || bound_h == 0 {
            return None;
        }

        let x0 = (self.x as i64).max(0);
        let y0 = (self.y as i64).max(0);
        let x1 = self.right().min(bound_w as i64);
        let y1 = self.bottom().min(bound_h as i64);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(ClippedRegion {
            dst: PixelRect::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32),
            src_x: (x0 - self.x as i64) as u32,
            src_y: (y0 - self.y as i64) as u32,
        })
    }
}
