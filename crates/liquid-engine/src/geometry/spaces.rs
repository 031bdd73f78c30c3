use crate::coords::{PixelRect, Rect, Vec2};

/// Device pixels the mirror clear grows past the lens on each side.
pub const MIRROR_CLEAR_EXPAND: u32 = 2;

/// Device pixel ratio used by the overlay: capped at 2, 1 when unknown.
#[inline]
pub fn clamp_dpr(dpr: f32) -> f32 {
    if dpr.is_finite() && dpr > 0.0 { dpr.min(2.0) } else { 1.0 }
}

/// Maps a viewport-relative CSS rectangle into snapshot texture pixels.
///
/// `snap_origin` is the snapshot root's viewport-relative origin, `scale` the
/// capture scale of the current snapshot.
pub fn texture_rect(rect: Rect, snap_origin: Vec2, scale: f32) -> PixelRect {
    let x = ((rect.origin.x - snap_origin.x) * scale).round();
    let y = ((rect.origin.y - snap_origin.y) * scale).round();
    let w = (rect.size.x * scale).round().max(0.0);
    let h = (rect.size.y * scale).round().max(0.0);
    PixelRect::new(x as i32, y as i32, w as u32, h as u32)
}

/// Normalized `(left, top, width, height)` of `rect` inside the texture.
pub fn uv_bounds(rect: Rect, snap_origin: Vec2, scale: f32, texture_size: (u32, u32)) -> [f32; 4] {
    let tw = texture_size.0.max(1) as f32;
    let th = texture_size.1.max(1) as f32;
    [
        (rect.origin.x - snap_origin.x) * scale / tw,
        (rect.origin.y - snap_origin.y) * scale / th,
        rect.size.x * scale / tw,
        rect.size.y * scale / th,
    ]
}

/// Lens rectangle on the overlay canvas in device pixels.
///
/// The visual viewport offset compensates pinch-zoom panning and overscroll.
#[inline]
pub fn device_rect(rect: Rect, visual_offset: Vec2, dpr: f32) -> Rect {
    rect.translate(visual_offset).scale(dpr)
}

/// Integer scissor covering `rect`, clipped to the canvas.
pub fn scissor_rect(rect: Rect, canvas: (u32, u32)) -> Option<PixelRect> {
    if !rect.is_finite() || rect.is_empty() {
        return None;
    }
    let x0 = rect.origin.x.floor().max(i32::MIN as f32) as i64;
    let y0 = rect.origin.y.floor().max(i32::MIN as f32) as i64;
    let x1 = rect.right().ceil().min(i32::MAX as f32) as i64;
    let y1 = rect.bottom().ceil().min(i32::MAX as f32) as i64;
    let w = (x1 - x0).clamp(0, u32::MAX as i64) as u32;
    let h = (y1 - y0).clamp(0, u32::MAX as i64) as u32;
    PixelRect::new(x0 as i32, y0 as i32, w, h)
        .clip_to(canvas.0, canvas.1)
        .map(|c| c.dst)
}

/// Region of the canvas cleared under an active tilt mirror. Placed like
/// [`device_rect`].
pub fn mirror_clear_rect(rect: Rect, visual_offset: Vec2, dpr: f32, canvas: (u32, u32)) -> Option<PixelRect> {
    let dev = device_rect(rect, visual_offset, dpr);
    let pad = MIRROR_CLEAR_EXPAND as f32;
    let x = (dev.origin.x.round() - pad).max(0.0);
    let y = (dev.origin.y.round() - pad).max(0.0);
    if x >= canvas.0 as f32 || y >= canvas.1 as f32 {
        return None;
    }
    let w = (dev.size.x.round() + 2.0 * pad).min(canvas.0 as f32 - x);
    let h = (dev.size.y.round() + 2.0 * pad).min(canvas.1 as f32 - y);
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    Some(PixelRect::new(x as i32, y as i32, w as u32, h as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── dpr ───────────────────────────────────────────────────────────────

    #[test]
    fn dpr_is_capped_and_defaulted() {
        assert_eq!(clamp_dpr(3.0), 2.0);
        assert_eq!(clamp_dpr(1.5), 1.5);
        assert_eq!(clamp_dpr(0.0), 1.0);
        assert_eq!(clamp_dpr(f32::NAN), 1.0);
    }

    // ── texture space ─────────────────────────────────────────────────────

    #[test]
    fn texture_rect_is_relative_to_snapshot_origin() {
        let r = Rect::new(110.0, 60.0, 20.0, 10.0);
        let t = texture_rect(r, Vec2::new(100.0, 50.0), 2.0);
        assert_eq!(t, PixelRect::new(20, 20, 40, 20));
    }

    #[test]
    fn scrolled_snapshot_origin_shifts_rect() {
        // Root scrolled up by 300 px: its origin is at y = -300.
        let t = texture_rect(Rect::new(0.0, 10.0, 5.0, 5.0), Vec2::new(0.0, -300.0), 1.0);
        assert_eq!(t.y, 310);
    }

    #[test]
    fn uv_bounds_normalize_by_texture() {
        let b = uv_bounds(Rect::new(50.0, 25.0, 100.0, 50.0), Vec2::zero(), 2.0, (400, 200));
        assert_eq!(b, [0.25, 0.25, 0.5, 0.5]);
    }

    // ── device space ──────────────────────────────────────────────────────

    #[test]
    fn device_rect_applies_visual_offset_then_dpr() {
        let d = device_rect(Rect::new(10.0, 10.0, 4.0, 4.0), Vec2::new(2.0, -1.0), 2.0);
        assert_eq!(d, Rect::new(24.0, 18.0, 8.0, 8.0));
    }

    #[test]
    fn scissor_is_clipped_to_canvas() {
        let s = scissor_rect(Rect::new(-5.5, 10.2, 20.0, 5.0), (100, 100)).unwrap();
        assert_eq!(s, PixelRect::new(0, 10, 15, 6));
        assert_eq!(scissor_rect(Rect::new(120.0, 0.0, 10.0, 10.0), (100, 100)), None);
    }

    #[test]
    fn mirror_clear_expands_and_clamps() {
        let c = mirror_clear_rect(Rect::new(10.0, 10.0, 20.0, 20.0), Vec2::zero(), 1.0, (100, 100)).unwrap();
        assert_eq!(c, PixelRect::new(8, 8, 24, 24));
        let edge = mirror_clear_rect(Rect::new(0.0, 90.0, 20.0, 20.0), Vec2::zero(), 1.0, (100, 100)).unwrap();
        assert_eq!(edge, PixelRect::new(0, 88, 24, 12));
    }

    #[test]
    fn mirror_clear_follows_visual_offset_like_the_lens() {
        let r = Rect::new(10.0, 10.0, 4.0, 4.0);
        let off = Vec2::new(2.0, -1.0);
        let lens = scissor_rect(device_rect(r, off, 2.0), (100, 100)).unwrap();
        let clear = mirror_clear_rect(r, off, 2.0, (100, 100)).unwrap();
        assert_eq!(lens, PixelRect::new(24, 18, 8, 8));
        assert_eq!(clear, PixelRect::new(22, 16, 12, 12));
    }
}
