//! CPU compositing of texture patches.
//!
//! All images are straight (non-premultiplied) RGBA8, like the snapshot.

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::coords::{Affine2, CornerRadii, PixelRect, Vec2};

use super::DynamicHandle;

/// A video frame placed inside a patch, in patch pixels.
#[derive(Debug, Clone)]
pub struct VideoLayer {
    pub x: f32,
    pub y: f32,
    pub width: u32,
    pub height: u32,
    pub frame: RgbaImage,
}

/// Inputs for one dynamic-node patch.
#[derive(Debug, Clone)]
pub struct ComposeJob {
    pub handle: DynamicHandle,
    /// Generation of the snapshot `base` was cut from.
    pub generation: u64,
    /// Unclipped texture rectangle the patch covers.
    pub dst: PixelRect,
    /// Base snapshot under `dst`, `dst.width × dst.height`.
    pub base: RgbaImage,
    pub videos: Vec<VideoLayer>,
    /// Latest raster of the element.
    pub capture: Arc<RgbaImage>,
    /// Computed transform, applied about the patch centre.
    pub transform: Affine2,
    pub opacity: f32,
}

#[derive(Debug, Clone)]
pub struct ComposedPatch {
    pub handle: DynamicHandle,
    pub generation: u64,
    pub dst: PixelRect,
    pub pixels: RgbaImage,
}

/// Base crop, then intersecting videos, then the element itself.
pub fn compose(job: ComposeJob) -> ComposedPatch {
    let ComposeJob { handle, generation, dst, mut base, videos, capture, transform, opacity } = job;
    let (w, h) = (dst.width, dst.height);
    if base.dimensions() != (w, h) {
        base = imageops::resize(&base, w.max(1), h.max(1), FilterType::Triangle);
    }

    for v in &videos {
        draw_scaled(&mut base, &v.frame, v.x, v.y, v.width, v.height);
    }

    let capture = fit(&capture, w, h);
    let cx = w as f32 * 0.5;
    let cy = h as f32 * 0.5;
    let about_centre = Affine2::translation(cx, cy)
        .then_apply(&transform)
        .then_apply(&Affine2::translation(-cx, -cy));
    draw_transformed(&mut base, &capture, about_centre, opacity);

    ComposedPatch { handle, generation, dst, pixels: base }
}

/// Video frame over the base crop, the frame clipped to the element's corners.
pub fn compose_video(mut base: RgbaImage, frame: &RgbaImage, radii: CornerRadii) -> RgbaImage {
    let (w, h) = base.dimensions();
    let mut frame = fit(frame, w, h).into_owned();
    if radii.any_positive() {
        clip_rounded(&mut frame, radii);
    }
    overlay_at(&mut base, &frame, 0, 0);
    base
}

/// Copies `rect` out of `src`; pixels outside `src` are transparent.
pub fn crop_padded(src: &RgbaImage, rect: PixelRect) -> RgbaImage {
    let mut out = RgbaImage::new(rect.width, rect.height);
    if let Some(c) = rect.clip_to(src.width(), src.height()) {
        let view = imageops::crop_imm(src, c.dst.x as u32, c.dst.y as u32, c.dst.width, c.dst.height)
            .to_image();
        imageops::replace(&mut out, &view, c.src_x as i64, c.src_y as i64);
    }
    out
}

/// Clears alpha outside a rounded rectangle spanning the whole image.
pub fn clip_rounded(img: &mut RgbaImage, radii: CornerRadii) {
    let (w, h) = (img.width() as f32, img.height() as f32);
    let max_r = w.min(h) * 0.5;
    let tl = radii.top_left.clamp(0.0, max_r);
    let tr = radii.top_right.clamp(0.0, max_r);
    let br = radii.bottom_right.clamp(0.0, max_r);
    let bl = radii.bottom_left.clamp(0.0, max_r);

    for (x, y, px) in img.enumerate_pixels_mut() {
        let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let (r, c) = if p.x < tl && p.y < tl {
            (tl, Vec2::new(tl, tl))
        } else if p.x > w - tr && p.y < tr {
            (tr, Vec2::new(w - tr, tr))
        } else if p.x > w - br && p.y > h - br {
            (br, Vec2::new(w - br, h - br))
        } else if p.x < bl && p.y > h - bl {
            (bl, Vec2::new(bl, h - bl))
        } else {
            continue;
        };
        if (p - c).length() > r {
            px[3] = 0;
        }
    }
}

fn fit(img: &RgbaImage, w: u32, h: u32) -> std::borrow::Cow<'_, RgbaImage> {
    if img.dimensions() == (w, h) || w == 0 || h == 0 {
        std::borrow::Cow::Borrowed(img)
    } else {
        std::borrow::Cow::Owned(imageops::resize(img, w, h, FilterType::Triangle))
    }
}

fn draw_scaled(dst: &mut RgbaImage, src: &RgbaImage, x: f32, y: f32, w: u32, h: u32) {
    if w == 0 || h == 0 {
        return;
    }
    let scaled = fit(src, w, h);
    overlay_at(dst, &scaled, x.round() as i64, y.round() as i64);
}

fn overlay_at(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let (dw, dh) = (dst.width() as i64, dst.height() as i64);
    for (sx, sy, s) in src.enumerate_pixels() {
        let (px, py) = (x + sx as i64, y + sy as i64);
        if px < 0 || py < 0 || px >= dw || py >= dh {
            continue;
        }
        blend_over(dst.get_pixel_mut(px as u32, py as u32), *s, 1.0);
    }
}

/// Source-over blend of `src` mapped into `dst` by `m` (src → dst pixels).
///
/// Nearest-neighbour sampling through the inverse; a singular transform
/// draws nothing.
pub fn draw_transformed(dst: &mut RgbaImage, src: &RgbaImage, m: Affine2, opacity: f32) {
    let opacity = if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { 1.0 };
    if opacity <= 0.0 || src.width() == 0 || src.height() == 0 {
        return;
    }
    if m.is_identity() && src.dimensions() == dst.dimensions() {
        for (d, s) in dst.pixels_mut().zip(src.pixels()) {
            blend_over(d, *s, opacity);
        }
        return;
    }
    let Some(inv) = m.inverse() else { return; };

    let (sw, sh) = (src.width() as f32, src.height() as f32);
    for (x, y, d) in dst.enumerate_pixels_mut() {
        let p = inv.apply(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
        if p.x < 0.0 || p.y < 0.0 || p.x >= sw || p.y >= sh {
            continue;
        }
        let s = *src.get_pixel(p.x as u32, p.y as u32);
        blend_over(d, s, opacity);
    }
}

#[inline]
fn blend_over(d: &mut Rgba<u8>, s: Rgba<u8>, opacity: f32) {
    let sa = s[3] as f32 / 255.0 * opacity;
    if sa <= 0.0 {
        return;
    }
    let da = d[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let sc = s[c] as f32;
        let dc = d[c] as f32;
        d[c] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    d[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
