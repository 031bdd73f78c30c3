use crate::geometry::texture_rect;
use crate::host::SceneHost;
use crate::texture::TextureManager;

use super::compose::{compose_video, crop_padded};
use super::tracker::PatchFrame;

/// Patches the current frame of every eligible video into the texture.
///
/// Videos at or above the lens layer, ignored videos and videos without a
/// decoded frame are skipped. Returns the number of patches written.
pub fn update_videos<H: SceneHost>(host: &H, texture: &mut TextureManager, frame: &PatchFrame<'_>) -> usize {
    if !texture.is_ready() {
        return 0;
    }
    let scale = frame.base.scale;
    let mut written = 0;

    for &v in frame.videos {
        if host.effective_z(v) >= frame.max_lens_z || host.is_ignored(v) {
            continue;
        }
        let Some(img) = host.video_frame(v) else { continue; };
        let Some(rect) = host.bounding_rect(v) else { continue; };

        let dst = texture_rect(rect, frame.snap_origin, scale);
        if dst.is_empty() {
            continue;
        }
        let radii = host.style(v).radii.scaled(scale);
        let patch = compose_video(crop_padded(&frame.base.pixels, dst), &img, radii);
        if texture.patch_region(dst, &patch).is_some() {
            written += 1;
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::coords::{PixelRect, Rect, Vec2};
    use crate::host::testing::FakeHost;
    use crate::snapshot::SnapshotImage;
    use crate::texture::TextureWrite;

    fn setup() -> (FakeHost, TextureManager, SnapshotImage) {
        let pixels = Arc::new(RgbaImage::from_pixel(200, 200, Rgba([0, 0, 0, 255])));
        let mut tm = TextureManager::new();
        tm.upload_full(pixels.clone());
        tm.drain_writes();
        let snap = SnapshotImage { pixels, scale: 2.0, captured_at: Instant::now(), generation: 1 };
        (FakeHost::new(100.0, 100.0), tm, snap)
    }

    fn frame<'a>(snap: &'a SnapshotImage, videos: &'a [crate::host::ElementId]) -> PatchFrame<'a> {
        PatchFrame {
            base: snap,
            snap_origin: Vec2::zero(),
            lens_rects: &[],
            max_lens_z: 5,
            videos,
            scrolling: false,
        }
    }

    #[test]
    fn ready_video_is_patched_at_scaled_rect() {
        let (mut host, mut tm, snap) = setup();
        let v = host.add_video(Rect::new(10.0, 10.0, 20.0, 10.0), Some(RgbaImage::new(4, 2)));
        let vids = [v];
        assert_eq!(update_videos(&host, &mut tm, &frame(&snap, &vids)), 1);
        match &tm.drain_writes()[0] {
            TextureWrite::Region { dst, .. } => assert_eq!(*dst, PixelRect::new(20, 20, 40, 20)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unready_or_covering_videos_are_skipped() {
        let (mut host, mut tm, snap) = setup();
        let pending = host.add_video(Rect::new(0.0, 0.0, 10.0, 10.0), None);
        let above = host.add_video(Rect::new(0.0, 0.0, 10.0, 10.0), Some(RgbaImage::new(1, 1)));
        host.el_mut(above).z = 5;
        let vids = [pending, above];
        assert_eq!(update_videos(&host, &mut tm, &frame(&snap, &vids)), 0);
        assert!(!tm.has_pending_writes());
    }
}
