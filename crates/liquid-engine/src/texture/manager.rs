use std::sync::Arc;

use image::{imageops, RgbaImage};

use crate::coords::PixelRect;

/// One pending write into the shared texture.
#[derive(Debug, Clone)]
pub enum TextureWrite {
    /// Replace the texture (size and content).
    Full(Arc<RgbaImage>),
    /// Overwrite a sub-rectangle; `pixels` is exactly `dst.width × dst.height`.
    Region { dst: PixelRect, pixels: RgbaImage },
}

#[derive(Debug, Default)]
pub struct TextureManager {
    size: Option<(u32, u32)>,
    writes: Vec<TextureWrite>,
    uploads: u64,
    patches: u64,
}

impl TextureManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texture dimensions; `None` until the first full upload.
    #[inline]
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.size.is_some()
    }

    #[inline]
    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    #[inline]
    pub fn patch_count(&self) -> u64 {
        self.patches
    }

    /// Replaces the texture with `image`. Queued patches are superseded.
    pub fn upload_full(&mut self, image: Arc<RgbaImage>) {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            log::warn!("ignoring empty full texture upload");
            return;
        }
        if self.size != Some((w, h)) {
            log::debug!("snapshot texture resized to {w}x{h}");
        }
        self.size = Some((w, h));
        self.writes.clear();
        self.writes.push(TextureWrite::Full(image));
        self.uploads += 1;
    }

    /// Writes `image` at `dst`, clipped to the texture and to the image.
    ///
    /// Returns the rectangle actually written, or `None` when nothing survives
    /// the clip or no full upload has happened yet.
    pub fn patch_region(&mut self, dst: PixelRect, image: &RgbaImage) -> Option<PixelRect> {
        let (tex_w, tex_h) = self.size?;

        let dst = PixelRect::new(
            dst.x,
            dst.y,
            dst.width.min(image.width()),
            dst.height.min(image.height()),
        );
        let clipped = dst.clip_to(tex_w, tex_h)?;
        let region = clipped.dst;

        let pixels = if clipped.src_x == 0
            && clipped.src_y == 0
            && region.width == image.width()
            && region.height == image.height()
        {
            image.clone()
        } else {
            imageops::crop_imm(image, clipped.src_x, clipped.src_y, region.width, region.height)
                .to_image()
        };

        self.writes.push(TextureWrite::Region { dst: region, pixels });
        self.patches += 1;
        Some(region)
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.writes.is_empty()
    }

    /// Takes the queued writes in submission order.
    pub fn drain_writes(&mut self) -> Vec<TextureWrite> {
        std::mem::take(&mut self.writes)
    }
}
