use crate::render::RenderCtx;
use crate::texture::TextureWrite;

/// GPU copy of the shared snapshot texture.
///
/// Replays the writes queued by `TextureManager` in order. A full upload with
/// new dimensions replaces the texture and bumps `generation`.
#[derive(Default)]
pub struct SnapshotTexture {
    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,
    size: (u32, u32),
    generation: u64,
}

impl SnapshotTexture {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.view.as_ref()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn apply(&mut self, ctx: &RenderCtx<'_>, writes: Vec<TextureWrite>) {
        for write in writes {
            match write {
                TextureWrite::Full(image) => {
                    let (w, h) = image.dimensions();
                    self.ensure_size(ctx, w, h);
                    self.write(ctx, 0, 0, w, h, image.as_raw());
                }
                TextureWrite::Region { dst, pixels } => {
                    if dst.x < 0 || dst.y < 0 {
                        log::warn!("dropping region write at negative origin {dst:?}");
                        continue;
                    }
                    self.write(ctx, dst.x as u32, dst.y as u32, dst.width, dst.height, pixels.as_raw());
                }
            }
        }
    }

    fn ensure_size(&mut self, ctx: &RenderCtx<'_>, w: u32, h: u32) {
        if self.texture.is_some() && self.size == (w, h) {
            return;
        }

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("liquid snapshot texture"),
            size: wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.texture = Some(texture);
        self.size = (w, h);
        self.generation += 1;
    }

    fn write(&self, ctx: &RenderCtx<'_>, x: u32, y: u32, w: u32, h: u32, bytes: &[u8]) {
        let Some(texture) = self.texture.as_ref() else { return; };
        if w == 0 || h == 0 || x + w > self.size.0 || y + h > self.size.1 {
            log::warn!("texture write {w}x{h} at ({x}, {y}) outside {:?}", self.size);
            return;
        }

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );
    }
}
