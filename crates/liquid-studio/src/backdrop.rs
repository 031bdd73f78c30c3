//! The page as the window shows it, underneath the glass overlay.
//!
//! The whole document lives in one texture; scrolling only moves the sampled
//! window. Elements that animate are repainted in place every frame.

use liquid_engine::coords::{PixelRect, Rect, Vec2};
use liquid_engine::geometry::{clamp_dpr, flat_clip_matrix};
use liquid_engine::host::ElementId;
use liquid_engine::lens::ShadowCompanion;
use liquid_engine::render::{BlitDraw, BlitPipeline, RenderCtx, RenderTarget, OVERLAY_FORMAT};

use crate::page::Page;

/// Extra spread of a drop shadow around its lens, CSS px.
const SHADOW_SPREAD: f32 = 14.0;
const SHADOW_OFFSET_Y: f32 = 10.0;
const SHADOW_STRENGTH: f32 = 0.35;
const SHADOW_TEXTURE: u32 = 64;

pub struct Backdrop {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
    /// Texture pixels per CSS px.
    scale: f32,
    /// Document size and dpr the texture was painted for.
    painted_for: (f32, f32, f32),
    shadow: wgpu::BindGroup,
}

impl Backdrop {
    pub fn new(ctx: &RenderCtx<'_>, blit: &BlitPipeline, page: &Page) -> Self {
        let (texture, size, scale) = paint_full(ctx, page);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = blit.texture_bind_group(ctx.device, &view);
        let shadow = shadow_bind_group(ctx, blit);
        Self {
            texture,
            bind_group,
            size,
            scale,
            painted_for: page_key(page),
            shadow,
        }
    }

    /// Repaints the whole texture after a relayout, otherwise only `live`
    /// elements.
    pub fn sync(&mut self, ctx: &RenderCtx<'_>, blit: &BlitPipeline, page: &Page, live: &[ElementId]) {
        if page_key(page) != self.painted_for {
            let (texture, size, scale) = paint_full(ctx, page);
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            self.bind_group = blit.texture_bind_group(ctx.device, &view);
            self.texture = texture;
            self.size = size;
            self.scale = scale;
            self.painted_for = page_key(page);
            log::debug!("backdrop repainted at {}x{}", size.0, size.1);
            return;
        }

        for id in live {
            let Some(el) = page.element(*id) else { continue; };
            let Some(px) = self.pixel_rect(el.rect) else { continue; };
            let region = Rect::new(
                px.x as f32 / self.scale,
                px.y as f32 / self.scale,
                px.width as f32 / self.scale,
                px.height as f32 / self.scale,
            );
            let img = page.paint_live(region, self.scale);
            let (x, y) = (px.x as u32, px.y as u32);
            let w = img.width().min(self.size.0 - x);
            let h = img.height().min(self.size.1 - y);
            if w == 0 || h == 0 {
                continue;
            }
            write_rgba(ctx, &self.texture, (x, y), (w, h), img.width(), img.as_raw());
        }
    }

    /// Document rectangle in texture pixels, clipped to the texture.
    fn pixel_rect(&self, r: Rect) -> Option<PixelRect> {
        let x0 = (r.origin.x * self.scale).floor().max(0.0);
        let y0 = (r.origin.y * self.scale).floor().max(0.0);
        let x1 = (r.right() * self.scale).ceil().min(self.size.0 as f32);
        let y1 = (r.bottom() * self.scale).ceil().min(self.size.1 as f32);
        (x1 > x0 && y1 > y0).then(|| PixelRect {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    /// Draws the visible part of the document, then the shadows, onto the
    /// cleared surface.
    pub fn draw(
        &self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        blit: &mut BlitPipeline,
        scroll: f32,
        shadows: &[ShadowCompanion],
    ) {
        let vp = ctx.viewport;
        let (tw, th) = (self.size.0.max(1) as f32, self.size.1.max(1) as f32);
        let page = BlitDraw {
            uv: [0.0, scroll * self.scale / th, vp.width * self.scale / tw, vp.height * self.scale / th],
            ..BlitDraw::fullscreen(vp, 1.0)
        };

        let mvp = flat_clip_matrix(vp);
        let shadow_draws: Vec<BlitDraw> = shadows
            .iter()
            .filter(|s| s.opacity > 0.0)
            .map(|s| BlitDraw {
                mvp,
                rect: s.rect.expand(SHADOW_SPREAD).translate(Vec2::new(0.0, SHADOW_OFFSET_Y)),
                uv: [0.0, 0.0, 1.0, 1.0],
                radius: s.radius + SHADOW_SPREAD,
                opacity: s.opacity * SHADOW_STRENGTH,
            })
            .collect();

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("studio backdrop pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        blit.draw(ctx, &mut rpass, &self.bind_group, &[page]);
        blit.draw(ctx, &mut rpass, &self.shadow, &shadow_draws);
    }
}

fn page_key(page: &Page) -> (f32, f32, f32) {
    (page.viewport().width, page.height(), page.dpr())
}

/// Texture scale for the whole document: the device ratio, reduced until
/// both sides fit the GPU limit.
fn backdrop_scale(width: f32, height: f32, dpr: f32, max_dim: u32) -> f32 {
    let max = max_dim as f32;
    clamp_dpr(dpr).min(max / width.max(1.0)).min(max / height.max(1.0))
}

fn paint_full(ctx: &RenderCtx<'_>, page: &Page) -> (wgpu::Texture, (u32, u32), f32) {
    let doc = Rect::new(0.0, 0.0, page.viewport().width, page.height());
    let max_dim = ctx.device.limits().max_texture_dimension_2d;
    let scale = backdrop_scale(doc.size.x, doc.size.y, page.dpr(), max_dim);

    let img = page.paint_live(doc, scale);
    let size = img.dimensions();
    let texture = create_texture(ctx, "studio backdrop", size);
    write_rgba(ctx, &texture, (0, 0), size, size.0, img.as_raw());
    (texture, size, scale)
}

fn shadow_bind_group(ctx: &RenderCtx<'_>, blit: &BlitPipeline) -> wgpu::BindGroup {
    let n = SHADOW_TEXTURE;
    let img = image::RgbaImage::from_fn(n, n, |x, y| {
        let edge = |i: u32| {
            let t = (i as f32 + 0.5) / n as f32;
            let d = t.min(1.0 - t) / 0.4;
            let s = d.clamp(0.0, 1.0);
            s * s * (3.0 - 2.0 * s)
        };
        // Black, premultiplied.
        image::Rgba([0, 0, 0, (edge(x) * edge(y) * 255.0).round() as u8])
    });
    let texture = create_texture(ctx, "studio shadow", (n, n));
    write_rgba(ctx, &texture, (0, 0), (n, n), n, img.as_raw());
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    blit.texture_bind_group(ctx.device, &view)
}

fn create_texture(ctx: &RenderCtx<'_>, label: &'static str, size: (u32, u32)) -> wgpu::Texture {
    ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d { width: size.0.max(1), height: size.1.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OVERLAY_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

/// `data` rows are `row_pixels` wide; only the leading `size` block is
/// copied.
fn write_rgba(
    ctx: &RenderCtx<'_>,
    texture: &wgpu::Texture,
    origin: (u32, u32),
    size: (u32, u32),
    row_pixels: u32,
    data: &[u8],
) {
    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: origin.0, y: origin.1, z: 0 },
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * row_pixels),
            rows_per_image: Some(size.1),
        },
        wgpu::Extent3d { width: size.0, height: size.1, depth_or_array_layers: 1 },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_follows_dpr_within_limits() {
        assert_eq!(backdrop_scale(1000.0, 2000.0, 1.5, 8192), 1.5);
        assert_eq!(backdrop_scale(1000.0, 2000.0, 3.0, 8192), 2.0);
    }

    #[test]
    fn tall_documents_are_scaled_down_to_fit() {
        let s = backdrop_scale(1000.0, 16384.0, 2.0, 8192);
        assert_eq!(s, 0.5);
        assert!((16384.0 * s) as u32 <= 8192);
    }
}
