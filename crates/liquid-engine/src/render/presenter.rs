use crate::coords::{Rect, Viewport};
use crate::error::LensError;
use crate::geometry::mirror_clip_matrix;
use crate::render::{RenderCtx, RenderTarget};
use crate::renderer::{FramePlan, MirrorDraw};
use crate::texture::TextureWrite;

use super::blit::{BlitDraw, BlitPipeline};
use super::common::OVERLAY_FORMAT;
use super::glass::GlassPipeline;
use super::snapshot_texture::SnapshotTexture;

/// Owns every GPU resource of the glass overlay and executes [`FramePlan`]s.
///
/// Per frame:
/// 1. [`GlassPresenter::begin_frame`]
/// 2. optional host drawing through [`GlassPresenter::blit_mut`]
/// 3. [`GlassPresenter::upload`] with the drained texture writes
/// 4. [`GlassPresenter::render`]
pub struct GlassPresenter {
    glass: GlassPipeline,
    blit: BlitPipeline,
    snapshot: SnapshotTexture,
    overlay: Option<CanvasTexture>,
    mirror: Option<CanvasTexture>,
}

struct CanvasTexture {
    texture: wgpu::Texture,
    size: (u32, u32),
    bind_group: wgpu::BindGroup,
    view: wgpu::TextureView,
}

impl GlassPresenter {
    /// Compiles both pipelines. Shader errors are fatal here and nowhere else.
    pub fn new(device: &wgpu::Device) -> Result<Self, LensError> {
        Ok(Self {
            glass: GlassPipeline::new(device)?,
            blit: BlitPipeline::new(device)?,
            snapshot: SnapshotTexture::new(),
            overlay: None,
            mirror: None,
        })
    }

    pub fn begin_frame(&mut self) {
        self.blit.begin_frame();
    }

    #[inline]
    pub fn blit(&self) -> &BlitPipeline {
        &self.blit
    }

    #[inline]
    pub fn blit_mut(&mut self) -> &mut BlitPipeline {
        &mut self.blit
    }

    pub fn upload(&mut self, ctx: &RenderCtx<'_>, writes: Vec<TextureWrite>) {
        if !writes.is_empty() {
            self.snapshot.apply(ctx, writes);
        }
    }

    /// Renders the lenses into the overlay and composites it over `target`.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, plan: &FramePlan) {
        let Some(snapshot_view) = self.snapshot.view() else { return; };
        let snapshot = (snapshot_view, self.snapshot.generation());
        let (w, h) = plan.canvas;
        if w == 0 || h == 0 {
            return;
        }

        let overlay = ensure_canvas(
            &mut self.overlay,
            ctx,
            &self.blit,
            plan.canvas,
            "liquid overlay",
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        );
        self.glass.render(ctx, target.encoder, &overlay.view, plan.canvas, snapshot, &plan.draws);

        let mirrored = !plan.mirrors.is_empty();
        if mirrored {
            let mirror = ensure_canvas(
                &mut self.mirror,
                ctx,
                &self.blit,
                plan.canvas,
                "liquid mirror",
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            );
            target.encoder.copy_texture_to_texture(
                overlay.texture.as_image_copy(),
                mirror.texture.as_image_copy(),
                wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
            );
            self.blit.clear_rects(ctx, target.encoder, &overlay.view, plan.canvas, &plan.mirror_clears);
        } else {
            self.mirror = None;
        }

        if !plan.overlay_visible {
            return;
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("liquid present pass"),
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

        let Some(overlay) = self.overlay.as_ref() else { return; };
        self.blit.draw(
            ctx,
            &mut rpass,
            &overlay.bind_group,
            &[BlitDraw::fullscreen(ctx.viewport, plan.overlay_opacity)],
        );

        if let Some(mirror) = self.mirror.as_ref().filter(|_| mirrored) {
            let draws: Vec<BlitDraw> = plan
                .mirrors
                .iter()
                .map(|m| mirror_blit(m, ctx.viewport, plan))
                .collect();
            self.blit.draw(ctx, &mut rpass, &mirror.bind_group, &draws);
        }
    }
}

fn ensure_canvas<'a>(
    slot: &'a mut Option<CanvasTexture>,
    ctx: &RenderCtx<'_>,
    blit: &BlitPipeline,
    size: (u32, u32),
    label: &'static str,
    usage: wgpu::TextureUsages,
) -> &'a CanvasTexture {
    if slot.as_ref().is_some_and(|c| c.size != size) {
        *slot = None;
    }
    slot.get_or_insert_with(|| {
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d { width: size.0, height: size.1, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OVERLAY_FORMAT,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = blit.texture_bind_group(ctx.device, &view);
        CanvasTexture { texture, size, bind_group, view }
    })
}

/// Quad of one mirror: the frozen lens rect in CSS px, sampling the same
/// region of the mirror copy, seen through the tilt perspective.
///
/// The mirror copy has the overlay's size, so UVs use the plan's scale and
/// not the window's.
fn mirror_blit(m: &MirrorDraw, viewport: Viewport, plan: &FramePlan) -> BlitDraw {
    let t = m.transform;
    BlitDraw {
        mvp: mirror_clip_matrix(&t, viewport),
        rect: t.clip,
        uv: uv_of(t.clip, plan.scale, plan.canvas),
        radius: t.radius,
        opacity: plan.overlay_opacity,
    }
}

fn uv_of(r: Rect, scale: f32, canvas: (u32, u32)) -> [f32; 4] {
    let (cw, ch) = (canvas.0.max(1) as f32, canvas.1.max(1) as f32);
    [
        r.origin.x * scale / cw,
        r.origin.y * scale / ch,
        r.size.x * scale / cw,
        r.size.y * scale / ch,
    ]
}
