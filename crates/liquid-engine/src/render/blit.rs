use bytemuck::{Pod, Zeroable};

use crate::coords::{PixelRect, Rect, Viewport};
use crate::error::LensError;
use crate::geometry::flat_clip_matrix;
use crate::render::RenderCtx;

use super::common::{
    clamp_scissor, create_checked_shader, linear_clamp_sampler, min_binding_size, premul_alpha_blend,
    UniformSlots, OVERLAY_FORMAT,
};

/// One textured quad.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlitDraw {
    /// Column-major clip matrix applied to `rect`.
    pub mvp: [[f32; 4]; 4],
    pub rect: Rect,
    /// Source rectangle, normalized (x, y, w, h).
    pub uv: [f32; 4],
    /// Corner radius in the units of `rect`.
    pub radius: f32,
    pub opacity: f32,
}

impl BlitDraw {
    /// Full-window quad showing the whole source.
    pub fn fullscreen(viewport: Viewport, opacity: f32) -> Self {
        Self {
            mvp: flat_clip_matrix(viewport),
            rect: Rect::new(0.0, 0.0, viewport.width, viewport.height),
            uv: [0.0, 0.0, 1.0, 1.0],
            radius: 0.0,
            opacity,
        }
    }

    fn uniform(&self) -> BlitUniform {
        let r = self.rect;
        BlitUniform {
            mvp: self.mvp,
            rect: [r.origin.x, r.origin.y, r.size.x, r.size.y],
            uv_scale: [self.uv[2], self.uv[3]],
            uv_offset: [self.uv[0], self.uv[1]],
            radius: self.radius.max(0.0),
            opacity: self.opacity.clamp(0.0, 1.0),
            _pad: [0.0; 2],
        }
    }
}

/// Textured-quad compositor for the window surface, plus a scissored
/// clear used to punch holes into the overlay.
///
/// Uniform slots are shared by every call in a frame; call
/// [`BlitPipeline::begin_frame`] once before the first draw.
pub struct BlitPipeline {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    clear_pipeline: wgpu::RenderPipeline,

    shader: wgpu::ShaderModule,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,

    uniforms: UniformSlots<BlitUniform>,
    uniform_bind_group: Option<wgpu::BindGroup>,
    bound_generation: u64,
}

impl BlitPipeline {
    pub fn new(device: &wgpu::Device) -> Result<Self, LensError> {
        let shader =
            create_checked_shader(device, "liquid blit shader", include_str!("shaders/blit.wgsl"))?;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("liquid blit uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(min_binding_size::<BlitUniform>()),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("liquid blit texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("liquid blit pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        let clear_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("liquid clear pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            immediate_size: 0,
        });

        let clear_pipeline = build_pipeline(
            device,
            "liquid clear pipeline",
            &clear_layout,
            &shader,
            "fs_clear",
            OVERLAY_FORMAT,
            None,
        );

        Ok(Self {
            pipeline_format: None,
            pipeline: None,
            clear_pipeline,
            shader,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            sampler: linear_clamp_sampler(device, "liquid blit sampler"),
            uniforms: UniformSlots::new("liquid blit uniforms"),
            uniform_bind_group: None,
            bound_generation: u64::MAX,
        })
    }

    pub fn begin_frame(&mut self) {
        self.uniforms.begin_frame();
    }

    /// Bind group for sampling `view` in [`BlitPipeline::draw`].
    pub fn texture_bind_group(&self, device: &wgpu::Device, view: &wgpu::TextureView) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("liquid blit texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Records `draws` sampling `source` into `rpass`, premultiplied-alpha
    /// blended over the target (which must have `ctx.surface_format`).
    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        rpass: &mut wgpu::RenderPass<'_>,
        source: &wgpu::BindGroup,
        draws: &[BlitDraw],
    ) {
        if draws.is_empty() {
            return;
        }
        self.ensure_pipeline(ctx);

        let blocks: Vec<BlitUniform> = draws.iter().map(BlitDraw::uniform).collect();
        let offsets = self.uniforms.push(ctx.device, ctx.queue, &blocks);
        self.ensure_bindings(ctx);

        let Some(pipeline) = self.pipeline.as_ref() else { return; };
        let Some(uniform_bg) = self.uniform_bind_group.as_ref() else { return; };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(1, source, &[]);
        for offset in offsets {
            rpass.set_bind_group(0, uniform_bg, &[offset]);
            rpass.draw(0..6, 0..1);
        }
    }

    /// Clears `rects` of an overlay-format target to transparent.
    pub fn clear_rects(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        target_size: (u32, u32),
        rects: &[PixelRect],
    ) {
        let scissors: Vec<_> = rects.iter().filter_map(|r| clamp_scissor(*r, target_size)).collect();
        if scissors.is_empty() {
            return;
        }

        let full = Viewport::new(target_size.0 as f32, target_size.1 as f32);
        let offsets = self
            .uniforms
            .push(ctx.device, ctx.queue, &[BlitDraw::fullscreen(full, 1.0).uniform()]);
        self.ensure_bindings(ctx);
        let (Some(offset), Some(uniform_bg)) = (offsets.first(), self.uniform_bind_group.as_ref()) else {
            return;
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("liquid mirror clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
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

        rpass.set_pipeline(&self.clear_pipeline);
        rpass.set_bind_group(0, uniform_bg, &[*offset]);
        for (x, y, w, h) in scissors {
            rpass.set_scissor_rect(x, y, w, h);
            rpass.draw(0..6, 0..1);
        }
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }
        self.pipeline = Some(build_pipeline(
            ctx.device,
            "liquid blit pipeline",
            &self.pipeline_layout,
            &self.shader,
            "fs_main",
            ctx.surface_format,
            Some(premul_alpha_blend()),
        ));
        self.pipeline_format = Some(ctx.surface_format);
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.uniform_bind_group.is_some() && self.bound_generation == self.uniforms.generation() {
            return;
        }
        let Some(ubo) = self.uniforms.buffer() else { return; };

        self.uniform_bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("liquid blit uniform bind group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: ubo,
                    offset: 0,
                    size: Some(min_binding_size::<BlitUniform>()),
                }),
            }],
        }));
        self.bound_generation = self.uniforms.generation();
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    label: &'static str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fs_entry: &'static str,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

// ── GPU types ─────────────────────────────────────────────────────────────

/// Uniform layout (112 bytes):
///
///  offset   0  mvp        mat4x4<f32>  (column-major)
///  offset  64  rect       vec4<f32>
///  offset  80  uv_scale   vec2<f32>
///  offset  88  uv_offset  vec2<f32>
///  offset  96  radius     f32
///  offset 100  opacity    f32
///  offset 104  _pad       vec2<f32>
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct BlitUniform {
    mvp: [[f32; 4]; 4],
    rect: [f32; 4],
    uv_scale: [f32; 2],
    uv_offset: [f32; 2],
    radius: f32,
    opacity: f32,
    _pad: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<BlitUniform>(), 112);
    }

    #[test]
    fn draw_uniform_swaps_uv_into_scale_and_offset() {
        let d = BlitDraw {
            uv: [0.25, 0.5, 0.1, 0.2],
            opacity: 3.0,
            radius: -4.0,
            ..BlitDraw::fullscreen(Viewport::new(100.0, 50.0), 1.0)
        };
        let u = d.uniform();
        assert_eq!(u.uv_offset, [0.25, 0.5]);
        assert_eq!(u.uv_scale, [0.1, 0.2]);
        assert_eq!(u.opacity, 1.0);
        assert_eq!(u.radius, 0.0);
        assert_eq!(u.rect, [0.0, 0.0, 100.0, 50.0]);
    }
}
