use crate::error::LensError;
use crate::geometry::LensUniforms;
use crate::render::RenderCtx;
use crate::renderer::LensDraw;

use super::common::{clamp_scissor, create_checked_shader, linear_clamp_sampler, min_binding_size, UniformSlots, OVERLAY_FORMAT};

/// The refraction pass: one scissored draw per lens into the overlay.
///
/// Blending is off. Lenses are independent and each fragment belongs to at
/// most one draw after scissoring, so later lenses simply replace earlier
/// ones where they overlap.
pub struct GlassPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniforms: UniformSlots<LensUniforms>,

    bind_group: Option<wgpu::BindGroup>,
    // (uniform buffer generation, snapshot texture generation)
    bound: (u64, u64),
}

impl GlassPipeline {
    pub fn new(device: &wgpu::Device) -> Result<Self, LensError> {
        let shader =
            create_checked_shader(device, "liquid glass shader", include_str!("shaders/glass.wgsl"))?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("liquid glass bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: Some(min_binding_size::<LensUniforms>()),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("liquid glass pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("liquid glass pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: OVERLAY_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
            sampler: linear_clamp_sampler(device, "liquid glass sampler"),
            uniforms: UniformSlots::new("liquid glass uniforms"),
            bind_group: None,
            bound: (u64::MAX, u64::MAX),
        })
    }

    /// Clears `overlay` to transparent and draws every lens into it.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        overlay: &wgpu::TextureView,
        canvas: (u32, u32),
        snapshot: (&wgpu::TextureView, u64),
        draws: &[LensDraw],
    ) {
        self.uniforms.begin_frame();
        let blocks: Vec<LensUniforms> = draws.iter().map(|d| d.uniforms).collect();
        let offsets = self.uniforms.push(ctx.device, ctx.queue, &blocks);
        self.ensure_bindings(ctx, snapshot);

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("liquid glass pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: overlay,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some(bind_group) = self.bind_group.as_ref() else { return; };
        rpass.set_pipeline(&self.pipeline);

        for (draw, offset) in draws.iter().zip(offsets) {
            let Some((x, y, w, h)) = clamp_scissor(draw.scissor, canvas) else { continue; };
            rpass.set_scissor_rect(x, y, w, h);
            rpass.set_bind_group(0, bind_group, &[offset]);
            rpass.draw(0..6, 0..1);
        }
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>, snapshot: (&wgpu::TextureView, u64)) {
        let key = (self.uniforms.generation(), snapshot.1);
        if self.bind_group.is_some() && self.bound == key {
            return;
        }
        let Some(ubo) = self.uniforms.buffer() else { return; };

        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("liquid glass bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: ubo,
                        offset: 0,
                        size: Some(min_binding_size::<LensUniforms>()),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(snapshot.0),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }));
        self.bound = key;
    }
}
