use bytemuck::{Pod, Zeroable};

use crate::coords::Rect;

/// Per-lens uniform block of the glass shader.
///
/// Layout matches `LensUniforms` in `glass.wgsl`: two `vec4`, two `vec2`, then
/// scalars. 96 bytes, no implicit padding.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct LensUniforms {
    /// Lens rectangle on the canvas in device pixels (x, y, w, h).
    pub rect: [f32; 4],
    /// Lens rectangle inside the snapshot texture, normalized.
    pub bounds: [f32; 4],
    pub canvas_size: [f32; 2],
    pub texture_size: [f32; 2],
    pub refraction: f32,
    pub bevel_depth: f32,
    pub bevel_width: f32,
    /// Frost radius; 0 disables the stochastic blur.
    pub frost: f32,
    /// Corner radius in device pixels.
    pub radius: f32,
    /// Seconds since the renderer started.
    pub time: f32,
    /// Tilt angles in degrees.
    pub tilt_x: f32,
    pub tilt_y: f32,
    pub magnify: f32,
    pub reveal_progress: f32,
    pub reveal_fade: u32,
    pub specular: u32,
}

/// Everything a lens contributes to its uniform block.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UniformInputs {
    pub device_rect: Rect,
    pub uv_bounds: [f32; 4],
    pub canvas: (u32, u32),
    pub texture: (u32, u32),
    pub refraction: f32,
    pub bevel_depth: f32,
    pub bevel_width: f32,
    pub frost: f32,
    pub radius_device: f32,
    pub time: f32,
    pub tilt: (f32, f32),
    pub magnify: f32,
    pub reveal_progress: f32,
    pub reveal_fade: bool,
    pub specular: bool,
}

impl LensUniforms {
    pub fn from_inputs(i: &UniformInputs) -> Self {
        let r = i.device_rect;
        Self {
            rect: [r.origin.x, r.origin.y, r.size.x, r.size.y],
            bounds: i.uv_bounds,
            canvas_size: [i.canvas.0 as f32, i.canvas.1 as f32],
            texture_size: [i.texture.0 as f32, i.texture.1 as f32],
            refraction: i.refraction,
            bevel_depth: i.bevel_depth,
            bevel_width: i.bevel_width,
            frost: i.frost,
            radius: i.radius_device,
            time: i.time,
            tilt_x: i.tilt.0,
            tilt_y: i.tilt.1,
            magnify: i.magnify,
            reveal_progress: i.reveal_progress.clamp(0.0, 1.0),
            reveal_fade: i.reveal_fade as u32,
            specular: i.specular as u32,
        }
    }
}
