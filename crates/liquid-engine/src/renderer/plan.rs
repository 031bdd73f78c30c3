use crate::coords::PixelRect;
use crate::geometry::LensUniforms;
use crate::lens::{LensHandle, MirrorTransform};

/// One glass draw: the lens quad is built from `uniforms.rect`, fragments
/// outside `scissor` are discarded.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LensDraw {
    pub handle: LensHandle,
    pub scissor: PixelRect,
    pub uniforms: LensUniforms,
}

/// An active tilt mirror.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MirrorDraw {
    pub handle: LensHandle,
    pub transform: MirrorTransform,
}

/// Everything the GPU side needs for one frame.
///
/// Order of execution: clear the overlay, run `draws` in order, copy the
/// overlay into the mirror texture when `mirrors` is non-empty, clear every
/// rectangle in `mirror_clears`, present.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    /// Seconds since the renderer started; drives the specular highlights.
    pub time: f32,
    /// Overlay size in device pixels.
    pub canvas: (u32, u32),
    /// Canvas pixels per CSS px: the device ratio, capped at 2.
    pub scale: f32,
    pub draws: Vec<LensDraw>,
    pub mirror_clears: Vec<PixelRect>,
    pub mirrors: Vec<MirrorDraw>,
    /// Overlay opacity from the reveal fade.
    pub overlay_opacity: f32,
    /// False while a snapshot capture hides the overlay.
    pub overlay_visible: bool,
}

impl FramePlan {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}
