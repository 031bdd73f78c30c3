//! Pure coordinate transforms and shader uniform computation.
//!
//! Nothing in here touches the host or the GPU; the renderer feeds in
//! rectangles and options and gets back device rectangles, texture
//! rectangles and uniform blocks.

mod perspective;
mod spaces;
mod uniforms;

pub use spaces::{clamp_dpr, device_rect, mirror_clear_rect, scissor_rect, texture_rect, uv_bounds, MIRROR_CLEAR_EXPAND};
pub use perspective::{flat_clip_matrix, mirror_clip_matrix, project};
pub use uniforms::{LensUniforms, UniformInputs};
