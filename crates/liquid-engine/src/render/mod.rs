//! GPU side of the glass overlay.
//!
//! Everything here consumes [`FramePlan`](crate::renderer::FramePlan)s and
//! texture writes produced by the CPU side and issues wgpu commands. Each
//! pipeline owns its GPU resources.
//!
//! Convention:
//! - the glass pass works in device pixels (top-left origin, +Y down)
//! - blits take CSS px geometry and an explicit clip matrix

mod blit;
mod common;
mod ctx;
mod glass;
mod presenter;
mod snapshot_texture;

pub use blit::{BlitDraw, BlitPipeline};
pub use common::{premul_alpha_blend, OVERLAY_FORMAT};
pub use ctx::{RenderCtx, RenderTarget};
pub use glass::GlassPipeline;
pub use presenter::GlassPresenter;
pub use snapshot_texture::SnapshotTexture;
