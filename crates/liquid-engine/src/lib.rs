//! Liquid glass engine.
//!
//! Renders refractive "glass" lenses over a host page. The page is
//! rasterized once into a shared snapshot texture; every lens samples that
//! texture through a refraction shader on a single overlay canvas, and
//! elements that change on their own are patched into the texture in place.
//!
//! Layering, bottom-up:
//! - `host`: contracts the embedding page implements (layout, style, raster)
//! - `snapshot`, `texture`, `dynamic`: keep the shared texture current
//! - `lens`, `geometry`, `schedule`: per-lens state and per-frame math
//! - `renderer`: the CPU driver that turns all of the above into a `FramePlan`
//! - `render`, `device`, `window`, `core`, `input`: wgpu/winit presentation

mod arena;

pub mod coords;
pub mod dynamic;
pub mod error;
pub mod geometry;
pub mod host;
pub mod lens;
pub mod renderer;
pub mod schedule;
pub mod snapshot;
pub mod texture;
pub mod time;

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod window;

pub use error::LensError;
pub use lens::{LensEvent, LensHandle, LensOptions};
pub use renderer::{DynamicTarget, FramePlan, Renderer, RendererConfig};
