//! Per-frame driver.
//!
//! `Renderer` ties the snapshot store, texture bookkeeping, dynamic tracker
//! and lens registry together and turns each frame into a `FramePlan`: the
//! GPU-free description of what the glass pipeline draws.

mod config;
mod driver;
mod plan;

pub use config::RendererConfig;
pub use driver::{DynamicTarget, Renderer};
pub use plan::{FramePlan, LensDraw, MirrorDraw};
