//! Environment contracts.
//!
//! The lens core never touches a document directly. Everything it needs from
//! the embedding page (layout queries, computed style, rasterization) comes
//! through the traits in this module. Hosts answer synchronously, except for
//! rasterization, which completes through a pull-based queue.

mod overlay;
mod raster;
mod scene;

#[cfg(test)]
pub(crate) mod testing;

pub use overlay::{HiddenOverlay, OverlayVisibility};
pub use raster::{RasterDone, RasterError, RasterJob, RasterOptions, RasterTag, Rasterizer};
pub use scene::{BorderRadius, ElementId, ElementStyle, SceneHost};
