use image::RgbaImage;

use crate::dynamic::DynamicHandle;

use super::ElementId;

/// Identifies what a rasterization result belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RasterTag {
    /// Full snapshot of the snapshot root.
    Snapshot { generation: u64 },
    /// Patch capture of a tracked dynamic node.
    Dynamic { handle: DynamicHandle },
}

/// Parameters for one rasterization.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    /// Output pixels per CSS pixel.
    pub scale: f32,
    /// Area to rasterize in CSS pixels, starting at the root's origin.
    pub width: f32,
    pub height: f32,
    /// Elements (and their subtrees) left out of the raster.
    pub ignore: Vec<ElementId>,
    /// Leave out fixed-position elements.
    pub ignore_fixed: bool,
    /// Leave out subtrees carrying the ignore marker.
    pub ignore_marked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterJob {
    pub tag: RasterTag,
    pub root: ElementId,
    pub options: RasterOptions,
}

#[derive(Debug)]
pub struct RasterDone {
    pub tag: RasterTag,
    pub result: Result<RgbaImage, RasterError>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RasterError {
    #[error("rasterization failed: {0}")]
    Failed(String),

    #[error("rasterization produced an empty image")]
    Empty,
}

/// Rasterize-subtree-to-image primitive supplied by the host.
///
/// Jobs complete asynchronously: results show up in a later `poll` in any
/// order. A job may complete in the same frame it was submitted.
pub trait Rasterizer {
    fn submit(&mut self, job: RasterJob);

    /// Drains finished jobs.
    fn poll(&mut self) -> Vec<RasterDone>;
}
