use crate::dynamic::OffloadPolicy;

/// Mobile browsers reject textures past this size regardless of GPU limits.
pub const MOBILE_TEXTURE_CAP: u32 = 4096;

/// Construction parameters of a [`Renderer`](super::Renderer).
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Snapshot root; the document root when nothing matches.
    pub snapshot_selector: String,
    /// Capture pixels per CSS pixel, clamped to `[0.1, 3.0]`.
    pub resolution: f32,
    /// Largest texture side the GPU accepts.
    pub max_texture_dimension: u32,
    pub offload: OffloadPolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            snapshot_selector: "body".to_owned(),
            resolution: 2.0,
            max_texture_dimension: 8192,
            offload: OffloadPolicy::Auto,
        }
    }
}

impl RendererConfig {
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.snapshot_selector = selector.into();
        self
    }

    pub fn with_resolution(mut self, resolution: f32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Adopts the device limit reported by the GPU.
    pub fn with_max_texture_dimension(mut self, max: u32) -> Self {
        self.max_texture_dimension = max.max(1);
        self
    }

    pub fn with_offload(mut self, offload: OffloadPolicy) -> Self {
        self.offload = offload;
        self
    }
}
