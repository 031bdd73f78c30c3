use crate::arena::SlotKey;
use crate::coords::Rect;
use crate::geometry::clamp_dpr;
use crate::host::{ElementId, SceneHost};

use super::options::{LensOptions, RevealMode};
use super::tilt::TiltState;

/// Stable handle returned by `add_lens`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LensHandle {
    index: u32,
    generation: u32,
}

impl SlotKey for LensHandle {
    fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
    fn index(self) -> u32 {
        self.index
    }
    fn generation(self) -> u32 {
        self.generation
    }
}

/// Drop-shadow element drawn by the host beneath a lens.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadowCompanion {
    pub rect: Rect,
    /// CSS px.
    pub radius: f32,
    /// Follows the reveal progress.
    pub opacity: f32,
    /// Two below the lens.
    pub z: i32,
}

/// Where a lens is in its reveal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RevealPhase {
    /// Waiting for the first snapshot.
    Queued,
    /// Following the shared fade.
    Fading,
    Visible,
}

/// One registered lens.
#[derive(Debug, Clone)]
pub struct Lens {
    pub element: ElementId,
    pub(crate) options: LensOptions,
    rect: Option<Rect>,
    radius_css: f32,
    radius_device: f32,
    z: i32,
    pub(crate) phase: RevealPhase,
    pub(crate) progress: f32,
    pub(crate) initialized: bool,
    pub(crate) tilt: TiltState,
    shadow: Option<ShadowCompanion>,
}

impl Lens {
    pub(crate) fn new(element: ElementId, options: LensOptions) -> Self {
        Self {
            element,
            options: options.clamped(),
            rect: None,
            radius_css: 0.0,
            radius_device: 0.0,
            z: 0,
            phase: RevealPhase::Queued,
            progress: 0.0,
            initialized: false,
            tilt: TiltState::default(),
            shadow: None,
        }
    }

    #[inline]
    pub fn options(&self) -> &LensOptions {
        &self.options
    }

    /// Screen rectangle from the last `update_metrics`, CSS px.
    #[inline]
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    #[inline]
    pub fn radius_css(&self) -> f32 {
        self.radius_css
    }

    #[inline]
    pub fn radius_device(&self) -> f32 {
        self.radius_device
    }

    #[inline]
    pub fn z(&self) -> i32 {
        self.z
    }

    #[inline]
    pub fn reveal_phase(&self) -> RevealPhase {
        self.phase
    }

    /// Reveal progress in `[0, 1]`; the host multiplies the element's own
    /// opacity by it.
    #[inline]
    pub fn reveal_progress(&self) -> f32 {
        self.progress
    }

    #[inline]
    pub fn tilt(&self) -> &TiltState {
        &self.tilt
    }

    #[inline]
    pub fn shadow(&self) -> Option<&ShadowCompanion> {
        self.shadow.as_ref()
    }

    /// Re-reads layout. While a tilt mirror is active the rectangle stays
    /// frozen at its value on pointer entry.
    pub fn update_metrics<H: SceneHost>(&mut self, host: &H) {
        let rect = self.tilt.mirror_rect().or_else(|| host.bounding_rect(self.element));
        self.rect = rect;
        self.z = host.effective_z(self.element);

        let Some(r) = rect else {
            self.radius_css = 0.0;
            self.radius_device = 0.0;
            return;
        };

        let requested = host.border_radius(self.element).resolve(r);
        self.radius_css = requested.min(r.min_side() * 0.5).max(0.0);
        self.radius_device = self.radius_css * clamp_dpr(host.device_pixel_ratio());

        self.sync_shadow();
    }

    pub(crate) fn set_shadow(&mut self, enabled: bool) {
        self.options.shadow = enabled;
        if !enabled {
            self.shadow = None;
        }
        self.sync_shadow();
    }

    pub(crate) fn sync_shadow(&mut self) {
        if !self.options.shadow {
            return;
        }
        let Some(rect) = self.rect else { return; };
        let opacity = match self.options.reveal {
            RevealMode::Fade => self.progress,
            RevealMode::None => 1.0,
        };
        self.shadow = Some(ShadowCompanion { rect, radius: self.radius_css, opacity, z: self.z - 2 });
    }
}
