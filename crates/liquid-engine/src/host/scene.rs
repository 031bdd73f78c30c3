use image::RgbaImage;

use crate::coords::{Affine2, CornerRadii, Rect, Vec2, Viewport};

/// Opaque handle to a host element.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ElementId(pub u64);

/// First border radius component as authored.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BorderRadius {
    Px(f32),
    /// Percentage of the smaller side of the element box.
    Percent(f32),
}

impl Default for BorderRadius {
    fn default() -> Self {
        BorderRadius::Px(0.0)
    }
}

impl BorderRadius {
    /// Resolves to CSS pixels against an element rectangle.
    pub fn resolve(self, rect: Rect) -> f32 {
        let v = match self {
            BorderRadius::Px(px) => px,
            BorderRadius::Percent(pct) => rect.min_side() * pct / 100.0,
        };
        if v.is_finite() { v.max(0.0) } else { 0.0 }
    }
}

/// The subset of computed style the compositor reads.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ElementStyle {
    pub transform: Affine2,
    pub opacity: f32,
    /// Resolved corner radii in CSS pixels.
    pub radii: CornerRadii,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            transform: Affine2::identity(),
            opacity: 1.0,
            radii: CornerRadii::zero(),
        }
    }
}

/// Layout and tree queries answered by the embedding page.
///
/// Rectangles are in CSS pixels relative to the layout viewport, like
/// `getBoundingClientRect`. All queries are pull-based: the renderer asks every
/// frame instead of subscribing to change notifications.
pub trait SceneHost {
    /// Root of the document; fallback snapshot root.
    fn document_root(&self) -> ElementId;

    fn query_selector(&self, selector: &str) -> Option<ElementId>;

    /// All elements under `root` (inclusive) matching `selector`.
    fn query_selector_all(&self, root: ElementId, selector: &str) -> Vec<ElementId>;

    fn bounding_rect(&self, el: ElementId) -> Option<Rect>;

    /// Full scrollable size of `el` in CSS pixels.
    fn scroll_size(&self, el: ElementId) -> (f32, f32);

    /// Whether the element is still attached to the document.
    fn is_connected(&self, el: ElementId) -> bool;

    /// Whether `el` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementId, el: ElementId) -> bool;

    /// The element or one of its ancestors carries the ignore marker.
    fn is_ignored(&self, el: ElementId) -> bool;

    /// z-index of the nearest positioned ancestor with an explicit z, else 0.
    fn effective_z(&self, el: ElementId) -> i32;

    fn style(&self, el: ElementId) -> ElementStyle;

    fn border_radius(&self, el: ElementId) -> BorderRadius;

    /// Video elements under `root`.
    fn videos(&self, root: ElementId) -> Vec<ElementId>;

    /// Current decoded frame; `None` while the video has no frame data yet.
    fn video_frame(&self, el: ElementId) -> Option<RgbaImage>;

    fn device_pixel_ratio(&self) -> f32;

    fn viewport(&self) -> Viewport;

    /// Document scroll position.
    fn scroll_offset(&self) -> Vec2;

    /// Offset of the visual viewport (pinch-zoom / overscroll).
    fn visual_viewport_offset(&self) -> Vec2 {
        Vec2::zero()
    }

    /// Pinch-zoom factor of the visual viewport.
    fn visual_viewport_scale(&self) -> f32 {
        1.0
    }

    /// Bumped by the host whenever elements are inserted or removed.
    fn structure_epoch(&self) -> u64;

    /// Mobile browser with a stricter texture size cap than the GPU reports.
    fn is_constrained_mobile(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_radius_uses_min_side() {
        let r = Rect::new(0.0, 0.0, 200.0, 100.0);
        assert_eq!(BorderRadius::Percent(50.0).resolve(r), 50.0);
        assert_eq!(BorderRadius::Px(12.0).resolve(r), 12.0);
    }

    #[test]
    fn negative_and_nan_radius_resolve_to_zero() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(BorderRadius::Px(-4.0).resolve(r), 0.0);
        assert_eq!(BorderRadius::Px(f32::NAN).resolve(r), 0.0);
    }
}
