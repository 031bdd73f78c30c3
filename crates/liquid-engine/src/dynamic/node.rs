use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::arena::SlotKey;
use crate::coords::PixelRect;
use crate::host::ElementId;

/// Minimum spacing between forced recaptures of a heavily animating node.
pub const REALTIME_CAPTURE_INTERVAL: Duration = Duration::from_millis(33);

/// Stable handle to a tracked dynamic node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DynamicHandle {
    index: u32,
    generation: u32,
}

impl SlotKey for DynamicHandle {
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

/// Visual-change notifications forwarded by the host for a tracked element.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    PointerEnter,
    PointerLeave,
    TransitionRun(String),
    TransitionStart(String),
    TransitionEnd(String),
    TransitionCancel(String),
    AnimationStart,
    AnimationIteration,
    AnimationEnd,
    AnimationCancel,
    /// Text, attributes or children changed.
    ContentMutated,
}

/// Capture lifecycle of a node.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NodeState {
    Clean,
    Dirty,
    Capturing,
}

/// A property change needs a recapture unless it only touches transform or
/// opacity.
pub fn is_heavy_property(name: &str) -> bool {
    let low = name.to_ascii_lowercase();
    !(low.contains("transform") || low.contains("opacity"))
}

/// Per-element tracking record.
#[derive(Debug, Clone)]
pub struct DynamicNode {
    pub element: ElementId,
    needs_capture: bool,
    capturing: bool,
    last_capture: Option<Arc<RgbaImage>>,
    /// Texture rectangle last written for this node; erased before redrawing.
    pub prev_draw_rect: Option<PixelRect>,
    heavy: bool,
    animating: bool,
    last_forced_capture: Option<Instant>,
    /// A patch is with the composer and has not come back yet.
    composing: bool,
    /// The in-flight patch predates an invalidation.
    discard_composed: bool,
}

impl DynamicNode {
    pub fn new(element: ElementId) -> Self {
        Self {
            element,
            needs_capture: true,
            capturing: false,
            last_capture: None,
            prev_draw_rect: None,
            heavy: false,
            animating: false,
            last_forced_capture: None,
            composing: false,
            discard_composed: false,
        }
    }

    pub fn state(&self) -> NodeState {
        if self.capturing {
            NodeState::Capturing
        } else if self.needs_capture {
            NodeState::Dirty
        } else {
            NodeState::Clean
        }
    }

    #[inline]
    pub fn is_heavy(&self) -> bool {
        self.heavy
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.animating
    }

    #[inline]
    pub fn is_composing(&self) -> bool {
        self.composing
    }

    #[inline]
    pub fn last_capture(&self) -> Option<&Arc<RgbaImage>> {
        self.last_capture.as_ref()
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.needs_capture = true;
    }

    /// A dirty node that is not already being captured.
    #[inline]
    pub fn wants_capture(&self) -> bool {
        self.needs_capture && !self.capturing
    }

    pub fn handle_event(&mut self, event: &NodeEvent) {
        match event {
            NodeEvent::PointerEnter | NodeEvent::PointerLeave | NodeEvent::ContentMutated => {
                self.mark_dirty();
            }
            NodeEvent::TransitionRun(prop) | NodeEvent::TransitionStart(prop) => {
                self.start_realtime();
                if is_heavy_property(prop) {
                    self.heavy = true;
                }
            }
            NodeEvent::TransitionEnd(prop) | NodeEvent::TransitionCancel(prop) => {
                self.stop_realtime();
                if is_heavy_property(prop) {
                    self.mark_dirty();
                }
            }
            NodeEvent::AnimationStart | NodeEvent::AnimationIteration => {
                self.start_realtime();
                self.heavy = true;
            }
            NodeEvent::AnimationEnd | NodeEvent::AnimationCancel => {
                self.stop_realtime();
                self.mark_dirty();
            }
        }
    }

    fn start_realtime(&mut self) {
        if self.animating {
            return;
        }
        self.animating = true;
        self.heavy = false;
    }

    fn stop_realtime(&mut self) {
        self.animating = false;
        self.heavy = false;
    }

    /// Re-flags a heavily animating node at most every 33 ms.
    pub fn realtime_tick(&mut self, now: Instant) {
        if !(self.animating && self.heavy) || self.capturing {
            return;
        }
        let due = self
            .last_forced_capture
            .is_none_or(|t| now.saturating_duration_since(t) > REALTIME_CAPTURE_INTERVAL);
        if due {
            self.last_forced_capture = Some(now);
            self.needs_capture = true;
        }
    }

    pub(crate) fn begin_capture(&mut self) {
        self.capturing = true;
    }

    /// Applies a finished capture. Failures leave the node dirty.
    pub(crate) fn finish_capture(&mut self, image: Option<RgbaImage>) {
        self.capturing = false;
        if let Some(img) = image {
            if img.width() > 0 && img.height() > 0 {
                self.last_capture = Some(Arc::new(img));
                self.needs_capture = false;
            }
        }
    }

    pub(crate) fn begin_compose(&mut self) {
        self.composing = true;
        self.discard_composed = false;
    }

    /// Returns whether the returned patch may still be drawn.
    pub(crate) fn finish_compose(&mut self) -> bool {
        self.composing = false;
        !std::mem::take(&mut self.discard_composed)
    }

    /// Forgets drawn state after a full recapture replaced the base image.
    ///
    /// An in-flight patch stays in flight but is discarded on return.
    pub(crate) fn invalidate(&mut self) {
        self.needs_capture = true;
        self.prev_draw_rect = None;
        self.last_capture = None;
        self.discard_composed = self.composing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn clean_node() -> DynamicNode {
        let mut n = DynamicNode::new(ElementId(3));
        n.begin_capture();
        n.finish_capture(Some(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]))));
        n
    }

    // ── state machine ─────────────────────────────────────────────────────

    #[test]
    fn new_node_is_dirty() {
        assert_eq!(DynamicNode::new(ElementId(1)).state(), NodeState::Dirty);
    }

    #[test]
    fn capture_cycle_returns_to_clean() {
        let mut n = DynamicNode::new(ElementId(1));
        n.begin_capture();
        assert_eq!(n.state(), NodeState::Capturing);
        assert!(!n.wants_capture());
        n.finish_capture(Some(RgbaImage::new(4, 4)));
        assert_eq!(n.state(), NodeState::Clean);
        assert!(n.last_capture().is_some());
    }

    #[test]
    fn failed_capture_stays_dirty() {
        let mut n = DynamicNode::new(ElementId(1));
        n.begin_capture();
        n.finish_capture(None);
        assert_eq!(n.state(), NodeState::Dirty);
        n.begin_capture();
        n.finish_capture(Some(RgbaImage::new(0, 0)));
        assert_eq!(n.state(), NodeState::Dirty);
    }

    // ── heavy detection ───────────────────────────────────────────────────

    #[test]
    fn transform_and_opacity_are_light() {
        assert!(!is_heavy_property("transform"));
        assert!(!is_heavy_property("-webkit-transform"));
        assert!(!is_heavy_property("Opacity"));
        assert!(is_heavy_property("background-color"));
        assert!(is_heavy_property("width"));
    }

    #[test]
    fn transform_transition_never_requests_capture() {
        let mut n = clean_node();
        let t0 = Instant::now();
        n.handle_event(&NodeEvent::TransitionRun("transform".into()));
        n.handle_event(&NodeEvent::TransitionStart("opacity".into()));
        for i in 0..10 {
            n.realtime_tick(t0 + Duration::from_millis(40 * i));
        }
        assert!(!n.is_heavy());
        n.handle_event(&NodeEvent::TransitionEnd("transform".into()));
        assert_eq!(n.state(), NodeState::Clean);
    }

    #[test]
    fn heavy_transition_recaptures_at_throttled_rate() {
        let mut n = clean_node();
        let t0 = Instant::now();
        n.handle_event(&NodeEvent::TransitionRun("background-color".into()));
        assert!(n.is_heavy());

        n.realtime_tick(t0);
        assert_eq!(n.state(), NodeState::Dirty);

        n.begin_capture();
        n.finish_capture(Some(RgbaImage::new(1, 1)));
        n.realtime_tick(t0 + Duration::from_millis(20));
        assert_eq!(n.state(), NodeState::Clean);
        n.realtime_tick(t0 + Duration::from_millis(34));
        assert_eq!(n.state(), NodeState::Dirty);

        n.handle_event(&NodeEvent::TransitionEnd("background-color".into()));
        assert!(!n.is_animating());
        assert_eq!(n.state(), NodeState::Dirty);
    }

    #[test]
    fn capturing_node_is_not_reflagged() {
        let mut n = clean_node();
        n.handle_event(&NodeEvent::AnimationStart);
        n.begin_capture();
        n.realtime_tick(Instant::now());
        n.finish_capture(Some(RgbaImage::new(1, 1)));
        assert_eq!(n.state(), NodeState::Clean);
    }

    #[test]
    fn animation_end_marks_dirty() {
        let mut n = clean_node();
        n.handle_event(&NodeEvent::AnimationStart);
        n.handle_event(&NodeEvent::AnimationEnd);
        assert!(!n.is_heavy());
        assert_eq!(n.state(), NodeState::Dirty);
    }

    #[test]
    fn pointer_and_mutation_mark_dirty() {
        for ev in [NodeEvent::PointerEnter, NodeEvent::PointerLeave, NodeEvent::ContentMutated] {
            let mut n = clean_node();
            n.handle_event(&ev);
            assert_eq!(n.state(), NodeState::Dirty);
        }
    }
}
