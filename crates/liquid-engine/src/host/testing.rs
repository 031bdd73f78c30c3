//! In-memory host and rasterizer used by the unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use image::{Rgba, RgbaImage};

use crate::coords::{Rect, Vec2, Viewport};
use crate::dynamic::{ComposeJob, ComposedPatch, PatchComposer};

use super::{
    BorderRadius, ElementId, ElementStyle, RasterDone, RasterError, RasterJob, RasterOptions, Rasterizer,
    SceneHost,
};

#[derive(Debug, Clone)]
pub(crate) struct FakeElement {
    pub rect: Rect,
    pub parent: Option<ElementId>,
    pub connected: bool,
    pub ignored: bool,
    pub z: i32,
    pub style: ElementStyle,
    pub radius: BorderRadius,
    pub is_video: bool,
    pub video_frame: Option<RgbaImage>,
    pub selectors: Vec<String>,
}

impl FakeElement {
    fn new(rect: Rect, parent: Option<ElementId>) -> Self {
        Self {
            rect,
            parent,
            connected: true,
            ignored: false,
            z: 0,
            style: ElementStyle::default(),
            radius: BorderRadius::Px(0.0),
            is_video: false,
            video_frame: None,
            selectors: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct FakeHost {
    pub elements: HashMap<ElementId, FakeElement>,
    next_id: u64,
    root: ElementId,
    pub dpr: f32,
    pub viewport: Viewport,
    pub scroll: Vec2,
    pub epoch: u64,
    pub vv_scale: f32,
    pub vv_offset: Vec2,
    pub mobile: bool,
}

impl FakeHost {
    pub fn new(width: f32, height: f32) -> Self {
        let root = ElementId(1);
        let mut elements = HashMap::new();
        elements.insert(root, FakeElement::new(Rect::new(0.0, 0.0, width, height), None));
        Self {
            elements,
            next_id: 2,
            root,
            dpr: 1.0,
            viewport: Viewport::new(width, height),
            scroll: Vec2::zero(),
            epoch: 0,
            vv_scale: 1.0,
            vv_offset: Vec2::zero(),
            mobile: false,
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn add(&mut self, rect: Rect) -> ElementId {
        let root = self.root;
        self.add_child(root, rect)
    }

    pub fn add_child(&mut self, parent: ElementId, rect: Rect) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, FakeElement::new(rect, Some(parent)));
        self.epoch += 1;
        id
    }

    pub fn add_video(&mut self, rect: Rect, frame: Option<RgbaImage>) -> ElementId {
        let id = self.add(rect);
        let el = self.el_mut(id);
        el.is_video = true;
        el.video_frame = frame;
        id
    }

    pub fn el_mut(&mut self, id: ElementId) -> &mut FakeElement {
        self.elements.get_mut(&id).expect("unknown fake element")
    }

    pub fn set_rect(&mut self, id: ElementId, rect: Rect) {
        self.el_mut(id).rect = rect;
    }

    pub fn tag(&mut self, id: ElementId, selector: &str) {
        self.el_mut(id).selectors.push(selector.to_string());
    }

    pub fn detach(&mut self, id: ElementId) {
        self.el_mut(id).connected = false;
        self.epoch += 1;
    }

    fn ancestors_or_self(&self, el: ElementId) -> impl Iterator<Item = (ElementId, &FakeElement)> {
        let mut cur = Some(el);
        std::iter::from_fn(move || {
            let id = cur?;
            let e = self.elements.get(&id)?;
            cur = e.parent;
            Some((id, e))
        })
    }
}

impl SceneHost for FakeHost {
    fn document_root(&self) -> ElementId {
        self.root
    }

    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        let mut hits: Vec<ElementId> = self
            .elements
            .iter()
            .filter(|(_, e)| e.selectors.iter().any(|s| s == selector))
            .map(|(id, _)| *id)
            .collect();
        hits.sort();
        hits.first().copied()
    }

    fn query_selector_all(&self, root: ElementId, selector: &str) -> Vec<ElementId> {
        let mut hits: Vec<ElementId> = self
            .elements
            .iter()
            .filter(|(id, e)| e.selectors.iter().any(|s| s == selector) && self.contains(root, **id))
            .map(|(id, _)| *id)
            .collect();
        hits.sort();
        hits
    }

    fn bounding_rect(&self, el: ElementId) -> Option<Rect> {
        self.elements.get(&el).map(|e| e.rect)
    }

    fn scroll_size(&self, el: ElementId) -> (f32, f32) {
        self.elements
            .get(&el)
            .map_or((0.0, 0.0), |e| (e.rect.size.x, e.rect.size.y))
    }

    fn is_connected(&self, el: ElementId) -> bool {
        self.ancestors_or_self(el).all(|(_, e)| e.connected)
    }

    fn contains(&self, ancestor: ElementId, el: ElementId) -> bool {
        self.ancestors_or_self(el).any(|(id, _)| id == ancestor)
    }

    fn is_ignored(&self, el: ElementId) -> bool {
        self.ancestors_or_self(el).any(|(_, e)| e.ignored)
    }

    fn effective_z(&self, el: ElementId) -> i32 {
        self.ancestors_or_self(el)
            .map(|(_, e)| e.z)
            .find(|z| *z != 0)
            .unwrap_or(0)
    }

    fn style(&self, el: ElementId) -> ElementStyle {
        self.elements.get(&el).map(|e| e.style).unwrap_or_default()
    }

    fn border_radius(&self, el: ElementId) -> BorderRadius {
        self.elements.get(&el).map(|e| e.radius).unwrap_or_default()
    }

    fn videos(&self, root: ElementId) -> Vec<ElementId> {
        let mut out: Vec<ElementId> = self
            .elements
            .iter()
            .filter(|(id, e)| e.is_video && self.contains(root, **id))
            .map(|(id, _)| *id)
            .collect();
        out.sort();
        out
    }

    fn video_frame(&self, el: ElementId) -> Option<RgbaImage> {
        self.elements.get(&el).and_then(|e| e.video_frame.clone())
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.dpr
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn scroll_offset(&self) -> Vec2 {
        self.scroll
    }

    fn visual_viewport_offset(&self) -> Vec2 {
        self.vv_offset
    }

    fn visual_viewport_scale(&self) -> f32 {
        self.vv_scale
    }

    fn structure_epoch(&self) -> u64 {
        self.epoch
    }

    fn is_constrained_mobile(&self) -> bool {
        self.mobile
    }
}

/// Scripted outcome for the next submitted job.
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    Image(RgbaImage),
    Fail,
    Empty,
}

/// Rasterizer that answers from a script, or with a solid image sized from
/// the job options when the script is exhausted.
#[derive(Debug, Default)]
pub(crate) struct ScriptedRasterizer {
    pub submitted: Vec<RasterJob>,
    script: VecDeque<Outcome>,
    ready: Vec<RasterDone>,
    pub held: Vec<RasterDone>,
    /// Keep results in `held` until released explicitly.
    pub hold: bool,
    pub fill: [u8; 4],
}

impl ScriptedRasterizer {
    pub fn new() -> Self {
        Self {
            fill: [120, 120, 120, 255],
            ..Self::default()
        }
    }

    pub fn push(&mut self, outcome: Outcome) {
        self.script.push_back(outcome);
    }

    /// Moves a held result to the ready queue.
    pub fn release(&mut self, index: usize) {
        let done = self.held.remove(index);
        self.ready.push(done);
    }
}

impl Rasterizer for ScriptedRasterizer {
    fn submit(&mut self, job: RasterJob) {
        let outcome = self.script.pop_front().unwrap_or_else(|| {
            let (w, h) = output_size(&job.options);
            Outcome::Image(RgbaImage::from_pixel(w.max(1), h.max(1), Rgba(self.fill)))
        });
        let result = match outcome {
            Outcome::Image(img) => Ok(img),
            Outcome::Fail => Err(RasterError::Failed("scripted failure".into())),
            Outcome::Empty => Err(RasterError::Empty),
        };
        let done = RasterDone { tag: job.tag, result };
        self.submitted.push(job);
        if self.hold {
            self.held.push(done);
        } else {
            self.ready.push(done);
        }
    }

    fn poll(&mut self) -> Vec<RasterDone> {
        std::mem::take(&mut self.ready)
    }
}

/// Offloaded composer whose jobs finish only when told to. Clones share the
/// same queues.
#[derive(Clone, Default)]
pub(crate) struct HeldComposer {
    inner: Rc<RefCell<HeldJobs>>,
}

#[derive(Default)]
struct HeldJobs {
    pending: Vec<ComposeJob>,
    ready: Vec<ComposedPatch>,
    submitted: usize,
}

impl HeldComposer {
    pub fn submitted(&self) -> usize {
        self.inner.borrow().submitted
    }

    /// Composes every pending job; results show up on the next `drain`.
    pub fn finish(&self) {
        let mut jobs = self.inner.borrow_mut();
        let done: Vec<ComposedPatch> = jobs.pending.drain(..).map(crate::dynamic::compose).collect();
        jobs.ready.extend(done);
    }
}

impl PatchComposer for HeldComposer {
    fn submit(&mut self, job: ComposeJob) {
        let mut jobs = self.inner.borrow_mut();
        jobs.submitted += 1;
        jobs.pending.push(job);
    }

    fn drain(&mut self) -> Vec<ComposedPatch> {
        std::mem::take(&mut self.inner.borrow_mut().ready)
    }

    fn is_offloaded(&self) -> bool {
        true
    }
}

/// Pixel size a faithful rasterizer would return for `options`.
fn output_size(options: &RasterOptions) -> (u32, u32) {
    let w = (options.width * options.scale).round().max(0.0) as u32;
    let h = (options.height * options.scale).round().max(0.0) as u32;
    (w, h)
}
