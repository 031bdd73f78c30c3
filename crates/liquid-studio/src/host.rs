//! `SceneHost` and `Rasterizer` over the shared synthetic page.

use std::cell::RefCell;
use std::rc::Rc;

use image::RgbaImage;

use liquid_engine::coords::{Rect, Vec2, Viewport};
use liquid_engine::host::{
    BorderRadius, ElementId, ElementStyle, RasterDone, RasterError, RasterJob, Rasterizer, SceneHost,
};

use crate::page::{Kind, Page, ROOT};

pub type SharedPage = Rc<RefCell<Page>>;

pub struct PageHost {
    page: SharedPage,
}

impl PageHost {
    pub fn new(page: SharedPage) -> Self {
        Self { page }
    }
}

impl SceneHost for PageHost {
    fn document_root(&self) -> ElementId {
        ROOT
    }

    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        self.page
            .borrow()
            .elements()
            .iter()
            .find(|e| e.selector == selector)
            .map(|e| e.id)
    }

    fn query_selector_all(&self, root: ElementId, selector: &str) -> Vec<ElementId> {
        let page = self.page.borrow();
        page.elements()
            .iter()
            .filter(|e| e.selector == selector && page.contains(root, e.id))
            .map(|e| e.id)
            .collect()
    }

    fn bounding_rect(&self, el: ElementId) -> Option<Rect> {
        self.page.borrow().client_rect(el)
    }

    fn scroll_size(&self, el: ElementId) -> (f32, f32) {
        self.page
            .borrow()
            .element(el)
            .map_or((0.0, 0.0), |e| (e.rect.size.x, e.rect.size.y))
    }

    fn is_connected(&self, el: ElementId) -> bool {
        self.page.borrow().element(el).is_some()
    }

    fn contains(&self, ancestor: ElementId, el: ElementId) -> bool {
        self.page.borrow().contains(ancestor, el)
    }

    fn is_ignored(&self, _el: ElementId) -> bool {
        false
    }

    fn effective_z(&self, el: ElementId) -> i32 {
        let page = self.page.borrow();
        let mut cur = Some(el);
        while let Some(id) = cur {
            let Some(e) = page.element(id) else { break; };
            if e.z != 0 {
                return e.z;
            }
            cur = e.parent;
        }
        0
    }

    fn style(&self, el: ElementId) -> ElementStyle {
        let page = self.page.borrow();
        let Some(e) = page.element(el) else { return ElementStyle::default(); };
        ElementStyle {
            radii: liquid_engine::coords::CornerRadii::all(e.radius.resolve(e.rect)),
            ..ElementStyle::default()
        }
    }

    fn border_radius(&self, el: ElementId) -> BorderRadius {
        self.page.borrow().element(el).map(|e| e.radius).unwrap_or_default()
    }

    fn videos(&self, root: ElementId) -> Vec<ElementId> {
        let page = self.page.borrow();
        page.elements()
            .iter()
            .filter(|e| e.kind == Kind::Video && page.contains(root, e.id))
            .map(|e| e.id)
            .collect()
    }

    fn video_frame(&self, el: ElementId) -> Option<RgbaImage> {
        let page = self.page.borrow();
        (page.video() == el).then(|| page.video_frame())
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.page.borrow().dpr()
    }

    fn viewport(&self) -> Viewport {
        self.page.borrow().viewport()
    }

    fn scroll_offset(&self) -> Vec2 {
        Vec2::new(0.0, self.page.borrow().scroll())
    }

    fn structure_epoch(&self) -> u64 {
        // The element set never changes after construction.
        0
    }
}

/// Paints jobs synchronously on submit; results are handed out on the next
/// `poll`.
pub struct PageRasterizer {
    page: SharedPage,
    ready: Vec<RasterDone>,
}

impl PageRasterizer {
    pub fn new(page: SharedPage) -> Self {
        Self { page, ready: Vec::new() }
    }

    fn paint(&self, job: &RasterJob) -> Result<RgbaImage, RasterError> {
        let page = self.page.borrow();
        let o = &job.options;
        if !(o.scale > 0.0) || o.width <= 0.0 || o.height <= 0.0 {
            return Err(RasterError::Empty);
        }

        let img = if job.root == ROOT {
            let started = std::time::Instant::now();
            let img = page.paint_document(Vec2::zero(), (o.width, o.height), o.scale, &o.ignore, o.ignore_fixed);
            log::debug!(
                "painted document {}x{} in {:?}",
                img.width(),
                img.height(),
                started.elapsed()
            );
            img
        } else {
            page.paint_subtree(job.root, o.scale)
                .ok_or_else(|| RasterError::Failed(format!("unknown element {:?}", job.root)))?
        };
        Ok(img)
    }
}

impl Rasterizer for PageRasterizer {
    fn submit(&mut self, job: RasterJob) {
        let result = self.paint(&job);
        self.ready.push(RasterDone { tag: job.tag, result });
    }

    fn poll(&mut self) -> Vec<RasterDone> {
        std::mem::take(&mut self.ready)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use liquid_engine::host::{RasterOptions, RasterTag};

    use super::*;

    fn shared() -> SharedPage {
        Rc::new(RefCell::new(Page::new(Viewport::new(1000.0, 600.0), 1.0, Instant::now())))
    }

    #[test]
    fn selector_lookup_finds_lenses() {
        let page = shared();
        let host = PageHost::new(page.clone());
        let ids = page.borrow().lens_ids();
        assert_eq!(host.query_selector(".glass-frost"), Some(ids.frost));
        assert_eq!(host.query_selector("body"), Some(ROOT));
        assert_eq!(host.effective_z(ids.magnifier), 10);
    }

    #[test]
    fn document_raster_matches_requested_size() {
        let page = shared();
        let mut raster = PageRasterizer::new(page);
        raster.submit(RasterJob {
            tag: RasterTag::Snapshot { generation: 1 },
            root: ROOT,
            options: RasterOptions {
                scale: 0.5,
                width: 400.0,
                height: 300.0,
                ignore: Vec::new(),
                ignore_fixed: true,
                ignore_marked: true,
            },
        });
        let done = raster.poll();
        assert_eq!(done.len(), 1);
        let img = done.into_iter().next().map(|d| d.result);
        assert_eq!(img.and_then(|r| r.ok()).map(|i| i.dimensions()), Some((200, 150)));
        assert!(raster.poll().is_empty());
    }
}
