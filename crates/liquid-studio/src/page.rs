//! A synthetic scrolling document painted in software.
//!
//! Stands in for the web page the glass sits on: a striped gradient
//! background, a grid of cards, one card animating on its own and a fake video
//! element. Every element is addressable by `ElementId` so the page can back
//! both `SceneHost` and `Rasterizer`.

use std::time::Instant;

use image::{Rgba, RgbaImage};

use liquid_engine::coords::{Rect, Vec2, Viewport};
use liquid_engine::host::{BorderRadius, ElementId};

pub const ROOT: ElementId = ElementId(1);

const MARGIN: f32 = 48.0;
const CARD_HEIGHT: f32 = 220.0;
const CARD_GAP: f32 = 32.0;
const CARD_ROWS: usize = 5;
const MAGNIFIER_SIZE: f32 = 180.0;

/// Size of one generated video frame.
pub const VIDEO_FRAME: (u32, u32) = (192, 108);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Kind {
    Root,
    Card,
    /// Text-like bar.
    Line,
    /// Card whose content animates every frame.
    Pulse,
    Video,
    /// Glass lens host element; paints nothing itself.
    Lens,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    pub kind: Kind,
    pub parent: Option<ElementId>,
    /// Document coordinates, or viewport coordinates when `fixed`.
    pub rect: Rect,
    pub radius: BorderRadius,
    pub color: [u8; 4],
    pub z: i32,
    pub fixed: bool,
    pub selector: &'static str,
}

/// Lens element ids, stable across relayouts.
#[derive(Debug, Copy, Clone)]
pub struct LensIds {
    pub tilt: ElementId,
    pub frost: ElementId,
    pub magnifier: ElementId,
}

pub struct Page {
    elements: Vec<Element>,
    viewport: Viewport,
    dpr: f32,
    scroll: f32,
    height: f32,
    pointer: Option<Vec2>,
    started: Instant,
    time: f32,
    lens_ids: LensIds,
    pulse: ElementId,
    video: ElementId,
}

impl Page {
    pub fn new(viewport: Viewport, dpr: f32, now: Instant) -> Self {
        let mut page = Self {
            elements: Vec::new(),
            viewport,
            dpr,
            scroll: 0.0,
            height: viewport.height,
            pointer: None,
            started: now,
            time: 0.0,
            lens_ids: LensIds { tilt: ROOT, frost: ROOT, magnifier: ROOT },
            pulse: ROOT,
            video: ROOT,
        };
        page.layout();
        page
    }

    // ── layout ─────────────────────────────────────────────────────────────

    /// Rebuilds element geometry for the current viewport width. Ids are
    /// assigned in build order, so they survive a relayout.
    fn layout(&mut self) {
        let w = self.viewport.width.max(2.0 * MARGIN + 200.0);
        let col = (w - 3.0 * MARGIN) / 2.0;
        let mut els: Vec<Element> = Vec::new();

        let mut push = |kind, parent, rect, radius, color, selector| {
            let id = ElementId(els.len() as u64 + 1);
            els.push(Element { id, kind, parent, rect, radius, color, z: 0, fixed: false, selector });
            id
        };

        push(Kind::Root, None, Rect::new(0.0, 0.0, w, 0.0), BorderRadius::Px(0.0), [0; 4], "body");

        // Headline.
        push(Kind::Line, Some(ROOT), Rect::new(MARGIN, 56.0, w * 0.45, 28.0), BorderRadius::Px(6.0), [24, 28, 40, 255], "h1");
        push(Kind::Line, Some(ROOT), Rect::new(MARGIN, 100.0, w * 0.3, 14.0), BorderRadius::Px(4.0), [60, 66, 86, 255], "p");

        let palette: [[u8; 4]; 6] = [
            [239, 71, 111, 255],
            [255, 209, 102, 255],
            [6, 214, 160, 255],
            [17, 138, 178, 255],
            [131, 56, 236, 255],
            [251, 133, 0, 255],
        ];

        let mut pulse = ROOT;
        let mut video = ROOT;
        let top = 160.0;
        for row in 0..CARD_ROWS {
            for c in 0..2 {
                let x = MARGIN + c as f32 * (col + MARGIN);
                let y = top + row as f32 * (CARD_HEIGHT + CARD_GAP);
                let rect = Rect::new(x, y, col, CARD_HEIGHT);
                let color = palette[(row * 2 + c) % palette.len()];

                match (row, c) {
                    (1, 0) => {
                        pulse = push(Kind::Pulse, Some(ROOT), rect, BorderRadius::Px(24.0), color, ".pulse");
                    }
                    (2, 1) => {
                        let h = (col * 9.0 / 16.0).min(CARD_HEIGHT);
                        let r = Rect::new(x, y + (CARD_HEIGHT - h) / 2.0, col, h);
                        video = push(Kind::Video, Some(ROOT), r, BorderRadius::Px(16.0), [0, 0, 0, 255], "video");
                    }
                    _ => {
                        let card = push(Kind::Card, Some(ROOT), rect, BorderRadius::Px(20.0), color, ".card");
                        for i in 0..3 {
                            let lw = col * (0.7 - 0.15 * i as f32);
                            let lr = Rect::new(x + 24.0, y + 28.0 + i as f32 * 26.0, lw, 12.0);
                            push(Kind::Line, Some(card), lr, BorderRadius::Percent(50.0), [255, 255, 255, 200], "p");
                        }
                    }
                }
            }
        }
        let height = top + CARD_ROWS as f32 * (CARD_HEIGHT + CARD_GAP) + MARGIN;

        let tilt = push(
            Kind::Lens,
            Some(ROOT),
            Rect::new(MARGIN + 40.0, 220.0, col.min(360.0), 220.0),
            BorderRadius::Px(28.0),
            [0; 4],
            ".glass-tilt",
        );
        let frost = push(
            Kind::Lens,
            Some(ROOT),
            Rect::new(w - MARGIN - col.min(320.0) - 20.0, 700.0, col.min(320.0), 180.0),
            BorderRadius::Px(90.0),
            [0; 4],
            ".glass-frost",
        );
        let magnifier = push(
            Kind::Lens,
            Some(ROOT),
            Rect::new(0.0, 0.0, MAGNIFIER_SIZE, MAGNIFIER_SIZE),
            BorderRadius::Percent(50.0),
            [0; 4],
            ".glass-magnifier",
        );

        let root_rect = Rect::new(0.0, 0.0, w, height);
        els[0].rect = root_rect;
        if let Some(m) = els.get_mut(magnifier.0 as usize - 1) {
            m.fixed = true;
            m.z = 10;
        }

        self.elements = els;
        self.height = height;
        self.lens_ids = LensIds { tilt, frost, magnifier };
        self.pulse = pulse;
        self.video = video;
        self.scroll = self.scroll.clamp(0.0, self.max_scroll());
        self.place_magnifier();
    }

    // ── state ──────────────────────────────────────────────────────────────

    pub fn advance(&mut self, now: Instant) {
        self.time = now.duration_since(self.started).as_secs_f32();
    }

    pub fn set_viewport(&mut self, viewport: Viewport, dpr: f32) {
        let relayout = viewport.width != self.viewport.width;
        self.viewport = viewport;
        self.dpr = dpr;
        if relayout {
            self.layout();
        } else {
            self.scroll = self.scroll.clamp(0.0, self.max_scroll());
            self.place_magnifier();
        }
    }

    pub fn scroll_by(&mut self, dy: f32) {
        self.scroll = (self.scroll + dy).clamp(0.0, self.max_scroll());
    }

    pub fn scroll_to(&mut self, y: f32) {
        self.scroll = y.clamp(0.0, self.max_scroll());
    }

    pub fn set_pointer(&mut self, p: Option<Vec2>) {
        self.pointer = p;
        self.place_magnifier();
    }

    /// The magnifier follows the pointer, or rests in the bottom-right corner.
    fn place_magnifier(&mut self) {
        let vp = self.viewport;
        let centre = self.pointer.unwrap_or(Vec2::new(
            vp.width - MAGNIFIER_SIZE / 2.0 - 24.0,
            vp.height - MAGNIFIER_SIZE / 2.0 - 24.0,
        ));
        let id = self.lens_ids.magnifier;
        if let Some(m) = self.element_mut(id) {
            m.rect = Rect::new(
                centre.x - MAGNIFIER_SIZE / 2.0,
                centre.y - MAGNIFIER_SIZE / 2.0,
                MAGNIFIER_SIZE,
                MAGNIFIER_SIZE,
            );
        }
    }

    fn max_scroll(&self) -> f32 {
        (self.height - self.viewport.height).max(0.0)
    }

    // ── queries ────────────────────────────────────────────────────────────

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        let idx = (id.0 as usize).checked_sub(1)?;
        self.elements.get(idx)
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        let idx = (id.0 as usize).checked_sub(1)?;
        self.elements.get_mut(idx)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn lens_ids(&self) -> LensIds {
        self.lens_ids
    }

    pub fn pulse(&self) -> ElementId {
        self.pulse
    }

    pub fn video(&self) -> ElementId {
        self.video
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn dpr(&self) -> f32 {
        self.dpr
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Viewport-relative rectangle, like `getBoundingClientRect`.
    pub fn client_rect(&self, id: ElementId) -> Option<Rect> {
        let el = self.element(id)?;
        if el.fixed {
            Some(el.rect)
        } else {
            Some(el.rect.translate(Vec2::new(0.0, -self.scroll)))
        }
    }

    pub fn contains(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.element(c).and_then(|e| e.parent);
        }
        false
    }

    // ── painting ───────────────────────────────────────────────────────────

    /// Paints the document region starting at document `origin`, `size` CSS
    /// px, at `scale` output pixels per CSS px. Elements under any id in
    /// `ignore` are skipped, as are fixed elements when `skip_fixed`. Videos
    /// show their placeholder, like a DOM rasterizer would.
    pub fn paint_document(
        &self,
        origin: Vec2,
        size: (f32, f32),
        scale: f32,
        ignore: &[ElementId],
        skip_fixed: bool,
    ) -> RgbaImage {
        self.paint_region(origin, size, scale, ignore, skip_fixed, false)
    }

    /// What the window shows under the glass: every non-fixed element, with
    /// videos playing.
    pub fn paint_live(&self, region: Rect, scale: f32) -> RgbaImage {
        self.paint_region(region.origin, (region.size.x, region.size.y), scale, &[], true, true)
    }

    fn paint_region(
        &self,
        origin: Vec2,
        size: (f32, f32),
        scale: f32,
        ignore: &[ElementId],
        skip_fixed: bool,
        live: bool,
    ) -> RgbaImage {
        let w = (size.0 * scale).round().max(1.0) as u32;
        let h = (size.1 * scale).round().max(1.0) as u32;
        let mut img = RgbaImage::from_fn(w, h, |x, y| {
            let p = Vec2::new(
                origin.x + (x as f32 + 0.5) / scale,
                origin.y + (y as f32 + 0.5) / scale,
            );
            Rgba(background(p))
        });

        for el in &self.elements {
            if el.kind == Kind::Root || (skip_fixed && el.fixed) {
                continue;
            }
            if ignore.iter().any(|i| self.contains(*i, el.id)) {
                continue;
            }
            self.paint_element(&mut img, el, origin, scale, live);
        }
        img
    }

    /// Paints one element and its descendants alone, in its own box.
    pub fn paint_subtree(&self, id: ElementId, scale: f32) -> Option<RgbaImage> {
        let root = self.element(id)?;
        let origin = root.rect.origin;
        let w = (root.rect.size.x * scale).round().max(1.0) as u32;
        let h = (root.rect.size.y * scale).round().max(1.0) as u32;
        let mut img = RgbaImage::new(w, h);
        for el in self.elements.iter().filter(|e| self.contains(id, e.id)) {
            self.paint_element(&mut img, el, origin, scale, false);
        }
        Some(img)
    }

    fn paint_element(&self, img: &mut RgbaImage, el: &Element, origin: Vec2, scale: f32, live: bool) {
        if el.kind == Kind::Lens || el.kind == Kind::Root {
            return;
        }
        let r = el.rect;
        let radius = el.radius.resolve(r);
        let x0 = (((r.origin.x - origin.x) * scale).floor().max(0.0)) as u32;
        let y0 = (((r.origin.y - origin.y) * scale).floor().max(0.0)) as u32;
        let x1 = (((r.right() - origin.x) * scale).ceil().max(0.0) as u32).min(img.width());
        let y1 = (((r.bottom() - origin.y) * scale).ceil().max(0.0) as u32).min(img.height());

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(
                    origin.x + (x as f32 + 0.5) / scale,
                    origin.y + (y as f32 + 0.5) / scale,
                );
                let cover = rounded_coverage(p, r, radius, scale);
                if cover <= 0.0 {
                    continue;
                }
                let local = Vec2::new((p.x - r.origin.x) / r.size.x, (p.y - r.origin.y) / r.size.y);
                let src = self.shade(el, local, live);
                let dst = img.get_pixel_mut(x, y);
                *dst = Rgba(over(src, dst.0, cover));
            }
        }
    }

    fn shade(&self, el: &Element, uv: Vec2, live: bool) -> [u8; 4] {
        match el.kind {
            Kind::Pulse => {
                let t = self.time;
                let hue = (t * 0.15 + uv.x * 0.3).fract();
                let mut c = hsv(hue, 0.65, 0.95);
                // A bright dot orbiting the card centre.
                let dot = Vec2::new(0.5 + 0.3 * (t * 1.7).cos(), 0.5 + 0.3 * (t * 1.7).sin());
                let d = ((uv.x - dot.x) * 2.0).hypot(uv.y - dot.y);
                if d < 0.12 {
                    c = [255, 255, 255, 255];
                }
                c
            }
            Kind::Video if live => video_color(self.time, uv.x, uv.y),
            // Placeholder until the first decoded frame is patched in.
            Kind::Video => el.color,
            _ => {
                let shade = 1.0 - 0.18 * uv.y;
                let [r, g, b, a] = el.color;
                [
                    (r as f32 * shade) as u8,
                    (g as f32 * shade) as u8,
                    (b as f32 * shade) as u8,
                    a,
                ]
            }
        }
    }

    /// Current frame of the fake video: scrolling colour bars.
    pub fn video_frame(&self) -> RgbaImage {
        let t = self.time;
        let (w, h) = VIDEO_FRAME;
        RgbaImage::from_fn(w, h, |x, y| Rgba(video_color(t, x as f32 / w as f32, y as f32 / h as f32)))
    }
}

fn video_color(t: f32, u: f32, v: f32) -> [u8; 4] {
    let band = ((u * 7.0 + t * 0.8).floor() as i32).rem_euclid(7) as f32 / 7.0;
    hsv(band, 0.8, 0.55 + 0.45 * v)
}

/// Page background: vertical hue gradient with diagonal stripes and a dot
/// grid, dense enough that refraction is visible everywhere.
fn background(p: Vec2) -> [u8; 4] {
    let hue = (0.58 + p.y / 4000.0).fract();
    let stripe = ((p.x + p.y) / 28.0).floor() as i32 % 2 == 0;
    let [mut r, mut g, mut b, _] = hsv(hue, 0.22, if stripe { 0.97 } else { 0.9 });

    let gx = p.x.rem_euclid(40.0) - 20.0;
    let gy = p.y.rem_euclid(40.0) - 20.0;
    if gx * gx + gy * gy < 4.0 {
        r = r.saturating_sub(60);
        g = g.saturating_sub(60);
        b = b.saturating_sub(40);
    }
    [r, g, b, 255]
}

/// Anti-aliased coverage of `p` by a rounded rectangle.
fn rounded_coverage(p: Vec2, r: Rect, radius: f32, scale: f32) -> f32 {
    let half = Vec2::new(r.size.x / 2.0, r.size.y / 2.0);
    let c = r.center();
    let rad = radius.min(half.x).min(half.y).max(0.0);
    let qx = (p.x - c.x).abs() - half.x + rad;
    let qy = (p.y - c.y).abs() - half.y + rad;
    let outside = Vec2::new(qx.max(0.0), qy.max(0.0)).length();
    let d = outside + qx.max(qy).min(0.0) - rad;
    (0.5 - d * scale).clamp(0.0, 1.0)
}

fn over(src: [u8; 4], dst: [u8; 4], cover: f32) -> [u8; 4] {
    let a = src[3] as f32 / 255.0 * cover;
    let mix = |s: u8, d: u8| (s as f32 * a + d as f32 * (1.0 - a)).round() as u8;
    let out_a = a + dst[3] as f32 / 255.0 * (1.0 - a);
    [mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2]), (out_a * 255.0).round() as u8]
}

fn hsv(h: f32, s: f32, v: f32) -> [u8; 4] {
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match (i as i32).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let q8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [q8(r), q8(g), q8(b), 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Page {
        Page::new(Viewport::new(1000.0, 600.0), 1.0, Instant::now())
    }

    #[test]
    fn ids_survive_relayout() {
        let mut p = page();
        let before = p.lens_ids().frost;
        p.set_viewport(Viewport::new(1400.0, 600.0), 1.0);
        assert_eq!(p.lens_ids().frost, before);
        assert_eq!(p.element(before).map(|e| e.kind), Some(Kind::Lens));
    }

    #[test]
    fn scrolling_moves_client_rects_but_not_fixed_ones() {
        let mut p = page();
        let frost = p.lens_ids().frost;
        let mag = p.lens_ids().magnifier;
        let (f0, m0) = (p.client_rect(frost), p.client_rect(mag));
        p.scroll_by(100.0);
        assert_eq!(p.client_rect(frost).map(|r| r.origin.y), f0.map(|r| r.origin.y - 100.0));
        assert_eq!(p.client_rect(mag), m0);
    }

    #[test]
    fn scroll_is_clamped_to_document() {
        let mut p = page();
        p.scroll_by(-50.0);
        assert_eq!(p.scroll(), 0.0);
        p.scroll_by(1.0e6);
        assert_eq!(p.scroll(), p.height() - 600.0);
    }

    #[test]
    fn magnifier_follows_pointer() {
        let mut p = page();
        p.set_pointer(Some(Vec2::new(300.0, 200.0)));
        let r = p.client_rect(p.lens_ids().magnifier).unwrap_or_default();
        assert_eq!(r.center(), Vec2::new(300.0, 200.0));
    }

    #[test]
    fn subtree_paint_is_transparent_outside_rounded_corners() {
        let p = page();
        let img = p.paint_subtree(p.pulse(), 1.0).unwrap_or_default();
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        let (w, h) = img.dimensions();
        assert_eq!(img.get_pixel(w / 2, h / 2)[3], 255);
    }
}
