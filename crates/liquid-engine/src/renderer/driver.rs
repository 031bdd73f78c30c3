use std::time::Instant;

use crate::coords::{Vec2, Viewport};
use crate::dynamic::{
    negotiate_composer, update_videos, DynamicHandle, DynamicTracker, NodeEvent, PatchComposer, PatchFrame,
};
use crate::geometry::{clamp_dpr, device_rect, mirror_clear_rect, scissor_rect, uv_bounds, LensUniforms, UniformInputs};
use crate::host::{ElementId, OverlayVisibility, RasterDone, RasterTag, Rasterizer, SceneHost};
use crate::lens::{Lens, LensEvent, LensHandle, LensOptions, LensRegistry, RevealMode, RevealPhase};
use crate::schedule::{Debounce, Scheduler, ScrollTracker, SyncConfig, TickSource, RESIZE_DEBOUNCE};
use crate::snapshot::{CaptureOutcome, CaptureSpec, SnapshotConfig, SnapshotStore};
use crate::texture::TextureManager;

use super::config::{RendererConfig, MOBILE_TEXTURE_CAP};
use super::plan::{FramePlan, LensDraw, MirrorDraw};

/// What `register_dynamic` should track.
#[derive(Debug, Copy, Clone)]
pub enum DynamicTarget<'a> {
    Elements(&'a [ElementId]),
    /// Resolved under the snapshot root.
    Selector(&'a str),
}

impl<'a> From<&'a [ElementId]> for DynamicTarget<'a> {
    fn from(els: &'a [ElementId]) -> Self {
        DynamicTarget::Elements(els)
    }
}

impl<'a> From<&'a str> for DynamicTarget<'a> {
    fn from(selector: &'a str) -> Self {
        DynamicTarget::Selector(selector)
    }
}

/// The glass renderer.
///
/// One explicit instance per page; callers own it and pass it around. Every
/// method that depends on time takes the current `Instant`.
pub struct Renderer<H: SceneHost, R: Rasterizer> {
    host: H,
    rasterizer: R,
    overlay: OverlayVisibility,
    snapshot: SnapshotStore,
    texture: TextureManager,
    tracker: DynamicTracker,
    composer: Box<dyn PatchComposer>,
    lenses: LensRegistry,
    scheduler: Scheduler,
    scroll: ScrollTracker,
    resize: Debounce,
    root: ElementId,
    videos: Vec<ElementId>,
    capture_requested: bool,
    started_at: Instant,
    last_frame: Option<Instant>,
}

impl<H: SceneHost, R: Rasterizer> Renderer<H, R> {
    /// Resolves the snapshot root and schedules the first capture for the
    /// next frame, so lenses added before it are left out of the snapshot.
    pub fn new(host: H, rasterizer: R, config: RendererConfig, now: Instant) -> Self {
        let root = match host.query_selector(&config.snapshot_selector) {
            Some(el) => el,
            None => {
                log::warn!(
                    "snapshot root `{}` not found, falling back to the document root",
                    config.snapshot_selector
                );
                host.document_root()
            }
        };

        let videos: Vec<ElementId> = host.videos(root).into_iter().filter(|v| !host.is_ignored(*v)).collect();
        let composer = negotiate_composer(config.offload);
        let overlay = OverlayVisibility::new();

        let snapshot = SnapshotStore::new(
            SnapshotConfig {
                resolution: config.resolution,
                max_texture_dimension: config.max_texture_dimension,
                mobile_dimension_cap: host.is_constrained_mobile().then_some(MOBILE_TEXTURE_CAP),
                ..SnapshotConfig::default()
            },
            overlay.clone(),
        );

        log::info!(
            "renderer created: root {root:?}, {} video(s), offload {}",
            videos.len(),
            composer.is_offloaded()
        );

        Self {
            host,
            rasterizer,
            overlay,
            snapshot,
            texture: TextureManager::new(),
            tracker: DynamicTracker::new(),
            composer,
            lenses: LensRegistry::new(),
            scheduler: Scheduler::default(),
            scroll: ScrollTracker::new(),
            resize: Debounce::new(RESIZE_DEBOUNCE),
            root,
            videos,
            capture_requested: true,
            started_at: now,
            last_frame: None,
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[inline]
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[inline]
    pub fn rasterizer_mut(&mut self) -> &mut R {
        &mut self.rasterizer
    }

    /// Pending GPU writes live here; the GPU adapter drains them each frame.
    #[inline]
    pub fn texture_mut(&mut self) -> &mut TextureManager {
        &mut self.texture
    }

    #[inline]
    pub fn texture(&self) -> &TextureManager {
        &self.texture
    }

    #[inline]
    pub fn snapshot(&self) -> &SnapshotStore {
        &self.snapshot
    }

    #[inline]
    pub fn dynamic(&self) -> &DynamicTracker {
        &self.tracker
    }

    #[inline]
    pub fn snapshot_root(&self) -> ElementId {
        self.root
    }

    #[inline]
    pub fn tick_source(&self) -> TickSource {
        self.scheduler.source()
    }

    pub fn lens(&self, h: LensHandle) -> Option<&Lens> {
        self.lenses.get(h)
    }

    pub fn lenses(&self) -> impl Iterator<Item = (LensHandle, &Lens)> {
        self.lenses.iter()
    }

    /// Overlay opacity as of the last frame.
    pub fn overlay_opacity(&self) -> f32 {
        self.last_frame.map_or(0.0, |t| self.lenses.overlay_opacity(t))
    }

    pub fn drain_events(&mut self) -> Vec<LensEvent> {
        self.lenses.drain_events()
    }

    // ── lenses ────────────────────────────────────────────────────────────

    pub fn add_lens(&mut self, el: ElementId, options: LensOptions, now: Instant) -> LensHandle {
        let h = self.lenses.add(&self.host, el, options, now);
        log::debug!("lens {h:?} added for {el:?}");
        h
    }

    pub fn remove_lens(&mut self, h: LensHandle) -> bool {
        self.lenses.remove(h).is_some()
    }

    pub fn set_shadow(&mut self, h: LensHandle, enabled: bool) {
        self.lenses.set_shadow(h, enabled);
    }

    pub fn set_tilt(&mut self, h: LensHandle, enabled: bool) {
        self.lenses.set_tilt(h, enabled);
    }

    pub fn pointer_moved(&mut self, p: Vec2, now: Instant) {
        self.lenses.pointer_moved(&self.host, p, now);
    }

    pub fn pointer_left(&mut self, now: Instant) {
        self.lenses.pointer_left(now);
    }

    /// The host's mirror transition finished; tears the mirror down unless
    /// the fallback timer already did.
    pub fn mirror_transition_ended(&mut self, h: LensHandle) -> bool {
        self.lenses.mirror_transition_ended(h)
    }

    // ── dynamic content ───────────────────────────────────────────────────

    /// Starts tracking elements for incremental patching and requests a
    /// fresh snapshot.
    pub fn register_dynamic<'a>(&mut self, target: impl Into<DynamicTarget<'a>>) -> Vec<DynamicHandle> {
        let handles = match target.into() {
            DynamicTarget::Elements(els) => els.iter().filter_map(|el| self.tracker.register(&self.host, *el)).collect(),
            DynamicTarget::Selector(sel) => self.tracker.register_selector(&self.host, self.root, sel),
        };
        log::debug!("{} dynamic node(s) registered", handles.len());
        self.capture_requested = true;
        handles
    }

    /// Forwards an animation, transition, hover or mutation event of `el`.
    pub fn notify_node_event(&mut self, el: ElementId, event: &NodeEvent) -> bool {
        self.tracker.notify(el, event)
    }

    /// Viewport or snapshot root changed size. Acted on after a quiet period.
    pub fn notify_resize(&mut self, now: Instant) {
        self.resize.trigger(now);
    }

    // ── scheduling ────────────────────────────────────────────────────────

    /// Hands frame driving to an external ticker. `frame` stops producing
    /// plans; call `tick_external` instead.
    pub fn sync_with(&mut self, config: SyncConfig) {
        self.scheduler.sync_with(config);
    }

    /// Self-owned loop entry point.
    pub fn frame(&mut self, now: Instant) -> Option<FramePlan> {
        if self.scheduler.source() == TickSource::External {
            return None;
        }
        self.run_frame(now)
    }

    /// External ticker entry point: advances the scroll driver, then renders.
    pub fn tick_external(&mut self, now: Instant) -> Option<FramePlan> {
        self.scheduler.advance(now);
        self.run_frame(now)
    }

    fn run_frame(&mut self, now: Instant) -> Option<FramePlan> {
        self.last_frame = Some(now);

        for done in self.rasterizer.poll() {
            self.on_raster_done(done, now);
        }
        self.snapshot.poll_retry(&mut self.rasterizer, now);

        if self.resize.fire(now) {
            self.apply_resize();
        }
        if self.capture_requested {
            self.capture_requested = false;
            self.capture();
        }

        self.scroll.observe(self.host.scroll_offset(), now);
        self.lenses.tick(now);
        self.tracker.realtime_tick(now);
        self.tracker.purge_detached(&self.host);

        let base = self.snapshot.current().cloned()?;
        let tex_size = self.texture.size()?;
        let snap_origin = self.host.bounding_rect(self.root).map_or(Vec2::zero(), |r| r.origin);

        self.scroll.begin_frame();
        if !self.scroll.throttled() {
            let lens_rects = self.lenses.lens_rects();
            let frame = PatchFrame {
                base: &base,
                snap_origin,
                lens_rects: &lens_rects,
                max_lens_z: self.lenses.max_lens_z(),
                videos: &self.videos,
                scrolling: self.scroll.is_scrolling(),
            };
            update_videos(&self.host, &mut self.texture, &frame);
            self.tracker.update_nodes(
                &self.host,
                &mut self.rasterizer,
                self.composer.as_mut(),
                &mut self.texture,
                &frame,
            );
        }
        let composed = self.composer.drain();
        self.tracker.apply_composed(&mut self.texture, composed, base.generation);

        self.lenses.update_metrics(&self.host);

        let dpr = clamp_dpr(self.host.device_pixel_ratio());
        let viewport = self.host.viewport();
        let (canvas, scale) = if viewport.is_valid() {
            (viewport.device_size(dpr), dpr)
        } else {
            (Viewport::new(1.0, 1.0).device_size(1.0), 1.0)
        };
        let visual_offset = self.host.visual_viewport_offset();
        let time = now.saturating_duration_since(self.started_at).as_secs_f32();

        let mut draws = Vec::with_capacity(self.lenses.len());
        let mut mirrors = Vec::new();
        let mut mirror_clears = Vec::new();

        for (handle, lens) in self.lenses.iter() {
            if lens.reveal_phase() == RevealPhase::Queued {
                continue;
            }
            let Some(rect) = lens.rect() else { continue; };
            let dev = device_rect(rect, visual_offset, dpr);
            let Some(scissor) = scissor_rect(dev, canvas) else { continue; };

            let opts = lens.options();
            let uniforms = LensUniforms::from_inputs(&UniformInputs {
                device_rect: dev,
                uv_bounds: uv_bounds(rect, snap_origin, base.scale, tex_size),
                canvas,
                texture: tex_size,
                refraction: opts.refraction,
                bevel_depth: opts.bevel_depth,
                bevel_width: opts.bevel_width,
                frost: opts.frost,
                radius_device: lens.radius_device(),
                time,
                tilt: lens.tilt().angles(),
                magnify: opts.magnify,
                reveal_progress: lens.reveal_progress(),
                reveal_fade: opts.reveal == RevealMode::Fade,
                specular: opts.specular,
            });
            draws.push(LensDraw { handle, scissor, uniforms });

            if let Some(mut transform) = lens.tilt().mirror_transform(lens.radius_css()) {
                transform.clip = transform.clip.translate(visual_offset);
                transform.pivot = transform.pivot + visual_offset;
                mirrors.push(MirrorDraw { handle, transform });
                if let Some(clear) = mirror_clear_rect(rect, visual_offset, dpr, canvas) {
                    mirror_clears.push(clear);
                }
            }
        }

        Some(FramePlan {
            time,
            canvas,
            scale,
            draws,
            mirror_clears,
            mirrors,
            overlay_opacity: self.lenses.overlay_opacity(now),
            overlay_visible: self.overlay.is_visible(),
        })
    }

    fn on_raster_done(&mut self, done: RasterDone, now: Instant) {
        match done.tag {
            RasterTag::Snapshot { generation } => match self.snapshot.complete(generation, done.result, now) {
                CaptureOutcome::Applied(snap) => {
                    self.texture.upload_full(snap.pixels);
                    self.lenses.texture_ready(now);
                }
                CaptureOutcome::Retrying { attempt, retry_at } => {
                    log::debug!(
                        "snapshot attempt {attempt} scheduled in {:?}",
                        retry_at.saturating_duration_since(now)
                    );
                }
                CaptureOutcome::Stale | CaptureOutcome::Failed => {}
            },
            RasterTag::Dynamic { handle } => self.tracker.on_capture(handle, done.result),
        }
    }

    fn capture(&mut self) {
        let (full_width, full_height) = self.host.scroll_size(self.root);
        let spec = CaptureSpec {
            root: self.root,
            full_width,
            full_height,
            ignore: self.lenses.elements(),
        };
        let generation = self.snapshot.request(&mut self.rasterizer, spec);
        log::debug!("snapshot capture requested (generation {generation})");
    }

    fn apply_resize(&mut self) {
        if self.snapshot.is_capturing() || self.scroll.is_scrolling() {
            log::debug!("resize ignored: capture or scroll in progress");
            return;
        }
        if self.host.visual_viewport_scale() != 1.0 {
            log::debug!("resize ignored: visual viewport is zoomed");
            return;
        }
        self.tracker.invalidate_all();
        self.lenses.update_metrics(&self.host);
        self.capture_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::coords::{PixelRect, Rect};
    use crate::dynamic::OffloadPolicy;
    use crate::host::testing::{FakeHost, HeldComposer, Outcome, ScriptedRasterizer};
    use crate::texture::TextureWrite;
    use crate::host::RasterOptions;
    use crate::schedule::ScrollDriver;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn config() -> RendererConfig {
        RendererConfig::default().with_offload(OffloadPolicy::Inline).with_resolution(1.0)
    }

    fn renderer(t0: Instant) -> (Renderer<FakeHost, ScriptedRasterizer>, ElementId) {
        let mut host = FakeHost::new(400.0, 300.0);
        let lens_el = host.add(Rect::new(50.0, 40.0, 100.0, 80.0));
        host.el_mut(lens_el).z = 10;
        let mut r = Renderer::new(host, ScriptedRasterizer::new(), config(), t0);
        r.add_lens(lens_el, LensOptions::default(), t0);
        (r, lens_el)
    }

    fn snapshot_jobs(r: &Renderer<FakeHost, ScriptedRasterizer>) -> Vec<&RasterOptions> {
        r.rasterizer
            .submitted
            .iter()
            .filter(|j| matches!(j.tag, RasterTag::Snapshot { .. }))
            .map(|j| &j.options)
            .collect()
    }

    // ── texture readiness ─────────────────────────────────────────────────

    #[test]
    fn no_plan_until_first_snapshot() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        r.rasterizer.hold = true;
        assert!(r.frame(t0).is_none());
        assert!(r.frame(t0 + ms(16)).is_none());
        assert!(!r.overlay.is_visible());

        r.rasterizer.release(0);
        let plan = r.frame(t0 + ms(32)).unwrap();
        assert_eq!(plan.draws.len(), 1);
        assert!(plan.overlay_visible);
    }

    #[test]
    fn first_capture_leaves_out_lens_elements() {
        let t0 = Instant::now();
        let (mut r, lens_el) = renderer(t0);
        r.frame(t0);
        let jobs = snapshot_jobs(&r);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].ignore, vec![lens_el]);
        assert!(jobs[0].ignore_fixed);
    }

    #[test]
    fn fails_twice_then_succeeds_without_surfacing_an_error() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        r.rasterizer.push(Outcome::Fail);
        r.rasterizer.push(Outcome::Empty);

        assert!(r.frame(t0).is_none());
        assert!(r.frame(t0 + ms(16)).is_none());
        assert!(r.frame(t0 + ms(600)).is_none());
        assert!(r.frame(t0 + ms(616)).is_none());
        assert!(r.frame(t0 + ms(1200)).is_none());
        let plan = r.frame(t0 + ms(1216)).unwrap();

        assert_eq!(snapshot_jobs(&r).len(), 3);
        assert!(!r.snapshot().has_failed());
        assert_eq!(r.texture().size(), Some((400, 300)));
        assert_eq!(plan.draws.len(), 1);
    }

    #[test]
    fn permanent_failure_keeps_lenses_queued() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        for _ in 0..3 {
            r.rasterizer.push(Outcome::Fail);
        }
        let mut t = t0;
        for _ in 0..12 {
            assert!(r.frame(t).is_none());
            t += ms(300);
        }
        assert!(r.snapshot().has_failed());
        assert!(r.overlay.is_visible());
        let (_, lens) = r.lenses().next().unwrap();
        assert_eq!(lens.reveal_phase(), RevealPhase::Queued);
    }

    // ── draws ─────────────────────────────────────────────────────────────

    #[test]
    fn draw_uniforms_follow_layout() {
        let t0 = Instant::now();
        let (mut r, lens_el) = renderer(t0);
        r.host_mut().dpr = 2.0;
        r.frame(t0);
        let plan = r.frame(t0 + ms(16)).unwrap();
        let u = plan.draws[0].uniforms;
        assert_eq!(plan.canvas, (800, 600));
        assert_eq!(u.rect, [100.0, 80.0, 200.0, 160.0]);
        assert_eq!(u.texture_size, [400.0, 300.0]);
        assert_eq!(u.bounds, [50.0 / 400.0, 40.0 / 300.0, 100.0 / 400.0, 80.0 / 300.0]);

        r.host_mut().set_rect(lens_el, Rect::new(0.0, 0.0, 100.0, 80.0));
        let plan = r.frame(t0 + ms(32)).unwrap();
        assert_eq!(plan.draws[0].uniforms.rect, [0.0, 0.0, 200.0, 160.0]);
    }

    #[test]
    fn dense_display_canvas_is_capped_at_two() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        r.host_mut().dpr = 3.0;
        r.frame(t0);
        let plan = r.frame(t0 + ms(16)).unwrap();
        assert_eq!(plan.canvas, (800, 600));
        assert_eq!(plan.scale, 2.0);
        assert_eq!(plan.draws[0].uniforms.rect, [100.0, 80.0, 200.0, 160.0]);
    }

    #[test]
    fn overlapping_lenses_render_independently() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        let other = r.host_mut().add(Rect::new(100.0, 60.0, 100.0, 80.0));
        r.add_lens(other, LensOptions::default().with_refraction(0.3).with_frost(4.0), t0);

        r.frame(t0);
        let plan = r.frame(t0 + ms(16)).unwrap();
        assert_eq!(plan.draws.len(), 2);
        let (a, b) = (plan.draws[0].uniforms, plan.draws[1].uniforms);
        assert_ne!(a.bounds, b.bounds);
        assert_eq!((a.refraction, a.frost), (0.01, 0.0));
        assert_eq!((b.refraction, b.frost), (0.3, 4.0));
        assert_ne!(plan.draws[0].handle, plan.draws[1].handle);
    }

    #[test]
    fn lens_partly_offscreen_is_scissored_to_canvas() {
        let t0 = Instant::now();
        let (mut r, lens_el) = renderer(t0);
        r.host_mut().set_rect(lens_el, Rect::new(-30.0, 250.0, 100.0, 80.0));
        r.frame(t0);
        let plan = r.frame(t0 + ms(16)).unwrap();
        let d = plan.draws[0];
        assert_eq!((d.scissor.x, d.scissor.y, d.scissor.width, d.scissor.height), (0, 250, 70, 50));
        assert_eq!(d.uniforms.rect[0], -30.0);
    }

    #[test]
    fn reveal_fade_reaches_full_opacity() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        r.frame(t0);
        let plan = r.frame(t0 + ms(16)).unwrap();
        assert_eq!(plan.overlay_opacity, 0.0);
        assert_eq!(plan.draws[0].uniforms.reveal_fade, 1);

        let plan = r.frame(t0 + ms(1100)).unwrap();
        assert_eq!(plan.overlay_opacity, 1.0);
        assert_eq!(plan.draws[0].uniforms.reveal_progress, 1.0);
        assert_eq!(r.drain_events().len(), 1);
    }

    // ── tilt ──────────────────────────────────────────────────────────────

    #[test]
    fn tilt_mirror_adds_clear_rect() {
        let t0 = Instant::now();
        let mut host = FakeHost::new(400.0, 300.0);
        let el = host.add(Rect::new(50.0, 40.0, 100.0, 80.0));
        let mut r = Renderer::new(host, ScriptedRasterizer::new(), config(), t0);
        let h = r.add_lens(el, LensOptions::default().with_tilt(true, 10.0), t0);
        r.frame(t0);

        r.pointer_moved(Vec2::new(150.0, 80.0), t0 + ms(10));
        let plan = r.frame(t0 + ms(16)).unwrap();
        assert_eq!(plan.mirrors.len(), 1);
        assert_eq!(plan.mirrors[0].handle, h);
        assert_eq!(plan.draws[0].uniforms.tilt_y, 10.0);
        let c = plan.mirror_clears[0];
        assert_eq!((c.x, c.y, c.width, c.height), (48, 38, 104, 84));

        r.pointer_left(t0 + ms(20));
        assert!(r.mirror_transition_ended(h));
        let plan = r.frame(t0 + ms(32)).unwrap();
        assert!(plan.mirrors.is_empty());
        assert!(plan.mirror_clears.is_empty());
    }

    #[test]
    fn tilt_mirror_follows_visual_viewport_offset() {
        let t0 = Instant::now();
        let mut host = FakeHost::new(400.0, 300.0);
        let el = host.add(Rect::new(50.0, 40.0, 100.0, 80.0));
        host.vv_offset = Vec2::new(0.0, 6.0);
        let mut r = Renderer::new(host, ScriptedRasterizer::new(), config(), t0);
        r.add_lens(el, LensOptions::default().with_tilt(true, 10.0), t0);
        r.frame(t0);

        r.pointer_moved(Vec2::new(150.0, 80.0), t0 + ms(10));
        let plan = r.frame(t0 + ms(16)).unwrap();
        let s = plan.draws[0].scissor;
        assert_eq!((s.x, s.y, s.width, s.height), (50, 46, 100, 80));
        assert_eq!(plan.mirrors[0].transform.clip, Rect::new(50.0, 46.0, 100.0, 80.0));
        let c = plan.mirror_clears[0];
        assert_eq!((c.x, c.y, c.width, c.height), (48, 44, 104, 84));
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_is_debounced_and_recaptures() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        r.frame(t0);
        r.frame(t0 + ms(16));
        assert_eq!(snapshot_jobs(&r).len(), 1);

        r.notify_resize(t0 + ms(20));
        r.frame(t0 + ms(100));
        assert_eq!(snapshot_jobs(&r).len(), 1);
        r.frame(t0 + ms(300));
        assert_eq!(snapshot_jobs(&r).len(), 2);
    }

    #[test]
    fn resize_while_zoomed_is_ignored() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        r.frame(t0);
        r.frame(t0 + ms(16));
        r.host_mut().vv_scale = 1.5;
        r.notify_resize(t0 + ms(20));
        r.frame(t0 + ms(300));
        assert_eq!(snapshot_jobs(&r).len(), 1);
    }

    #[test]
    fn mobile_host_caps_capture_scale() {
        let t0 = Instant::now();
        let mut host = FakeHost::new(400.0, 5000.0);
        host.mobile = true;
        let cfg = RendererConfig::default().with_offload(OffloadPolicy::Inline);
        let mut r = Renderer::new(host, ScriptedRasterizer::new(), cfg, t0);
        r.frame(t0);
        let scale = snapshot_jobs(&r)[0].scale;
        assert!((5000.0 * scale - 4096.0).abs() < 1.0);
    }

    // ── dynamic ───────────────────────────────────────────────────────────

    #[test]
    fn register_dynamic_requests_recapture() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        r.frame(t0);
        r.frame(t0 + ms(16));
        let el = r.host_mut().add(Rect::new(60.0, 50.0, 20.0, 20.0));
        r.host_mut().tag(el, ".ticker");
        let handles = r.register_dynamic(".ticker");
        assert_eq!(handles.len(), 1);
        r.frame(t0 + ms(32));
        assert_eq!(snapshot_jobs(&r).len(), 2);
    }

    #[test]
    fn detached_node_is_purged() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        let el = r.host_mut().add(Rect::new(60.0, 50.0, 20.0, 20.0));
        r.register_dynamic(&[el][..]);
        r.frame(t0);
        r.frame(t0 + ms(16));
        assert_eq!(r.dynamic().len(), 1);

        r.host_mut().detach(el);
        r.frame(t0 + ms(32));
        assert!(r.dynamic().is_empty());
        assert!(!r.notify_node_event(el, &NodeEvent::ContentMutated));
    }

    #[test]
    fn offloaded_patch_lands_on_a_later_frame_without_erase() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        let composer = HeldComposer::default();
        r.composer = Box::new(composer.clone());
        let el = r.host_mut().add(Rect::new(60.0, 50.0, 20.0, 20.0));
        r.register_dynamic(&[el][..]);
        r.notify_node_event(el, &NodeEvent::AnimationStart);

        r.frame(t0);
        r.frame(t0 + ms(16));
        let before = r.texture().patch_count();

        // Capture arrives, patch goes to the worker and stays there.
        r.frame(t0 + ms(32));
        r.frame(t0 + ms(48));
        assert_eq!(composer.submitted(), 1);
        assert_eq!(r.texture().patch_count(), before);

        composer.finish();
        r.frame(t0 + ms(64));
        assert_eq!(r.texture().patch_count(), before + 1);
        let regions: Vec<PixelRect> = r
            .texture_mut()
            .drain_writes()
            .into_iter()
            .filter_map(|w| match w {
                TextureWrite::Region { dst, .. } => Some(dst),
                TextureWrite::Full(_) => None,
            })
            .collect();
        assert_eq!(regions, vec![PixelRect::new(60, 50, 20, 20)]);

        // Next redraw of the node erases nothing before the new patch.
        r.frame(t0 + ms(80));
        assert_eq!(composer.submitted(), 2);
        assert_eq!(r.texture().patch_count(), before + 1);
    }

    #[test]
    fn dynamic_patch_lands_in_texture() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        let el = r.host_mut().add(Rect::new(60.0, 50.0, 20.0, 20.0));
        r.register_dynamic(&[el][..]);
        r.frame(t0);
        r.frame(t0 + ms(16));
        r.frame(t0 + ms(32));
        assert!(r.texture().patch_count() >= 1);
    }

    // ── scheduling ────────────────────────────────────────────────────────

    struct Scroller;

    impl ScrollDriver for Scroller {
        fn advance(&mut self, _now: Instant) {}
    }

    #[test]
    fn scrolling_patches_videos_every_other_frame() {
        let t0 = Instant::now();
        let mut host = FakeHost::new(400.0, 300.0);
        let lens_el = host.add(Rect::new(50.0, 40.0, 100.0, 80.0));
        host.el_mut(lens_el).z = 10;
        host.add_video(Rect::new(60.0, 50.0, 20.0, 20.0), Some(RgbaImage::from_pixel(4, 4, Rgba([0, 200, 0, 255]))));
        let mut r = Renderer::new(host, ScriptedRasterizer::new(), config(), t0);
        r.add_lens(lens_el, LensOptions::default(), t0);

        r.frame(t0);
        let mut counts = Vec::new();
        for i in 1..=5u64 {
            if i >= 2 {
                r.host_mut().scroll = Vec2::new(0.0, 10.0 * i as f32);
            }
            r.frame(t0 + ms(16 * i));
            counts.push(r.texture().patch_count());
        }
        assert_eq!(counts, vec![1, 1, 2, 2, 3]);
    }

    #[test]
    fn external_ticker_takes_over() {
        let t0 = Instant::now();
        let (mut r, _) = renderer(t0);
        r.sync_with(SyncConfig { scroll_driver: Some(Box::new(Scroller)), external_ticker: true });
        assert_eq!(r.tick_source(), TickSource::External);
        assert!(r.frame(t0).is_none());
        assert!(r.rasterizer.submitted.is_empty());

        r.tick_external(t0);
        assert!(r.tick_external(t0 + ms(16)).is_some());
    }
}
