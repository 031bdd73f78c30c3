use std::time::{Duration, Instant};

use crate::arena::Arena;
use crate::coords::{Rect, Vec2};
use crate::host::{ElementId, SceneHost};
use crate::time::{Easing, Tween};

use super::options::{LensOptions, RevealMode};
use super::state::{Lens, LensHandle, RevealPhase};

/// Length of the shared fade-in.
pub const REVEAL_FADE_DURATION: Duration = Duration::from_millis(1000);

/// Notifications for the embedding application.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LensEvent {
    /// The lens finished revealing. Emitted once per lens.
    Initialized(LensHandle),
    /// The tilt mirror of this lens was torn down.
    MirrorRemoved(LensHandle),
}

/// Every active lens plus the shared reveal state.
#[derive(Debug, Default)]
pub struct LensRegistry {
    lenses: Arena<LensHandle, Lens>,
    fade: Option<Tween>,
    revealed_any: bool,
    texture_ready: bool,
    events: Vec<LensEvent>,
}

impl LensRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lenses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lenses.len() == 0
    }

    pub fn get(&self, h: LensHandle) -> Option<&Lens> {
        self.lenses.get(h)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LensHandle, &Lens)> {
        self.lenses.iter()
    }

    pub fn handles(&self) -> Vec<LensHandle> {
        self.lenses.keys()
    }

    /// Lens elements, for the snapshot ignore list.
    pub fn elements(&self) -> Vec<ElementId> {
        self.lenses.iter().map(|(_, l)| l.element).collect()
    }

    /// Registers a lens. It is revealed right away when a texture exists,
    /// otherwise queued until the first snapshot lands.
    pub fn add<H: SceneHost>(&mut self, host: &H, el: ElementId, options: LensOptions, now: Instant) -> LensHandle {
        let mut lens = Lens::new(el, options);
        lens.update_metrics(host);
        let h = self.lenses.insert(lens);
        if self.texture_ready {
            self.reveal(h, now);
        }
        h
    }

    pub fn remove(&mut self, h: LensHandle) -> Option<Lens> {
        self.lenses.remove(h)
    }

    /// First snapshot is on the GPU: reveal everything queued.
    pub fn texture_ready(&mut self, now: Instant) {
        if self.texture_ready {
            return;
        }
        self.texture_ready = true;
        let queued: Vec<LensHandle> = self
            .lenses
            .iter()
            .filter(|(_, l)| l.phase == RevealPhase::Queued)
            .map(|(h, _)| h)
            .collect();
        for h in queued {
            self.reveal(h, now);
        }
    }

    fn reveal(&mut self, h: LensHandle, now: Instant) {
        let running = self.fade.filter(|tw| !tw.is_finished(now));
        let Some(lens) = self.lenses.get_mut(h) else { return; };
        self.revealed_any = true;

        match lens.options.reveal {
            RevealMode::None => {
                lens.phase = RevealPhase::Visible;
                lens.progress = 1.0;
                if !lens.initialized {
                    lens.initialized = true;
                    self.events.push(LensEvent::Initialized(h));
                }
            }
            RevealMode::Fade => {
                lens.phase = RevealPhase::Fading;
                lens.progress = running.map_or(0.0, |tw| tw.value(now));
                if running.is_none() {
                    self.fade = Some(Tween::new(now, REVEAL_FADE_DURATION, 0.0, 1.0, Easing::Linear));
                }
            }
        }
        lens.sync_shadow();
    }

    /// Advances the reveal fade and every tilt.
    pub fn tick(&mut self, now: Instant) {
        if let Some(fade) = self.fade {
            let v = fade.value(now);
            let done = fade.is_finished(now);
            for (h, lens) in self.lenses.iter_mut() {
                if lens.phase != RevealPhase::Fading {
                    continue;
                }
                lens.progress = v;
                if done {
                    lens.phase = RevealPhase::Visible;
                    lens.progress = 1.0;
                    if !lens.initialized {
                        lens.initialized = true;
                        self.events.push(LensEvent::Initialized(h));
                    }
                }
                lens.sync_shadow();
            }
            if done {
                self.fade = None;
            }
        }

        for (h, lens) in self.lenses.iter_mut() {
            if lens.tilt.tick(now) {
                self.events.push(LensEvent::MirrorRemoved(h));
            }
        }
    }

    /// Overlay canvas opacity: follows the fade, 0 before any reveal.
    pub fn overlay_opacity(&self, now: Instant) -> f32 {
        match self.fade {
            Some(tw) => tw.value(now),
            None if self.revealed_any => 1.0,
            None => 0.0,
        }
    }

    pub fn update_metrics<H: SceneHost>(&mut self, host: &H) {
        for (_, lens) in self.lenses.iter_mut() {
            lens.update_metrics(host);
        }
    }

    /// Highest lens z-index, never below 0.
    pub fn max_lens_z(&self) -> i32 {
        self.lenses.iter().map(|(_, l)| l.z()).fold(0, i32::max)
    }

    pub fn lens_rects(&self) -> Vec<Rect> {
        self.lenses.iter().filter_map(|(_, l)| l.rect()).collect()
    }

    /// Routes a document-level pointer position to every tilt lens.
    pub fn pointer_moved<H: SceneHost>(&mut self, host: &H, p: Vec2, now: Instant) {
        for (_, lens) in self.lenses.iter_mut() {
            if !lens.options.tilt {
                continue;
            }
            let Some(live) = host.bounding_rect(lens.element).or(lens.rect()) else { continue; };
            if live.contains_inclusive(p) {
                if !lens.tilt.is_interacting() {
                    lens.tilt.enter(live);
                }
                lens.tilt.apply(p, lens.options.tilt_factor);
            } else if lens.tilt.is_interacting() {
                lens.tilt.leave(now);
            }
        }
    }

    /// Pointer left the window.
    pub fn pointer_left(&mut self, now: Instant) {
        for (_, lens) in self.lenses.iter_mut() {
            lens.tilt.leave(now);
        }
    }

    /// The host finished the mirror's return transition.
    pub fn mirror_transition_ended(&mut self, h: LensHandle) -> bool {
        let Some(lens) = self.lenses.get_mut(h) else { return false; };
        let removed = lens.tilt.transition_ended();
        if removed {
            self.events.push(LensEvent::MirrorRemoved(h));
        }
        removed
    }

    pub fn set_shadow(&mut self, h: LensHandle, enabled: bool) {
        if let Some(lens) = self.lenses.get_mut(h) {
            lens.set_shadow(enabled);
        }
    }

    pub fn set_tilt(&mut self, h: LensHandle, enabled: bool) {
        let Some(lens) = self.lenses.get_mut(h) else { return; };
        lens.options.tilt = enabled;
        if !enabled {
            let had_mirror = lens.tilt.mirror_rect().is_some();
            lens.tilt.disable();
            if had_mirror {
                self.events.push(LensEvent::MirrorRemoved(h));
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<LensEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::FakeHost;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn host_with(rects: &[Rect]) -> (FakeHost, Vec<ElementId>) {
        let mut host = FakeHost::new(800.0, 600.0);
        let ids = rects.iter().map(|r| host.add(*r)).collect();
        (host, ids)
    }

    // ── reveal ────────────────────────────────────────────────────────────

    #[test]
    fn lenses_wait_for_first_texture() {
        let t0 = Instant::now();
        let (host, ids) = host_with(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        let mut reg = LensRegistry::new();
        let h = reg.add(&host, ids[0], LensOptions::default(), t0);
        reg.tick(t0 + ms(5000));
        assert_eq!(reg.get(h).unwrap().reveal_phase(), RevealPhase::Queued);
        assert_eq!(reg.overlay_opacity(t0), 0.0);
        assert!(reg.drain_events().is_empty());
    }

    #[test]
    fn fade_reveal_is_shared_and_emits_init_once() {
        let t0 = Instant::now();
        let (host, ids) = host_with(&[Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(20.0, 0.0, 10.0, 10.0)]);
        let mut reg = LensRegistry::new();
        let a = reg.add(&host, ids[0], LensOptions::default(), t0);
        let b = reg.add(&host, ids[1], LensOptions::default(), t0);

        reg.texture_ready(t0);
        reg.tick(t0 + ms(500));
        assert!((reg.get(a).unwrap().reveal_progress() - 0.5).abs() < 1e-3);
        assert_eq!(reg.get(a).unwrap().reveal_progress(), reg.get(b).unwrap().reveal_progress());
        assert!((reg.overlay_opacity(t0 + ms(500)) - 0.5).abs() < 1e-3);

        reg.tick(t0 + ms(1000));
        assert_eq!(reg.get(a).unwrap().reveal_phase(), RevealPhase::Visible);
        assert_eq!(reg.overlay_opacity(t0 + ms(1000)), 1.0);
        let events = reg.drain_events();
        assert_eq!(events, vec![LensEvent::Initialized(a), LensEvent::Initialized(b)]);

        reg.tick(t0 + ms(2000));
        assert!(reg.drain_events().is_empty());
    }

    #[test]
    fn instant_reveal_after_texture() {
        let t0 = Instant::now();
        let (host, ids) = host_with(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        let mut reg = LensRegistry::new();
        reg.texture_ready(t0);
        let h = reg.add(&host, ids[0], LensOptions::default().with_reveal(RevealMode::None), t0);
        assert_eq!(reg.get(h).unwrap().reveal_progress(), 1.0);
        assert_eq!(reg.drain_events(), vec![LensEvent::Initialized(h)]);
    }

    #[test]
    fn magnify_is_clamped_on_add() {
        let t0 = Instant::now();
        let (host, ids) = host_with(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        let mut reg = LensRegistry::new();
        let h = reg.add(&host, ids[0], LensOptions::default().with_magnify(5.0), t0);
        assert_eq!(reg.get(h).unwrap().options().magnify, 3.0);
    }

    // ── removal ───────────────────────────────────────────────────────────

    #[test]
    fn removed_handle_no_longer_resolves() {
        let t0 = Instant::now();
        let (host, ids) = host_with(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        let mut reg = LensRegistry::new();
        let h = reg.add(&host, ids[0], LensOptions::default(), t0);
        assert!(reg.remove(h).is_some());
        assert!(reg.get(h).is_none());
        assert!(reg.is_empty());
    }

    // ── z / rects ─────────────────────────────────────────────────────────

    #[test]
    fn max_lens_z_tracks_highest() {
        let t0 = Instant::now();
        let (mut host, ids) = host_with(&[Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(0.0, 0.0, 5.0, 5.0)]);
        host.el_mut(ids[0]).z = 3;
        host.el_mut(ids[1]).z = 7;
        let mut reg = LensRegistry::new();
        reg.add(&host, ids[0], LensOptions::default(), t0);
        reg.add(&host, ids[1], LensOptions::default(), t0);
        assert_eq!(reg.max_lens_z(), 7);
        assert_eq!(reg.lens_rects().len(), 2);
    }

    // ── tilt routing ──────────────────────────────────────────────────────

    #[test]
    fn pointer_enter_and_leave_drive_tilt() {
        let t0 = Instant::now();
        let (host, ids) = host_with(&[Rect::new(100.0, 100.0, 100.0, 100.0)]);
        let mut reg = LensRegistry::new();
        let h = reg.add(&host, ids[0], LensOptions::default().with_tilt(true, 10.0), t0);

        reg.pointer_moved(&host, Vec2::new(200.0, 150.0), t0);
        let lens = reg.get(h).unwrap();
        assert!(lens.tilt().is_interacting());
        assert_eq!(lens.tilt().angles(), (0.0, 10.0));

        reg.pointer_moved(&host, Vec2::new(400.0, 150.0), t0);
        assert!(reg.get(h).unwrap().tilt().teardown_pending());

        reg.tick(t0 + ms(350));
        assert_eq!(reg.drain_events(), vec![LensEvent::MirrorRemoved(h)]);
        assert!(!reg.mirror_transition_ended(h));
    }

    #[test]
    fn non_tilt_lens_ignores_pointer() {
        let t0 = Instant::now();
        let (host, ids) = host_with(&[Rect::new(0.0, 0.0, 100.0, 100.0)]);
        let mut reg = LensRegistry::new();
        let h = reg.add(&host, ids[0], LensOptions::default(), t0);
        reg.pointer_moved(&host, Vec2::new(50.0, 50.0), t0);
        assert!(reg.get(h).unwrap().tilt().mirror_rect().is_none());
    }

    #[test]
    fn disabling_tilt_drops_mirror() {
        let t0 = Instant::now();
        let (host, ids) = host_with(&[Rect::new(0.0, 0.0, 100.0, 100.0)]);
        let mut reg = LensRegistry::new();
        let h = reg.add(&host, ids[0], LensOptions::default().with_tilt(true, 5.0), t0);
        reg.pointer_moved(&host, Vec2::new(50.0, 50.0), t0);
        reg.set_tilt(h, false);
        assert!(reg.get(h).unwrap().tilt().mirror_rect().is_none());
        assert_eq!(reg.drain_events(), vec![LensEvent::MirrorRemoved(h)]);
    }
}
