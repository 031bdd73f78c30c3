use std::time::{Duration, Instant};

use crate::coords::{Rect, Vec2};
use crate::time::{Easing, Tween};

/// CSS perspective distance of the tilt transform.
pub const TILT_PERSPECTIVE: f32 = 800.0;
/// Duration of the return-to-flat tween after the pointer leaves.
pub const TILT_RESET_DURATION: Duration = Duration::from_millis(400);
/// Mirror teardown fallback when no transition-end notification arrives.
pub const MIRROR_CLEANUP_TIMEOUT: Duration = Duration::from_millis(350);

/// Presentation of a tilt mirror: a copy of the composited overlay shown
/// through a perspective rotation about the lens centre.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MirrorTransform {
    /// Rotation pivot, CSS px.
    pub pivot: Vec2,
    /// Degrees.
    pub rotate_x: f32,
    pub rotate_y: f32,
    pub perspective: f32,
    /// Frozen lens rectangle the mirror is clipped to, CSS px.
    pub clip: Rect,
    /// Clip corner radius, CSS px.
    pub radius: f32,
}

/// Pointer-driven tilt of one lens.
///
/// While the pointer is inside, a mirror is active and the lens rectangle is
/// frozen at its value on entry. Leaving starts a tween back to flat and a
/// mirror teardown that completes on whichever comes first: the 350 ms timer
/// or [`TiltState::transition_ended`].
#[derive(Debug, Clone, Default)]
pub struct TiltState {
    rot_x: f32,
    rot_y: f32,
    interacting: bool,
    mirror: Option<Rect>,
    reset: Option<(Tween, Tween)>,
    cleanup_at: Option<Instant>,
}

impl TiltState {
    /// Current `(rot_x, rot_y)` in degrees.
    #[inline]
    pub fn angles(&self) -> (f32, f32) {
        (self.rot_x, self.rot_y)
    }

    #[inline]
    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    /// Frozen rectangle while a mirror exists.
    #[inline]
    pub fn mirror_rect(&self) -> Option<Rect> {
        self.mirror
    }

    #[inline]
    pub fn teardown_pending(&self) -> bool {
        self.cleanup_at.is_some()
    }

    /// Pointer entered. A pending teardown is cancelled and its mirror
    /// destroyed before a fresh mirror is created.
    pub fn enter(&mut self, current: Rect) {
        if self.teardown_pending() {
            self.destroy_mirror();
        }
        self.interacting = true;
        self.reset = None;
        self.mirror = Some(current);
    }

    /// Tilts toward `pointer`, proportional to its offset from the centre.
    pub fn apply(&mut self, pointer: Vec2, max_deg: f32) {
        let Some(r) = self.mirror else { return; };
        let c = r.center();
        let half_w = (r.size.x * 0.5).max(f32::EPSILON);
        let half_h = (r.size.y * 0.5).max(f32::EPSILON);
        let pct_x = ((pointer.x - c.x) / half_w).clamp(-1.0, 1.0);
        let pct_y = ((pointer.y - c.y) / half_h).clamp(-1.0, 1.0);
        self.rot_y = pct_x * max_deg;
        self.rot_x = -pct_y * max_deg;
    }

    /// Pointer left: ease back to flat and schedule the mirror teardown.
    pub fn leave(&mut self, now: Instant) {
        if !self.interacting {
            return;
        }
        self.interacting = false;
        self.reset = Some((
            Tween::new(now, TILT_RESET_DURATION, self.rot_x, 0.0, Easing::OutCubic),
            Tween::new(now, TILT_RESET_DURATION, self.rot_y, 0.0, Easing::OutCubic),
        ));
        if self.mirror.is_some() {
            self.cleanup_at = Some(now + MIRROR_CLEANUP_TIMEOUT);
        }
    }

    /// Advances the reset tween and the fallback timer.
    ///
    /// Returns true when this call tore the mirror down.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some((tx, ty)) = self.reset {
            self.rot_x = tx.value(now);
            self.rot_y = ty.value(now);
            if tx.is_finished(now) && ty.is_finished(now) {
                self.reset = None;
            }
        }
        match self.cleanup_at {
            Some(at) if now >= at => {
                self.destroy_mirror();
                true
            }
            _ => false,
        }
    }

    /// The mirror's return transition finished. No-op unless a teardown is
    /// pending.
    pub fn transition_ended(&mut self) -> bool {
        if self.teardown_pending() {
            self.destroy_mirror();
            true
        } else {
            false
        }
    }

    /// Tilt switched off: back to flat immediately.
    pub fn disable(&mut self) {
        *self = Self::default();
    }

    pub fn mirror_transform(&self, radius: f32) -> Option<MirrorTransform> {
        let clip = self.mirror?;
        Some(MirrorTransform {
            pivot: clip.center(),
            rotate_x: self.rot_x,
            rotate_y: self.rot_y,
            perspective: TILT_PERSPECTIVE,
            clip,
            radius,
        })
    }

    fn destroy_mirror(&mut self) {
        self.mirror = None;
        self.cleanup_at = None;
    }
}
