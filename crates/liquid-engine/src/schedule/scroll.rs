use std::time::{Duration, Instant};

use crate::coords::Vec2;

/// Time without scroll movement after which scrolling is considered over.
pub const SCROLL_SETTLE: Duration = Duration::from_millis(200);

/// Polls the document scroll offset once per frame.
///
/// While scrolling, expensive per-frame work (video and dynamic-node patches)
/// runs only on every other rendered frame.
#[derive(Debug, Clone, Default)]
pub struct ScrollTracker {
    last_offset: Option<Vec2>,
    settle_at: Option<Instant>,
    counter: u64,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the current offset. Any change restarts the settle timer.
    pub fn observe(&mut self, offset: Vec2, now: Instant) {
        match self.last_offset {
            Some(prev) if prev != offset => {
                self.settle_at = Some(now + SCROLL_SETTLE);
            }
            _ => {}
        }
        self.last_offset = Some(offset);

        if self.settle_at.is_some_and(|at| now >= at) {
            self.settle_at = None;
        }
    }

    #[inline]
    pub fn is_scrolling(&self) -> bool {
        self.settle_at.is_some()
    }

    /// Counts a rendered frame while scrolling.
    pub fn begin_frame(&mut self) {
        if self.is_scrolling() {
            self.counter = self.counter.wrapping_add(1);
        }
    }

    /// Expensive work skips this frame.
    #[inline]
    pub fn throttled(&self) -> bool {
        self.is_scrolling() && self.counter % 2 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn first_observation_is_not_scrolling() {
        let mut s = ScrollTracker::new();
        s.observe(Vec2::new(0.0, 500.0), Instant::now());
        assert!(!s.is_scrolling());
    }

    #[test]
    fn settles_200ms_after_last_change() {
        let t0 = Instant::now();
        let mut s = ScrollTracker::new();
        s.observe(Vec2::zero(), t0);
        s.observe(Vec2::new(0.0, 10.0), t0 + ms(16));
        assert!(s.is_scrolling());
        s.observe(Vec2::new(0.0, 10.0), t0 + ms(200));
        assert!(s.is_scrolling());
        s.observe(Vec2::new(0.0, 10.0), t0 + ms(216));
        assert!(!s.is_scrolling());
    }

    #[test]
    fn throttles_every_other_frame() {
        let t0 = Instant::now();
        let mut s = ScrollTracker::new();
        s.observe(Vec2::zero(), t0);
        s.observe(Vec2::new(0.0, 5.0), t0);

        let mut ran = Vec::new();
        for _ in 0..4 {
            s.begin_frame();
            ran.push(!s.throttled());
        }
        assert_eq!(ran, vec![false, true, false, true]);
    }

    #[test]
    fn idle_frames_are_never_throttled() {
        let mut s = ScrollTracker::new();
        s.begin_frame();
        s.begin_frame();
        s.begin_frame();
        assert!(!s.throttled());
    }
}
