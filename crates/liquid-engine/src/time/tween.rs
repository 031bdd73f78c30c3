use std::time::{Duration, Instant};

/// Interpolation curve.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Easing {
    Linear,
    /// `cubic-bezier(0.33, 1, 0.68, 1)`, i.e. ease-out cubic.
    OutCubic,
}

impl Easing {
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Fixed-duration interpolation from `from` to `to`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tween {
    start: Instant,
    duration: Duration,
    from: f32,
    to: f32,
    easing: Easing,
}

impl Tween {
    pub fn new(start: Instant, duration: Duration, from: f32, to: f32, easing: Easing) -> Self {
        Self { start, duration, from, to, easing }
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn value(&self, now: Instant) -> f32 {
        let t = self.easing.apply(self.progress(now));
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    pub fn target(&self) -> f32 {
        self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_midpoint() {
        let t0 = Instant::now();
        let tw = Tween::new(t0, Duration::from_millis(1000), 0.0, 1.0, Easing::Linear);
        assert!((tw.value(t0 + Duration::from_millis(500)) - 0.5).abs() < 1e-4);
        assert!(!tw.is_finished(t0 + Duration::from_millis(999)));
        assert!(tw.is_finished(t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn out_cubic_reaches_target_and_leads_linear() {
        let t0 = Instant::now();
        let tw = Tween::new(t0, Duration::from_millis(400), 10.0, 0.0, Easing::OutCubic);
        assert!(tw.value(t0 + Duration::from_millis(100)) < 7.5);
        assert_eq!(tw.value(t0 + Duration::from_secs(1)), 0.0);
    }

    #[test]
    fn zero_duration_is_immediately_done() {
        let t0 = Instant::now();
        let tw = Tween::new(t0, Duration::ZERO, 0.0, 3.0, Easing::Linear);
        assert_eq!(tw.value(t0), 3.0);
    }
}
