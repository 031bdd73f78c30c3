use super::Vec2;

/// 2D affine transform in canvas order `[a, b, c, d, e, f]`:
///
/// ```text
/// x' = a*x + c*y + e
/// y' = b*x + d*y + f
/// ```
///
/// Used for the computed CSS transform of dynamic elements when compositing
/// their patches.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2 {
    pub m: [f32; 6],
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine2 {
    #[inline]
    pub const fn identity() -> Self {
        Self { m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0] }
    }

    #[inline]
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { m: [a, b, c, d, e, f] }
    }

    #[inline]
    pub fn translation(x: f32, y: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// `self ∘ rhs`: applies `rhs` first, then `self`.
    pub fn then_apply(&self, rhs: &Affine2) -> Affine2 {
        let [a, b, c, d, e, f] = self.m;
        let [a2, b2, c2, d2, e2, f2] = rhs.m;
        Affine2::new(
            a * a2 + c * b2,
            b * a2 + d * b2,
            a * c2 + c * d2,
            b * c2 + d * d2,
            a * e2 + c * f2 + e,
            b * e2 + d * f2 + f,
        )
    }

    #[inline]
    pub fn apply(&self, p: Vec2) -> Vec2 {
        let [a, b, c, d, e, f] = self.m;
        Vec2::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Inverse transform; `None` for singular matrices (e.g. `scale(0)`).
    pub fn inverse(&self) -> Option<Affine2> {
        let [a, b, c, d, e, f] = self.m;
        let det = a * d - b * c;
        if det.abs() < 1e-8 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Affine2::new(
            d * inv,
            -b * inv,
            -c * inv,
            a * inv,
            (c * f - d * e) * inv,
            (b * e - a * f) * inv,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_round_trips_point() {
        let t = Affine2::new(2.0, 0.5, -0.25, 1.5, 3.0, -7.0);
        let inv = t.inverse().unwrap();
        let p = Vec2::new(4.0, -2.0);
        let q = inv.apply(t.apply(p));
        assert!((q.x - p.x).abs() < 1e-4 && (q.y - p.y).abs() < 1e-4);
    }

    #[test]
    fn singular_has_no_inverse() {
        assert!(Affine2::new(0.0, 0.0, 0.0, 0.0, 1.0, 1.0).inverse().is_none());
    }

    #[test]
    fn composition_order() {
        let t = Affine2::translation(5.0, 0.0);
        let s = Affine2::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        // Scale first, then translate.
        assert_eq!(t.then_apply(&s).apply(Vec2::new(1.0, 1.0)), Vec2::new(7.0, 2.0));
    }
}
