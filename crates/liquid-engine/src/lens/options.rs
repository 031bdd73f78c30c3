/// How a lens becomes visible once the first snapshot is ready.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum RevealMode {
    /// Visible immediately.
    None,
    /// Faded in over the shared reveal tween.
    #[default]
    Fade,
}

/// Per-lens shader parameters.
///
/// Out-of-range values are clamped by [`LensOptions::clamped`]; non-finite
/// values fall back to the defaults.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LensOptions {
    /// Edge refraction strength.
    pub refraction: f32,
    /// Extra displacement right at the rim.
    pub bevel_depth: f32,
    /// Width of the refracting rim, as a fraction of the smaller side.
    pub bevel_width: f32,
    /// Frost blur radius; 0 disables it.
    pub frost: f32,
    pub shadow: bool,
    pub specular: bool,
    pub reveal: RevealMode,
    pub tilt: bool,
    /// Maximum tilt in degrees.
    pub tilt_factor: f32,
    pub magnify: f32,
}

impl Default for LensOptions {
    fn default() -> Self {
        Self {
            refraction: 0.01,
            bevel_depth: 0.08,
            bevel_width: 0.15,
            frost: 0.0,
            shadow: true,
            specular: true,
            reveal: RevealMode::Fade,
            tilt: false,
            tilt_factor: 5.0,
            magnify: 1.0,
        }
    }
}

pub const MAGNIFY_RANGE: (f32, f32) = (0.001, 3.0);
pub const FROST_MAX: f32 = 32.0;
pub const TILT_FACTOR_MAX: f32 = 45.0;

fn clamp_or(v: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if v.is_finite() { v.clamp(lo, hi) } else { fallback }
}

impl LensOptions {
    pub fn clamped(self) -> Self {
        let d = Self::default();
        Self {
            refraction: clamp_or(self.refraction, 0.0, 1.0, d.refraction),
            bevel_depth: clamp_or(self.bevel_depth, 0.0, 1.0, d.bevel_depth),
            bevel_width: clamp_or(self.bevel_width, 0.0, 1.0, d.bevel_width),
            frost: clamp_or(self.frost, 0.0, FROST_MAX, d.frost),
            tilt_factor: clamp_or(self.tilt_factor, 0.0, TILT_FACTOR_MAX, d.tilt_factor),
            magnify: clamp_or(self.magnify, MAGNIFY_RANGE.0, MAGNIFY_RANGE.1, d.magnify),
            ..self
        }
    }

    pub fn with_frost(mut self, frost: f32) -> Self {
        self.frost = frost;
        self
    }

    pub fn with_magnify(mut self, magnify: f32) -> Self {
        self.magnify = magnify;
        self
    }

    pub fn with_tilt(mut self, tilt: bool, factor: f32) -> Self {
        self.tilt = tilt;
        self.tilt_factor = factor;
        self
    }

    pub fn with_refraction(mut self, refraction: f32) -> Self {
        self.refraction = refraction;
        self
    }

    pub fn with_reveal(mut self, reveal: RevealMode) -> Self {
        self.reveal = reveal;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_clamping() {
        assert_eq!(LensOptions::default().clamped(), LensOptions::default());
    }

    #[test]
    fn magnify_is_clamped() {
        assert_eq!(LensOptions::default().with_magnify(5.0).clamped().magnify, 3.0);
        assert_eq!(LensOptions::default().with_magnify(0.0).clamped().magnify, 0.001);
    }

    #[test]
    fn non_finite_falls_back_to_default() {
        let o = LensOptions { refraction: f32::NAN, frost: f32::INFINITY, ..Default::default() }.clamped();
        assert_eq!(o.refraction, 0.01);
        assert_eq!(o.frost, 0.0);
    }

    #[test]
    fn negative_values_clamp_to_zero() {
        let o = LensOptions { bevel_width: -1.0, tilt_factor: 90.0, ..Default::default() }.clamped();
        assert_eq!(o.bevel_width, 0.0);
        assert_eq!(o.tilt_factor, 45.0);
    }
}
