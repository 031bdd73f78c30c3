/// Lower bound for any capture scale.
pub const MIN_CAPTURE_SCALE: f32 = 0.1;

/// Computes the capture scale for a snapshot root of `full_w × full_h` CSS px.
///
/// The result keeps the larger side within `max_texture_dim`, and within
/// `mobile_cap` when the host is a constrained mobile browser. It never drops
/// below [`MIN_CAPTURE_SCALE`].
pub fn capture_scale(
    full_w: f32,
    full_h: f32,
    resolution: f32,
    max_texture_dim: u32,
    mobile_cap: Option<u32>,
) -> f32 {
    let max_tex = max_texture_dim.max(1) as f32;
    let mut scale = resolution;
    if full_w > 0.0 {
        scale = scale.min(max_tex / full_w);
    }
    if full_h > 0.0 {
        scale = scale.min(max_tex / full_h);
    }

    if let Some(cap) = mobile_cap {
        let over = full_w.max(full_h) * scale / cap.max(1) as f32;
        if over > 1.0 {
            scale /= over;
        }
    }

    if scale.is_finite() { scale.max(MIN_CAPTURE_SCALE) } else { MIN_CAPTURE_SCALE }
}
