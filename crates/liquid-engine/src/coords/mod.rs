//! Coordinate and geometry types shared by the lens core and the GPU layer.
//!
//! Three spaces are in play:
//! - CSS pixels (`Rect`, `Vec2`): host layout space, viewport-relative, +Y down
//! - device pixels: CSS pixels multiplied by the clamped device pixel ratio
//! - texture pixels (`PixelRect`): CSS pixels relative to the snapshot root,
//!   multiplied by the capture scale
//!
//! Conversions between them live in `geometry`.

mod affine;
mod color;
mod corner_radii;
mod pixel_rect;
mod rect;
mod vec2;
mod viewport;

pub use affine::Affine2;
pub use color::ColorRgba;
pub use corner_radii::CornerRadii;
pub use pixel_rect::{ClippedRegion, PixelRect};
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
