//! Lens instances: options, layout metrics, reveal and pointer tilt.

mod options;
mod registry;
mod state;
mod tilt;

pub use options::{LensOptions, RevealMode, FROST_MAX, MAGNIFY_RANGE, TILT_FACTOR_MAX};
pub use registry::{LensEvent, LensRegistry, REVEAL_FADE_DURATION};
pub use state::{Lens, LensHandle, RevealPhase, ShadowCompanion};
pub use tilt::{MirrorTransform, TiltState, MIRROR_CLEANUP_TIMEOUT, TILT_PERSPECTIVE, TILT_RESET_DURATION};
