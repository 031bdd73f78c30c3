//! Dynamic Region Tracker.
//!
//! Keeps the shared snapshot texture current for elements that change on
//! their own (animations, transitions, hover, videos) without recapturing the
//! whole page. Each tracked node is rasterized on its own and composited over
//! the static base snapshot into a small patch.

mod compose;
mod composer;
mod node;
mod tracker;
mod video;

pub use compose::{clip_rounded, compose, compose_video, crop_padded, ComposeJob, ComposedPatch, VideoLayer};
pub use composer::{negotiate_composer, InlineComposer, OffloadPolicy, PatchComposer, ThreadedComposer};
pub use node::{is_heavy_property, DynamicHandle, DynamicNode, NodeEvent, NodeState, REALTIME_CAPTURE_INTERVAL};
pub use tracker::{DynamicTracker, PatchFrame};
pub use video::update_videos;
