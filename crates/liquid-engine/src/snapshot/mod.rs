//! Snapshot Store.
//!
//! Owns the single rasterized image of the snapshot root that every lens
//! samples from. Captures are asynchronous, retried with a fixed backoff, and
//! ordered by a generation counter so a slow, superseded capture can never
//! overwrite a newer one.

mod captured;
mod scale;
mod store;

pub use captured::SnapshotImage;
pub use scale::capture_scale;
pub use store::{CaptureOutcome, CaptureSpec, SnapshotConfig, SnapshotStore};
