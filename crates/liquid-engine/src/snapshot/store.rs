use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::host::{
    ElementId, HiddenOverlay, OverlayVisibility, RasterError, RasterJob, RasterOptions, RasterTag,
    Rasterizer,
};

use super::{capture_scale, SnapshotImage};

/// Snapshot capture policy.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Requested texture pixels per CSS pixel, clamped to `[0.1, 3.0]`.
    pub resolution: f32,
    /// Largest texture side the GPU accepts.
    pub max_texture_dimension: u32,
    /// Extra cap for constrained mobile browsers (4096 on iOS Safari).
    pub mobile_dimension_cap: Option<u32>,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            resolution: 2.0,
            max_texture_dimension: 8192,
            mobile_dimension_cap: None,
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// What to capture; kept so retries can resubmit the same request.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSpec {
    pub root: ElementId,
    /// Full scrollable size of the root in CSS pixels.
    pub full_width: f32,
    pub full_height: f32,
    /// Lens elements, shadow companions and other decoration to leave out.
    pub ignore: Vec<ElementId>,
}

/// Result of feeding a completion into the store.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// Completion belonged to a superseded generation and was dropped.
    Stale,
    /// A new snapshot is current; the caller uploads it.
    Applied(SnapshotImage),
    /// Attempt failed; another is scheduled.
    Retrying { attempt: u32, retry_at: Instant },
    /// Every attempt failed; the previous snapshot (if any) stays current.
    Failed,
}

#[derive(Debug)]
enum CaptureState {
    Idle,
    InFlight {
        generation: u64,
        attempt: u32,
        scale: f32,
        _hidden: HiddenOverlay,
    },
    RetryPending {
        generation: u64,
        attempt: u32,
        retry_at: Instant,
        _hidden: HiddenOverlay,
    },
    Failed,
}

/// Owns the current snapshot and the capture state machine.
#[derive(Debug)]
pub struct SnapshotStore {
    config: SnapshotConfig,
    overlay: OverlayVisibility,
    generation: u64,
    state: CaptureState,
    spec: Option<CaptureSpec>,
    current: Option<SnapshotImage>,
}

impl SnapshotStore {
    pub fn new(mut config: SnapshotConfig, overlay: OverlayVisibility) -> Self {
        config.resolution = if config.resolution.is_finite() {
            config.resolution.clamp(0.1, 3.0)
        } else {
            2.0
        };
        config.max_attempts = config.max_attempts.max(1);
        Self {
            config,
            overlay,
            generation: 0,
            state: CaptureState::Idle,
            spec: None,
            current: None,
        }
    }

    #[inline]
    pub fn current(&self) -> Option<&SnapshotImage> {
        self.current.as_ref()
    }

    /// Latest issued capture generation.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A capture is in flight or waiting for its retry.
    pub fn is_capturing(&self) -> bool {
        matches!(
            self.state,
            CaptureState::InFlight { .. } | CaptureState::RetryPending { .. }
        )
    }

    pub fn has_failed(&self) -> bool {
        matches!(self.state, CaptureState::Failed)
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Starts a new capture, superseding any capture still in flight.
    pub fn request<R: Rasterizer>(&mut self, rasterizer: &mut R, spec: CaptureSpec) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        self.spec = Some(spec);
        self.start_attempt(rasterizer, generation, 1);
        generation
    }

    /// Resubmits a capture whose backoff has elapsed.
    pub fn poll_retry<R: Rasterizer>(&mut self, rasterizer: &mut R, now: Instant) {
        let due = match &self.state {
            CaptureState::RetryPending { generation, attempt, retry_at, .. } if now >= *retry_at => {
                Some((*generation, *attempt + 1))
            }
            _ => None,
        };
        if let Some((generation, attempt)) = due {
            log::info!(
                "retrying snapshot capture ({attempt}/{})",
                self.config.max_attempts
            );
            self.start_attempt(rasterizer, generation, attempt);
        }
    }

    /// Applies a finished rasterization.
    pub fn complete(
        &mut self,
        generation: u64,
        result: Result<RgbaImage, RasterError>,
        now: Instant,
    ) -> CaptureOutcome {
        let (attempt, scale) = match &self.state {
            CaptureState::InFlight { generation: g, attempt, scale, .. } if *g == generation => {
                (*attempt, *scale)
            }
            _ => {
                log::debug!(
                    "dropping stale snapshot (generation {generation}, latest {})",
                    self.generation
                );
                return CaptureOutcome::Stale;
            }
        };

        let result = result.and_then(|img| {
            if img.width() == 0 || img.height() == 0 {
                Err(RasterError::Empty)
            } else {
                Ok(img)
            }
        });

        match result {
            Ok(pixels) => {
                log::debug!(
                    "snapshot {}x{} captured at scale {scale:.3} (generation {generation})",
                    pixels.width(),
                    pixels.height()
                );
                let snap = SnapshotImage {
                    pixels: Arc::new(pixels),
                    scale,
                    captured_at: now,
                    generation,
                };
                self.current = Some(snap.clone());
                self.state = CaptureState::Idle;
                CaptureOutcome::Applied(snap)
            }
            Err(err) if attempt < self.config.max_attempts => {
                log::warn!("snapshot capture failed on attempt {attempt}: {err}");
                let retry_at = now + self.config.retry_delay;
                let hidden = self.overlay.hide();
                self.state = CaptureState::RetryPending {
                    generation,
                    attempt,
                    retry_at,
                    _hidden: hidden,
                };
                CaptureOutcome::Retrying { attempt: attempt + 1, retry_at }
            }
            Err(err) => {
                log::error!("all {attempt} snapshot attempts failed: {err}");
                self.state = CaptureState::Failed;
                CaptureOutcome::Failed
            }
        }
    }

    fn start_attempt<R: Rasterizer>(&mut self, rasterizer: &mut R, generation: u64, attempt: u32) {
        let Some(spec) = self.spec.as_ref() else { return; };

        let scale = capture_scale(
            spec.full_width,
            spec.full_height,
            self.config.resolution,
            self.config.max_texture_dimension,
            self.config.mobile_dimension_cap,
        );

        // Hide before submitting: a synchronous rasterizer captures immediately.
        let hidden = self.overlay.hide();
        self.state = CaptureState::InFlight {
            generation,
            attempt,
            scale,
            _hidden: hidden,
        };

        rasterizer.submit(RasterJob {
            tag: RasterTag::Snapshot { generation },
            root: spec.root,
            options: RasterOptions {
                scale,
                width: spec.full_width,
                height: spec.full_height,
                ignore: spec.ignore.clone(),
                ignore_fixed: true,
                ignore_marked: true,
            },
        });
    }
}
