use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use super::compose::{compose, ComposeJob, ComposedPatch};

/// Where heavy dynamic-node patches are composited.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum OffloadPolicy {
    /// Use a worker thread when the platform has spare parallelism.
    #[default]
    Auto,
    /// Always composite on the calling thread.
    Inline,
}

/// "Compose patch" contract shared by the inline and worker strategies.
pub trait PatchComposer {
    fn submit(&mut self, job: ComposeJob);

    /// Finished patches, in completion order.
    fn drain(&mut self) -> Vec<ComposedPatch>;

    /// Results arrive on a later `drain` rather than immediately.
    fn is_offloaded(&self) -> bool;
}

/// Composites synchronously inside `submit`.
#[derive(Debug, Default)]
pub struct InlineComposer {
    ready: Vec<ComposedPatch>,
}

impl InlineComposer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatchComposer for InlineComposer {
    fn submit(&mut self, job: ComposeJob) {
        self.ready.push(compose(job));
    }

    fn drain(&mut self) -> Vec<ComposedPatch> {
        std::mem::take(&mut self.ready)
    }

    fn is_offloaded(&self) -> bool {
        false
    }
}

/// Composites on a dedicated worker thread.
///
/// Jobs and patches move through channels by value; the worker shares no
/// memory with the caller. If the worker dies, later jobs are dropped and
/// their patches simply never arrive.
#[derive(Debug)]
pub struct ThreadedComposer {
    jobs: Option<Sender<ComposeJob>>,
    results: Receiver<ComposedPatch>,
    worker: Option<JoinHandle<()>>,
    dead: bool,
}

impl ThreadedComposer {
    pub fn spawn() -> std::io::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<ComposeJob>();
        let (res_tx, res_rx) = mpsc::channel::<ComposedPatch>();

        let worker = thread::Builder::new()
            .name("liquid-compose".into())
            .spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    if res_tx.send(compose(job)).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            jobs: Some(job_tx),
            results: res_rx,
            worker: Some(worker),
            dead: false,
        })
    }

    fn mark_dead(&mut self) {
        if !self.dead {
            log::warn!("patch compose worker stopped; offloaded patches are dropped");
            self.dead = true;
        }
    }
}

impl PatchComposer for ThreadedComposer {
    fn submit(&mut self, job: ComposeJob) {
        let Some(tx) = &self.jobs else { return; };
        if tx.send(job).is_err() {
            self.mark_dead();
        }
    }

    fn drain(&mut self) -> Vec<ComposedPatch> {
        let mut out = Vec::new();
        loop {
            match self.results.try_recv() {
                Ok(p) => out.push(p),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.mark_dead();
                    break;
                }
            }
        }
        out
    }

    fn is_offloaded(&self) -> bool {
        true
    }
}

impl Drop for ThreadedComposer {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop.
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("patch compose worker panicked");
            }
        }
    }
}

/// Picks the compose strategy once, at renderer construction.
pub fn negotiate_composer(policy: OffloadPolicy) -> Box<dyn PatchComposer> {
    if policy == OffloadPolicy::Inline {
        return Box::new(InlineComposer::new());
    }

    let cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    if cores < 2 {
        log::info!("single core platform; compositing patches inline");
        return Box::new(InlineComposer::new());
    }

    match ThreadedComposer::spawn() {
        Ok(c) => {
            log::debug!("patch compositing offloaded to worker thread");
            Box::new(c)
        }
        Err(e) => {
            log::warn!("could not spawn compose worker ({e}); compositing inline");
            Box::new(InlineComposer::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::arena::SlotKey;
    use crate::coords::{Affine2, PixelRect};
    use crate::dynamic::DynamicHandle;

    fn job(i: u32) -> ComposeJob {
        ComposeJob {
            handle: DynamicHandle::from_parts(i, 0),
            generation: 1,
            dst: PixelRect::new(0, 0, 2, 2),
            base: RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])),
            videos: Vec::new(),
            capture: Arc::new(RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]))),
            transform: Affine2::identity(),
            opacity: 1.0,
        }
    }

    fn drain_until(c: &mut dyn PatchComposer, n: usize) -> Vec<ComposedPatch> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut got = Vec::new();
        while got.len() < n && Instant::now() < deadline {
            got.extend(c.drain());
            thread::sleep(Duration::from_millis(1));
        }
        got
    }

    #[test]
    fn inline_is_immediate() {
        let mut c = InlineComposer::new();
        c.submit(job(0));
        let out = c.drain();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].pixels.get_pixel(0, 0), &Rgba([9, 9, 9, 255]));
        assert!(c.drain().is_empty());
    }

    #[test]
    fn threaded_matches_inline() {
        let mut t = ThreadedComposer::spawn().unwrap();
        t.submit(job(1));
        t.submit(job(2));
        let out = drain_until(&mut t, 2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].handle, DynamicHandle::from_parts(1, 0));
        assert_eq!(out[1].pixels.get_pixel(1, 1), &Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn inline_policy_never_offloads() {
        assert!(!negotiate_composer(OffloadPolicy::Inline).is_offloaded());
    }
}
