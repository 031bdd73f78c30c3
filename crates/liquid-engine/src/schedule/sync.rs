use std::fmt;
use std::time::Instant;

/// External smooth-scroll driver (a Lenis-style scroller).
///
/// Advanced once per external tick before the frame runs so the scroll offset
/// the host reports is current.
pub trait ScrollDriver {
    fn advance(&mut self, now: Instant);
}

/// Who calls into the renderer every frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum TickSource {
    /// The runtime's redraw loop calls `Renderer::frame`.
    #[default]
    SelfOwned,
    /// An external ticker calls `Renderer::tick_external`.
    External,
}

/// Argument of `Renderer::sync_with`.
#[derive(Default)]
pub struct SyncConfig {
    pub scroll_driver: Option<Box<dyn ScrollDriver>>,
    /// Hand frame driving to an external ticker. Implied by a scroll driver.
    pub external_ticker: bool,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("scroll_driver", &self.scroll_driver.is_some())
            .field("external_ticker", &self.external_ticker)
            .finish()
    }
}

/// Tick source plus the optional scroll driver.
#[derive(Default)]
pub struct Scheduler {
    source: TickSource,
    driver: Option<Box<dyn ScrollDriver>>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("source", &self.source)
            .field("scroll_driver", &self.driver.is_some())
            .finish()
    }
}

impl Scheduler {
    #[inline]
    pub fn source(&self) -> TickSource {
        self.source
    }

    /// Stops the self-owned loop. Syncing again replaces the previous driver.
    pub fn sync_with(&mut self, config: SyncConfig) {
        let external = config.external_ticker || config.scroll_driver.is_some();
        if !external {
            log::debug!("sync_with: nothing to sync with, keeping the self-owned loop");
            return;
        }
        self.source = TickSource::External;
        self.driver = config.scroll_driver;
        log::info!(
            "frame driving handed to external ticker (scroll driver: {})",
            self.driver.is_some()
        );
    }

    /// Advances the scroll driver for an external tick.
    pub fn advance(&mut self, now: Instant) {
        if let Some(driver) = self.driver.as_mut() {
            driver.advance(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingDriver(Rc<Cell<u32>>);

    impl ScrollDriver for CountingDriver {
        fn advance(&mut self, _now: Instant) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn empty_sync_keeps_self_owned_loop() {
        let mut s = Scheduler::default();
        s.sync_with(SyncConfig::default());
        assert_eq!(s.source(), TickSource::SelfOwned);
    }

    #[test]
    fn scroll_driver_implies_external_ticker() {
        let calls = Rc::new(Cell::new(0));
        let mut s = Scheduler::default();
        s.sync_with(SyncConfig {
            scroll_driver: Some(Box::new(CountingDriver(Rc::clone(&calls)))),
            external_ticker: false,
        });
        assert_eq!(s.source(), TickSource::External);
        s.advance(Instant::now());
        assert_eq!(calls.get(), 1);
    }
}
