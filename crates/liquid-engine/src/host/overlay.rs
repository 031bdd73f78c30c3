use std::cell::Cell;
use std::rc::Rc;

/// Visibility of the overlay canvas, shared between the snapshot store and the
/// presenter.
///
/// The overlay is visible while no `HiddenOverlay` guard is alive. Guards nest,
/// so a superseded capture releasing its guard does not reveal the overlay
/// while a newer capture is still running.
#[derive(Debug, Clone, Default)]
pub struct OverlayVisibility {
    hidden_depth: Rc<Cell<u32>>,
}

impl OverlayVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.hidden_depth.get() == 0
    }

    /// Hides the overlay until the returned guard is dropped.
    pub fn hide(&self) -> HiddenOverlay {
        self.hidden_depth.set(self.hidden_depth.get() + 1);
        HiddenOverlay {
            hidden_depth: Rc::clone(&self.hidden_depth),
        }
    }
}

/// Keeps the overlay hidden; restores visibility on drop.
#[derive(Debug)]
pub struct HiddenOverlay {
    hidden_depth: Rc<Cell<u32>>,
}

impl Drop for HiddenOverlay {
    fn drop(&mut self) {
        self.hidden_depth.set(self.hidden_depth.get().saturating_sub(1));
    }
}
