//! Infinite-scroll trigger.
//!
//! A sentinel sits after the last rendered item. When it comes within the
//! proximity margin of the viewport the trigger asks for one more page.
//! Firing is guarded by a flag rather than a timer: one visibility episode
//! produces at most one growth. The sentinel leaving view ends the episode
//! and releases a pending growth; reporting the growth complete re-arms the
//! trigger while the sentinel stays in view.

/// One-dimensional extent along the scroll axis, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub start: f64,
    pub len: f64,
}

impl Extent {
    pub fn new(start: f64, len: f64) -> Self {
        Self { start, len }
    }

    pub fn end(&self) -> f64 {
        self.start + self.len
    }
}

/// Whether `sentinel` intersects `viewport` grown by `margin_px` on both
/// sides. Touching edges count as intersecting.
pub fn sentinel_in_view(viewport: Extent, sentinel: Extent, margin_px: f64) -> bool {
    let top = viewport.start - margin_px;
    let bottom = viewport.end() + margin_px;
    sentinel.start <= bottom && sentinel.end() >= top
}

/// Edge-triggered, flag-guarded page-growth trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollTrigger {
    visible: bool,
    armed: bool,
    pending: bool,
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollTrigger {
    pub fn new() -> Self {
        Self {
            visible: false,
            armed: true,
            pending: false,
        }
    }

    /// Feed the latest observed visibility of the sentinel. Leaving view
    /// also releases a pending growth.
    pub fn set_visible(&mut self, visible: bool) {
        if !visible {
            self.armed = true;
            self.pending = false;
        }
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// A growth was requested and not yet completed.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Returns `true` exactly when the caller should grow the pager now.
    ///
    /// `busy` is true while a fetch is loading; no growth happens then.
    pub fn poll(&mut self, has_more: bool, busy: bool) -> bool {
        if self.visible && self.armed && !self.pending && has_more && !busy {
            self.pending = true;
            self.armed = false;
            return true;
        }
        false
    }

    /// The requested growth has been applied; the trigger may fire again.
    pub fn complete(&mut self) {
        self.pending = false;
        self.armed = true;
    }

    /// Drop any pending state, e.g. after the list was replaced.
    pub fn reset(&mut self) {
        self.pending = false;
        self.armed = true;
    }
}
