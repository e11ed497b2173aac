//! Timer-driven advance of multi-frame image animations.

use crate::scheduler::{Handle, Scheduler};

/// One-shot timer per frame delay. The controller re-arms it after each
/// advance until the sequence reports it finished looping.
#[derive(Debug, Default)]
pub struct FrameAnimator {
    handle: Option<Handle>,
}

impl FrameAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self) -> bool {
        self.handle.is_some()
    }

    /// Schedule the next frame advance. A no-op while a timer is already
    /// scheduled, so a redraw of an already-animating image does not restart
    /// its cadence.
    pub fn start<T: Clone>(&mut self, scheduler: &mut Scheduler<T>, delay_ms: u64, tag: T) {
        if self.handle.is_some() {
            return;
        }
        self.handle = Some(scheduler.timeout(delay_ms, tag));
    }

    /// Mark the pending timer as fired. Returns false for stale tags whose
    /// registration was torn down before dispatch.
    pub fn fired(&mut self) -> bool {
        self.handle.take().is_some()
    }

    pub fn stop<T: Clone>(&mut self, scheduler: &mut Scheduler<T>) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel(handle);
        }
    }
}
