//! Slideshow timer: periodic synthetic down-scrolls.

use crate::scheduler::{Handle, Scheduler};

/// Magnitude of the synthetic scroll a slideshow tick issues.
pub const SLIDESHOW_SCROLL_AMOUNT: f64 = 300.0;

/// Recurring timer driving the slideshow. Presence of the registration
/// handle is the running state, so toggling while running stops it.
///
/// Any user-initiated scroll resets the slideshow: stop then restart,
/// preserving the on/off state. Slideshow-originated scrolls are tagged so
/// they do not reset their own timer.
#[derive(Debug, Default)]
pub struct Slideshow {
    handle: Option<Handle>,
}

impl Slideshow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Start when stopped, stop when running.
    pub fn toggle<T: Clone>(&mut self, scheduler: &mut Scheduler<T>, delay_ms: u64, tag: T) {
        match self.handle.take() {
            None => self.handle = Some(scheduler.timeout_repeating(delay_ms, tag)),
            Some(handle) => {
                scheduler.cancel(handle);
            }
        }
    }

    /// Stop, then restart if it had been running, so the next tick is a full
    /// delay away.
    pub fn reset<T: Clone>(&mut self, scheduler: &mut Scheduler<T>, delay_ms: u64, tag: T) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel(handle);
            self.toggle(scheduler, delay_ms, tag);
        }
    }

    pub fn stop<T: Clone>(&mut self, scheduler: &mut Scheduler<T>) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Tick;

    #[test]
    fn toggle_starts_and_stops() {
        let mut sched = Scheduler::new();
        let mut slideshow = Slideshow::new();

        slideshow.toggle(&mut sched, 1000, Tick);
        assert!(slideshow.is_running());
        assert_eq!(sched.advance(1000), vec![Tick]);

        slideshow.toggle(&mut sched, 1000, Tick);
        assert!(!slideshow.is_running());
        assert!(sched.advance(5000).is_empty());
    }

    #[test]
    fn reset_restarts_the_delay_from_zero() {
        let mut sched = Scheduler::new();
        let mut slideshow = Slideshow::new();

        slideshow.toggle(&mut sched, 1000, Tick);
        sched.advance(900);

        slideshow.reset(&mut sched, 1000, Tick);
        assert!(slideshow.is_running());
        // The old deadline at t=1000 must not fire.
        assert!(sched.advance(100).is_empty());
        assert_eq!(sched.advance(900), vec![Tick]);
    }

    #[test]
    fn reset_while_stopped_stays_stopped() {
        let mut sched = Scheduler::new();
        let mut slideshow = Slideshow::new();

        slideshow.reset(&mut sched, 1000, Tick);
        assert!(!slideshow.is_running());
        assert!(sched.advance(5000).is_empty());
    }
}
