//! Cooperative single-thread scheduler for timers and idle callbacks.
//!
//! Everything in the viewport core runs as a scheduled task on one thread:
//! redraws, scroll-animation ticks, frame-animation timers, the slideshow
//! timer and the cursor-hide timer. Registrations return a [`Handle`] and
//! the registering component must cancel it before the state it refers to is
//! torn down, the same discipline the outbound [`crate::signal::Signal`]
//! tokens follow.
//!
//! Time is virtual: the driving loop calls [`Scheduler::advance`] with the
//! elapsed wall-clock milliseconds and dispatches the returned tags. This
//! keeps every timer behavior deterministic under test.

/// Cancellation handle for a pending registration. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

/// Priority for idle registrations; higher runs first.
pub const IDLE_PRIORITY_DEFAULT: i32 = 0;
/// Elevated priority used for coalesced draw requests so they settle before
/// ordinary idle work.
pub const IDLE_PRIORITY_HIGH: i32 = 100;

struct TimeoutEntry<T> {
    id: u64,
    deadline: u64,
    period: Option<u64>,
    tag: T,
}

struct IdleEntry<T> {
    id: u64,
    priority: i32,
    tag: T,
}

pub struct Scheduler<T> {
    now: u64,
    next_id: u64,
    timeouts: Vec<TimeoutEntry<T>>,
    idles: Vec<IdleEntry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: 0,
            next_id: 0,
            timeouts: Vec::new(),
            idles: Vec::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    fn next_handle(&mut self) -> Handle {
        let h = Handle(self.next_id);
        self.next_id += 1;
        h
    }

    /// Register a one-shot timeout firing `delay_ms` from now.
    pub fn timeout(&mut self, delay_ms: u64, tag: T) -> Handle {
        let h = self.next_handle();
        self.timeouts.push(TimeoutEntry {
            id: h.0,
            deadline: self.now + delay_ms,
            period: None,
            tag,
        });
        h
    }

    /// Register a repeating timeout firing every `period_ms` until cancelled.
    pub fn timeout_repeating(&mut self, period_ms: u64, tag: T) -> Handle {
        let period = period_ms.max(1);
        let h = self.next_handle();
        self.timeouts.push(TimeoutEntry {
            id: h.0,
            deadline: self.now + period,
            period: Some(period),
            tag,
        });
        h
    }

    /// Register a one-shot idle callback dispatched on the next `advance`.
    pub fn idle(&mut self, priority: i32, tag: T) -> Handle {
        let h = self.next_handle();
        self.idles.push(IdleEntry {
            id: h.0,
            priority,
            tag,
        });
        h
    }

    /// Cancel a pending registration. Returns false if it already fired
    /// (one-shot) or was cancelled before.
    pub fn cancel(&mut self, handle: Handle) -> bool {
        let before = self.timeouts.len() + self.idles.len();
        self.timeouts.retain(|e| e.id != handle.0);
        self.idles.retain(|e| e.id != handle.0);
        before != self.timeouts.len() + self.idles.len()
    }

    pub fn is_active(&self, handle: Handle) -> bool {
        self.timeouts.iter().any(|e| e.id == handle.0) || self.idles.iter().any(|e| e.id == handle.0)
    }

    /// Advance virtual time and return the tags of everything that came due,
    /// timeouts first in deadline order, then idles in priority order.
    ///
    /// A repeating timeout fires once per elapsed period, so a long pump
    /// interval still produces every scroll-animation tick it covers.
    /// Registrations made while dispatching the returned tags land in the
    /// next `advance`.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<T> {
        self.now += elapsed_ms;
        let now = self.now;

        let mut due: Vec<(u64, u64, T)> = Vec::new();
        let mut keep = Vec::with_capacity(self.timeouts.len());
        for mut entry in self.timeouts.drain(..) {
            match entry.period {
                None => {
                    if entry.deadline <= now {
                        due.push((entry.deadline, entry.id, entry.tag));
                    } else {
                        keep.push(entry);
                    }
                }
                Some(period) => {
                    while entry.deadline <= now {
                        due.push((entry.deadline, entry.id, entry.tag.clone()));
                        entry.deadline += period;
                    }
                    keep.push(entry);
                }
            }
        }
        self.timeouts = keep;
        due.sort_by_key(|(deadline, id, _)| (*deadline, *id));

        let mut out: Vec<T> = due.into_iter().map(|(_, _, tag)| tag).collect();

        let mut idles = std::mem::take(&mut self.idles);
        idles.sort_by_key(|e| (std::cmp::Reverse(e.priority), e.id));
        out.extend(idles.into_iter().map(|e| e.tag));
        out
    }
}
