//! Scrollbar model and the smooth-scroll animation engine.

/// Axis a scroll adjustment moves along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Scrollbar state: current value plus the range it moves in. Mirrors a
/// toolkit adjustment, with `upper` the content extent and `page_size` the
/// viewport extent along the axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
    pub page_size: f64,
}

impl Default for Adjustment {
    fn default() -> Self {
        Self {
            value: 0.0,
            lower: 0.0,
            upper: 0.0,
            page_size: 0.0,
        }
    }
}

impl Adjustment {
    pub fn new(upper: f64, page_size: f64) -> Self {
        Self {
            value: 0.0,
            lower: 0.0,
            upper,
            page_size,
        }
    }

    /// Largest value the adjustment can take: content extent minus one page.
    pub fn upper_max(&self) -> f64 {
        (self.upper - self.page_size).max(self.lower)
    }

    /// Set the value, clamped to `[lower, upper - page_size]`.
    pub fn set_value(&mut self, value: f64) {
        self.value = value.clamp(self.lower, self.upper_max());
    }

    /// Resize the range, keeping the current value clamped inside it.
    pub fn configure(&mut self, upper: f64, page_size: f64) {
        self.upper = upper;
        self.page_size = page_size;
        self.set_value(self.value);
    }

    pub fn at_upper(&self) -> bool {
        self.value == self.upper_max()
    }

    pub fn at_lower(&self) -> bool {
        self.value == self.lower
    }
}

/// Animation tick length in milliseconds, matching a ~120Hz update rate.
pub const SCROLL_STEP_MS: u64 = 8;

/// Longest animation duration regardless of distance, so large jumps stay
/// responsive.
const MAX_DURATION_MS: f64 = 500.0;

/// Time-stepped scroll animation along one axis at a time.
///
/// Calls to [`SmoothScroller::begin`] accumulate into the pending target
/// unless the direction reverses, the axis changes or no animation is
/// active, in which case the previous animation is cancelled and the target
/// restarts from zero. The position curve is a quarter sine (ease-out),
/// rounded toward the far end so progress is monotonic and lands exactly on
/// `start + target`.
#[derive(Debug, Default)]
pub struct SmoothScroller {
    active: bool,
    axis: Option<Axis>,
    start: f64,
    target: f64,
    time: f64,
    duration: f64,
}

impl SmoothScroller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn axis(&self) -> Option<Axis> {
        self.axis
    }

    /// Signed distance still being animated toward.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Accumulate a scroll request into the animation state.
    ///
    /// The target is clamped so the animation cannot travel past the
    /// adjustment bounds; duration is recomputed on every call.
    pub fn begin(&mut self, amount: f64, axis: Axis, adjustment: &Adjustment) {
        // Cancel the current animation on direction reversal or axis change.
        if (amount < 0.0 && self.target > 0.0)
            || (amount > 0.0 && self.target < 0.0)
            || self.axis != Some(axis)
            || !self.active
        {
            self.target = 0.0;
            self.duration = 0.0;
            self.axis = Some(axis);
            self.active = true;
        }

        self.time = 0.0;
        self.target += amount;
        self.start = adjustment.value;

        if self.target > 0.0 {
            self.target = self.target.min(adjustment.upper_max() - adjustment.value);
        } else if self.target < 0.0 {
            self.target = self.target.max(adjustment.lower - adjustment.value);
        }

        let step = SCROLL_STEP_MS as f64;
        self.duration = (MAX_DURATION_MS.min(self.target.abs()) / step).ceil() * step;
    }

    /// Advance the animation by one step and apply the eased position to the
    /// adjustment. Returns false when the animation has landed on
    /// `start + target` and self-cancelled.
    pub fn tick(&mut self, adjustment: &mut Adjustment) -> bool {
        if !self.active {
            return false;
        }
        if self.duration <= 0.0 {
            adjustment.set_value(self.start + self.target);
            self.active = false;
            return false;
        }

        self.time += SCROLL_STEP_MS as f64;
        let eased = self.target
            * (self.time / self.duration * std::f64::consts::FRAC_PI_2).sin()
            + self.start;
        // Round toward the far end so rounding never oscillates around the
        // stop point.
        let value = if self.target < 0.0 { eased.floor() } else { eased.ceil() };
        adjustment.set_value(value);

        if adjustment.value == self.start + self.target {
            self.active = false;
            return false;
        }
        true
    }

    /// Drop the animation without emitting any further positions.
    pub fn cancel(&mut self) {
        self.active = false;
        self.target = 0.0;
        self.duration = 0.0;
    }
}
