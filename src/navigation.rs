//! Edge-of-content navigation: turns scroll requests at a content boundary
//! into advance-next/previous signals, and rounds near-edge requests so they
//! land exactly on the edge.

use crate::scroll::{Adjustment, Axis};

/// Direction of a collection advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Next,
    Previous,
}

/// What a scroll request should turn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollOutcome {
    /// Already at the trailing edge: go to the next item.
    AdvanceNext,
    /// Already at the leading edge going backward: go to the previous item.
    AdvancePrevious,
    /// Slideshow is running and there is no next item.
    SlideshowEnded,
    /// Delegate the (possibly edge-rounded) amount to the smooth scroller.
    Scroll { axis: Axis, amount: f64 },
    /// Nothing to do.
    None,
}

/// Round a scroll delta up to land exactly on an edge when the remaining
/// distance is within 50% of the requested delta. Prevents perpetually
/// approaching an edge via ever-smaller increments without ever reaching it.
pub fn round_to_edge(value: f64, upper_max: f64, delta: f64) -> f64 {
    let range = (delta * 0.5).abs();
    if delta > 0.0 && upper_max - (value + delta) <= range {
        upper_max - value
    } else if delta < 0.0 && value > delta.abs() && value + delta <= range {
        -value
    } else {
        delta
    }
}

/// Decide what a `(dx, dy)` scroll request does given the current
/// adjustments. `slideshow_active` and `next_available` only influence the
/// trailing-edge case: an active slideshow with no next item ends instead of
/// advancing.
pub fn route_scroll(
    dx: f64,
    dy: f64,
    hadj: &Adjustment,
    vadj: &Adjustment,
    slideshow_active: bool,
    next_available: bool,
) -> ScrollOutcome {
    if (hadj.at_upper() && dx > 0.0) || (vadj.at_upper() && dy > 0.0) {
        if slideshow_active && !next_available {
            return ScrollOutcome::SlideshowEnded;
        }
        return ScrollOutcome::AdvanceNext;
    }
    if (hadj.at_lower() && dx < 0.0) || (vadj.at_lower() && dy < 0.0) {
        return ScrollOutcome::AdvancePrevious;
    }
    if dx != 0.0 {
        return ScrollOutcome::Scroll {
            axis: Axis::Horizontal,
            amount: round_to_edge(hadj.value, hadj.upper_max(), dx),
        };
    }
    if dy != 0.0 {
        return ScrollOutcome::Scroll {
            axis: Axis::Vertical,
            amount: round_to_edge(vadj.value, vadj.upper_max(), dy),
        };
    }
    ScrollOutcome::None
}

/// Decide where a click without drag navigates. With smart navigation, a
/// click in the left half of the drawable area goes back; everything else
/// goes forward.
pub fn click_direction(click_x: u32, drawable_width: u32, smart_navigation: bool) -> NavDirection {
    if smart_navigation && click_x < drawable_width / 2 {
        NavDirection::Previous
    } else {
        NavDirection::Next
    }
}
