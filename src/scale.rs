//! Scale and placement math for the viewport.
//!
//! Pure functions: given the content's natural size, the viewport size and
//! the zoom policy, compute the target draw size and the top-left offset
//! that centers the content.

use serde::{Deserialize, Serialize};

/// Lowest manual zoom percentage accepted.
pub const MIN_ZOOM_PERCENT: u32 = 10;
/// Highest manual zoom percentage accepted.
pub const MAX_ZOOM_PERCENT: u32 = 400;

/// Policy governing how content size maps to viewport size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoomMode {
    /// Fixed percentage chosen by the user.
    Manual,
    /// Shrink to the viewport width when wider.
    FitWidth,
    /// Shrink to the viewport height when taller.
    FitHeight,
    /// Pick fit-width or fit-height per draw by comparing aspect ratios.
    #[default]
    AutoFit,
}

impl ZoomMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoomMode::Manual => "Manual",
            ZoomMode::FitWidth => "Fit width",
            ZoomMode::FitHeight => "Fit height",
            ZoomMode::AutoFit => "Auto fit",
        }
    }
}

/// Target draw size and centering offset produced by [`fit_geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl Geometry {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Compute the scaled size of content inside the viewport and the offset
/// centering it.
///
/// Scrollbar size is not subtracted from the viewport, the assumption being
/// that the front-end overlays its scroll indicators.
pub fn fit_geometry(
    natural: (u32, u32),
    viewport: (u32, u32),
    mode: ZoomMode,
    zoom_percent: u32,
) -> Geometry {
    let (nw, nh) = (natural.0.max(1), natural.1.max(1));
    let (vw, vh) = (viewport.0.max(1), viewport.1.max(1));

    let viewport_aspect = vw as f64 / vh as f64;
    let content_aspect = nw as f64 / nh as f64;

    let mut w = nw as f64;
    let mut h = nh as f64;

    if nw > vw
        && (mode == ZoomMode::FitWidth
            || (mode == ZoomMode::AutoFit && viewport_aspect <= content_aspect))
    {
        w = vw as f64;
        h = (w / content_aspect).ceil();
    } else if nh > vh
        && (mode == ZoomMode::FitHeight
            || (mode == ZoomMode::AutoFit && viewport_aspect >= content_aspect))
    {
        h = vh as f64;
        w = (h * content_aspect).ceil();
    } else if mode == ZoomMode::Manual && zoom_percent != 100 {
        let factor = zoom_percent as f64 / 100.0;
        w *= factor;
        h *= factor;
    }

    let width = w as u32;
    let height = h as u32;

    Geometry {
        width,
        height,
        x: (vw.saturating_sub(width)) / 2,
        y: (vh.saturating_sub(height)) / 2,
    }
}

/// Effective scale percentage to report: the manual percentage in manual
/// mode, otherwise the ratio of the drawn width to the natural width.
pub fn effective_scale(mode: ZoomMode, zoom_percent: u32, drawn_width: u32, natural_width: u32) -> f64 {
    if mode == ZoomMode::Manual {
        zoom_percent as f64
    } else {
        drawn_width as f64 / natural_width.max(1) as f64 * 100.0
    }
}
