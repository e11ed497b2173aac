//! Viewport core of a media viewer: scale and placement math, smooth
//! scrolling, edge navigation, slideshow, frame animation, note overlays and
//! a control adapter for an external video pipeline.
//!
//! The crate is toolkit-free. A front-end owns the screen and the input
//! loop, feeds events and elapsed time into
//! [`viewport::ViewportController`], and renders the frame and geometry the
//! controller publishes.

pub mod animation;
pub mod app;
pub mod content;
pub mod event_source;
pub mod navigation;
pub mod notes;
pub mod pipeline;
pub mod scale;
pub mod scheduler;
pub mod scroll;
pub mod settings;
pub mod signal;
pub mod slideshow;
pub mod viewport;

pub use content::{AnimationFrame, Content, ContentEvent, Note};
pub use navigation::NavDirection;
pub use scale::{Geometry, ZoomMode};
pub use settings::Settings;
pub use viewport::{CursorState, DrawnImage, ViewportController};
