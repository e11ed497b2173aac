//! The currently displayed unit: a still image, a multi-frame animation or
//! a video-backed item.
//!
//! Content is created by the loading collaborator and handed to the
//! viewport controller, which subscribes to its change events. A tagged
//! union with capability accessors stands in for the original's class
//! hierarchy.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

use crate::signal::Signal;

/// Frame delay used when an animation frame does not carry one.
pub const DEFAULT_FRAME_DELAY_MS: u64 = 100;

/// A positioned annotation tied to content coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub body: String,
}

/// Change notification published by content as data arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEvent {
    PixelBufferChanged,
    NotesChanged,
}

/// One decoded frame of an animation.
#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub buffer: Arc<DynamicImage>,
    pub delay_ms: u64,
}

#[derive(Debug)]
enum Kind {
    Still,
    Animated {
        frames: Vec<AnimationFrame>,
        current: usize,
        loops: bool,
        finished_looping: bool,
    },
    Video {
        natural_size: Option<(u32, u32)>,
    },
}

pub struct Content {
    path: PathBuf,
    kind: Kind,
    loading: bool,
    pixbuf: Option<Arc<DynamicImage>>,
    notes: Vec<Note>,
    pub events: Signal<ContentEvent>,
}

impl Content {
    /// A still image that is still being loaded; the pixel buffer arrives
    /// later via [`Content::set_pixel_buffer`].
    pub fn still_loading(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: Kind::Still,
            loading: true,
            pixbuf: None,
            notes: Vec::new(),
            events: Signal::new(),
        }
    }

    /// A fully decoded still image.
    pub fn still(path: impl Into<PathBuf>, buffer: DynamicImage) -> Self {
        Self {
            path: path.into(),
            kind: Kind::Still,
            loading: false,
            pixbuf: Some(Arc::new(buffer)),
            notes: Vec::new(),
            events: Signal::new(),
        }
    }

    /// A decoded multi-frame animation. `loops` controls whether the
    /// sequence restarts after the last frame or reports itself finished.
    pub fn animated(path: impl Into<PathBuf>, frames: Vec<AnimationFrame>, loops: bool) -> Self {
        let pixbuf = frames.first().map(|f| Arc::clone(&f.buffer));
        Self {
            path: path.into(),
            kind: Kind::Animated {
                frames,
                current: 0,
                loops,
                finished_looping: false,
            },
            loading: false,
            pixbuf,
            notes: Vec::new(),
            events: Signal::new(),
        }
    }

    /// A video-backed item. Natural size is learned asynchronously from the
    /// pipeline.
    pub fn video(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: Kind::Video { natural_size: None },
            loading: false,
            pixbuf: None,
            notes: Vec::new(),
            events: Signal::new(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_animated(&self) -> bool {
        matches!(self.kind, Kind::Animated { .. })
    }

    pub fn is_video(&self) -> bool {
        matches!(self.kind, Kind::Video { .. })
    }

    /// Nullable while loading.
    pub fn pixel_buffer(&self) -> Option<Arc<DynamicImage>> {
        self.pixbuf.clone()
    }

    pub fn set_pixel_buffer(&mut self, buffer: DynamicImage) {
        self.pixbuf = Some(Arc::new(buffer));
        self.events.emit(&ContentEvent::PixelBufferChanged);
    }

    pub fn finish_loading(&mut self) {
        self.loading = false;
        self.events.emit(&ContentEvent::PixelBufferChanged);
    }

    /// Delay before the next frame of an animation.
    pub fn frame_delay_ms(&self) -> u64 {
        match &self.kind {
            Kind::Animated { frames, current, .. } => frames
                .get(*current)
                .map(|f| f.delay_ms)
                .unwrap_or(DEFAULT_FRAME_DELAY_MS),
            _ => DEFAULT_FRAME_DELAY_MS,
        }
    }

    /// Advance to the next animation frame. Returns true when the sequence
    /// finished and is not set to loop.
    pub fn advance_frame(&mut self) -> bool {
        let Kind::Animated {
            frames,
            current,
            loops,
            finished_looping,
        } = &mut self.kind
        else {
            return true;
        };
        if frames.is_empty() || *finished_looping {
            return true;
        }

        if *current + 1 < frames.len() {
            *current += 1;
        } else if *loops {
            *current = 0;
        } else {
            *finished_looping = true;
            return true;
        }

        self.pixbuf = Some(Arc::clone(&frames[*current].buffer));
        self.events.emit(&ContentEvent::PixelBufferChanged);
        false
    }

    /// Rewind to the first frame so a cached item viewed again starts from
    /// the beginning.
    pub fn reset_animation(&mut self) {
        if let Kind::Animated {
            frames,
            current,
            finished_looping,
            ..
        } = &mut self.kind
        {
            *current = 0;
            *finished_looping = false;
            if let Some(first) = frames.first() {
                self.pixbuf = Some(Arc::clone(&first.buffer));
            }
        }
    }

    pub fn finished_looping(&self) -> bool {
        match &self.kind {
            Kind::Animated {
                finished_looping, ..
            } => *finished_looping,
            _ => false,
        }
    }

    pub fn video_size(&self) -> Option<(u32, u32)> {
        match &self.kind {
            Kind::Video { natural_size } => *natural_size,
            _ => None,
        }
    }

    pub fn set_video_size(&mut self, size: (u32, u32)) {
        if let Kind::Video { natural_size } = &mut self.kind {
            *natural_size = Some(size);
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: Vec<Note>) {
        self.notes = notes;
        self.events.emit(&ContentEvent::NotesChanged);
    }
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Content")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("loading", &self.loading)
            .field("has_pixbuf", &self.pixbuf.is_some())
            .field("notes", &self.notes.len())
            .finish()
    }
}

static MISSING_PLACEHOLDER: LazyLock<Arc<DynamicImage>> = LazyLock::new(|| {
    let size = 96u32;
    let buffer = RgbaImage::from_fn(size, size, |x, y| {
        let on_cross = x.abs_diff(y) < 4 || x.abs_diff(size - 1 - y) < 4;
        if on_cross {
            Rgba([190, 60, 60, 255])
        } else if (x / 12 + y / 12) % 2 == 0 {
            Rgba([48, 48, 48, 255])
        } else {
            Rgba([64, 64, 64, 255])
        }
    });
    Arc::new(DynamicImage::ImageRgba8(buffer))
});

/// Built-in placeholder substituted when pixel data is missing or a video
/// has no video pad. Displayed at its own natural size.
pub fn missing_placeholder() -> Arc<DynamicImage> {
    Arc::clone(&MISSING_PLACEHOLDER)
}

/// Natural size of the placeholder image.
pub fn missing_placeholder_size() -> (u32, u32) {
    MISSING_PLACEHOLDER.dimensions()
}
