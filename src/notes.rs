//! Note overlays: annotation widgets positioned over the content and kept
//! in sync with the current zoom factor.

use crate::content::Note;

/// One overlay widget. Position and size track the effective zoom factor;
/// the widget itself is created once per note and reused across redraws.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteOverlay {
    pub note: Note,
    scale: f64,
}

impl NoteOverlay {
    fn new(note: Note, scale: f64) -> Self {
        Self { note, scale }
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    /// Scaled position and size in viewport coordinates.
    pub fn rect(&self) -> (u32, u32, u32, u32) {
        (
            (self.note.x as f64 * self.scale) as u32,
            (self.note.y as f64 * self.scale) as u32,
            ((self.note.width as f64 * self.scale) as u32).max(1),
            ((self.note.height as f64 * self.scale) as u32).max(1),
        )
    }
}

/// The set of overlay widgets for the current content.
#[derive(Debug, Default)]
pub struct NotesOverlay {
    widgets: Vec<NoteOverlay>,
}

impl NotesOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create one overlay per note at the given zoom factor. Called when the
    /// content's notes become available.
    pub fn rebuild(&mut self, notes: &[Note], scale: f64) {
        self.widgets = notes
            .iter()
            .cloned()
            .map(|note| NoteOverlay::new(note, scale))
            .collect();
    }

    /// Reposition/rescale existing widgets without recreating them. Called
    /// on every redraw.
    pub fn update(&mut self, scale: f64) {
        for widget in &mut self.widgets {
            widget.set_scale(scale);
        }
    }

    /// Destroy all overlay widgets. Called on content clear or replace.
    pub fn clear(&mut self) {
        self.widgets.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn widgets(&self) -> &[NoteOverlay] {
        &self.widgets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(x: u32, y: u32) -> Note {
        Note {
            x,
            y,
            width: 40,
            height: 20,
            body: "note".into(),
        }
    }

    #[test]
    fn rebuild_creates_one_widget_per_note_at_scale() {
        let mut overlay = NotesOverlay::new();
        overlay.rebuild(&[note(100, 200), note(10, 20)], 0.5);

        assert_eq!(overlay.widgets().len(), 2);
        assert_eq!(overlay.widgets()[0].rect(), (50, 100, 20, 10));
        assert_eq!(overlay.widgets()[1].rect(), (5, 10, 20, 10));
    }

    #[test]
    fn update_rescales_without_recreating() {
        let mut overlay = NotesOverlay::new();
        overlay.rebuild(&[note(100, 200)], 1.0);
        assert_eq!(overlay.widgets()[0].rect(), (100, 200, 40, 20));

        overlay.update(2.0);
        assert_eq!(overlay.widgets()[0].rect(), (200, 400, 80, 40));
        assert_eq!(overlay.widgets().len(), 1);
    }

    #[test]
    fn scaled_size_never_collapses_to_zero() {
        let mut overlay = NotesOverlay::new();
        overlay.rebuild(&[note(0, 0)], 0.01);
        let (_, _, w, h) = overlay.widgets()[0].rect();
        assert_eq!((w, h), (1, 1));
    }

    #[test]
    fn clear_destroys_all_widgets() {
        let mut overlay = NotesOverlay::new();
        overlay.rebuild(&[note(1, 2), note(3, 4)], 1.0);
        overlay.clear();
        assert!(overlay.is_empty());
    }
}
