//! End-to-end flows through a small collection: the controller emits
//! navigation signals, the harness switches content the way a browsing
//! shell would.

use std::cell::RefCell;
use std::rc::Rc;

use image::DynamicImage;

use glance::pipeline::mock::MockPipeline;
use glance::{Content, NavDirection, Settings, ViewportController, ZoomMode};

struct Viewer {
    controller: ViewportController,
    items: Vec<Rc<RefCell<Content>>>,
    index: usize,
    nav: Rc<RefCell<Vec<NavDirection>>>,
    ended: Rc<RefCell<bool>>,
}

impl Viewer {
    fn new(settings: Settings, sizes: &[(u32, u32)]) -> Self {
        let mut controller = ViewportController::new(settings, Box::new(MockPipeline::new()));
        controller.set_viewport_size(800, 600);
        controller.realize(1);

        let nav = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&nav);
        controller.navigate.connect(move |d| sink.borrow_mut().push(*d));

        let ended = Rc::new(RefCell::new(false));
        let sink = Rc::clone(&ended);
        controller
            .slideshow_ended
            .connect(move |()| *sink.borrow_mut() = true);

        let items = sizes
            .iter()
            .enumerate()
            .map(|(i, &(w, h))| {
                Rc::new(RefCell::new(Content::still(
                    format!("{i}.png"),
                    DynamicImage::new_rgba8(w, h),
                )))
            })
            .collect();

        let mut viewer = Self {
            controller,
            items,
            index: 0,
            nav,
            ended,
        };
        viewer.show(0);
        viewer
    }

    fn show(&mut self, index: usize) {
        self.index = index;
        self.controller.set_content(Rc::clone(&self.items[index]));
        self.controller
            .set_navigation_state(index + 1 < self.items.len(), index > 0);
        self.controller.pump(1);
    }

    /// Pump in scroll-tick-sized steps, switching content whenever the
    /// controller asks for it.
    fn pump_and_follow(&mut self, ms: u64) {
        let mut remaining = ms;
        while remaining > 0 {
            let step = remaining.min(8);
            self.controller.pump(step);
            remaining -= step;

            let requests: Vec<NavDirection> = self.nav.borrow_mut().drain(..).collect();
            for direction in requests {
                match direction {
                    NavDirection::Next if self.index + 1 < self.items.len() => {
                        let next = self.index + 1;
                        self.show(next);
                    }
                    NavDirection::Previous if self.index > 0 => {
                        let previous = self.index - 1;
                        self.show(previous);
                    }
                    _ => {}
                }
            }
        }
    }

    fn apply_navigation(&mut self) {
        self.pump_and_follow(8);
    }

    fn vertical_offset(&self) -> f64 {
        self.controller.scroll_offsets().1
    }
}

#[test]
fn scrolling_through_a_tall_page_then_advancing() {
    let mut settings = Settings::default();
    settings.zoom_mode = ZoomMode::Manual;
    let mut viewer = Viewer::new(settings, &[(800, 1800), (800, 600)]);

    // 1800 tall content in a 600 tall viewport scrolls over a 1200 range.
    viewer.controller.scroll(0.0, 600.0);
    viewer.pump_and_follow(600);
    assert_eq!(viewer.vertical_offset(), 600.0);
    assert_eq!(viewer.index, 0);

    viewer.controller.scroll(0.0, 600.0);
    viewer.pump_and_follow(600);
    assert_eq!(viewer.vertical_offset(), 1200.0);
    assert_eq!(viewer.index, 0);

    // The bottom edge was reached, so the next scroll turns the page, and
    // the new page starts at the top.
    viewer.controller.scroll(0.0, 600.0);
    viewer.apply_navigation();
    assert_eq!(viewer.index, 1);
    assert_eq!(viewer.vertical_offset(), 0.0);
}

#[test]
fn scrolling_back_up_returns_to_the_previous_page() {
    let mut viewer = Viewer::new(Settings::default(), &[(100, 50), (100, 50)]);
    viewer.controller.scroll(0.0, 300.0);
    viewer.apply_navigation();
    assert_eq!(viewer.index, 1);

    viewer.controller.scroll(0.0, -300.0);
    viewer.apply_navigation();
    assert_eq!(viewer.index, 0);

    // Already at the first page: scrolling up stays put.
    viewer.controller.scroll(0.0, -300.0);
    viewer.apply_navigation();
    assert_eq!(viewer.index, 0);
}

#[test]
fn slideshow_walks_the_collection_and_ends_at_the_last_page() {
    let mut viewer = Viewer::new(Settings::default(), &[(100, 50), (100, 50)]);
    viewer.controller.toggle_slideshow();

    viewer.pump_and_follow(5200);
    assert_eq!(viewer.index, 1);
    assert!(viewer.controller.is_slideshow_running());
    assert!(!*viewer.ended.borrow());

    // No page follows the last one, so the next tick ends the slideshow.
    viewer.pump_and_follow(5200);
    assert_eq!(viewer.index, 1);
    assert!(*viewer.ended.borrow());
    assert!(!viewer.controller.is_slideshow_running());
}

#[test]
fn manga_mode_opens_each_page_at_the_right_edge() {
    let mut settings = Settings::default();
    settings.zoom_mode = ZoomMode::Manual;
    settings.manga_mode = true;
    let mut viewer = Viewer::new(settings, &[(2000, 600), (2000, 600)]);

    // 2000 wide content in an 800 wide viewport: the right edge is 1200.
    assert_eq!(viewer.controller.scroll_offsets().0, 1200.0);

    viewer.controller.scroll(300.0, 0.0);
    viewer.apply_navigation();
    assert_eq!(viewer.index, 1);
    assert_eq!(viewer.controller.scroll_offsets().0, 1200.0);
}

#[test]
fn zoom_changes_survive_page_turns_in_manual_mode() {
    let mut settings = Settings::default();
    settings.zoom_mode = ZoomMode::Manual;
    let mut viewer = Viewer::new(settings, &[(200, 100), (200, 100)]);

    viewer.controller.zoom(150);
    viewer.controller.pump(1);
    assert_eq!(viewer.controller.geometry().map(|g| g.size()), Some((300, 150)));

    viewer.controller.scroll(0.0, 300.0);
    viewer.apply_navigation();
    assert_eq!(viewer.index, 1);
    // The manual percentage is viewer state, not content state.
    assert_eq!(viewer.controller.zoom_percent(), 150);
    assert_eq!(viewer.controller.geometry().map(|g| g.size()), Some((300, 150)));
}
