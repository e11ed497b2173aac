//! The viewport controller: owns the adjustments, the timers and the
//! currently displayed content, and turns input and content events into
//! draws, scrolls and navigation signals.
//!
//! Everything runs on one thread. The embedding shell calls
//! [`ViewportController::pump`] with the elapsed milliseconds each loop
//! iteration; content change notifications queue into a mailbox and are
//! delivered at the start of the next pump, so content mutation never
//! re-enters the controller.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use log::{debug, warn};

use crate::animation::FrameAnimator;
use crate::content::{self, Content, ContentEvent};
use crate::navigation::{self, NavDirection, ScrollOutcome};
use crate::notes::NotesOverlay;
use crate::pipeline::{ExposeRect, MediaPipeline, VideoAdapter, WindowHandle};
use crate::scale::{self, Geometry, ZoomMode, MAX_ZOOM_PERCENT, MIN_ZOOM_PERCENT};
use crate::scheduler::{Handle, Scheduler, IDLE_PRIORITY_HIGH};
use crate::scroll::{Adjustment, Axis, SmoothScroller, SCROLL_STEP_MS};
use crate::settings::Settings;
use crate::signal::{Signal, Token};
use crate::slideshow::{Slideshow, SLIDESHOW_SCROLL_AMOUNT};

/// Zoom step applied by [`ViewportController::zoom_in`] and
/// [`ViewportController::zoom_out`].
const ZOOM_STEP_PERCENT: u32 = 10;

/// Scheduled work dispatched by the pump loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Draw { force_scroll: bool },
    ScrollTick,
    AnimFrame,
    Slideshow,
    CursorHide,
}

/// Payload of the image-drawn signal, carrying what a status display needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawnImage {
    pub natural_size: (u32, u32),
    pub geometry: Geometry,
    pub scale_percent: f64,
    pub zoom_mode: ZoomMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Normal,
    Hidden,
}

/// Scroll position captured before a content switch, applied again only if
/// the zoom mode still matches when the content is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RestorePoint {
    h: f64,
    v: f64,
    zoom_mode: ZoomMode,
}

pub struct ViewportController {
    scheduler: Scheduler<Task>,

    pub image_drawn: Signal<DrawnImage>,
    pub slideshow_ended: Signal<()>,
    pub navigate: Signal<NavDirection>,
    pub cursor_changed: Signal<CursorState>,
    pub cleared: Signal<()>,

    settings: Settings,
    content: Option<Rc<RefCell<Content>>>,
    mailbox: Rc<RefCell<VecDeque<ContentEvent>>>,
    events_token: Option<Token>,

    draw_handle: Option<Handle>,
    scroll_tick_handle: Option<Handle>,
    cursor_handle: Option<Handle>,
    animator: FrameAnimator,
    scroller: SmoothScroller,
    slideshow: Slideshow,

    hadj: Adjustment,
    vadj: Adjustment,
    viewport_size: (u32, u32),

    zoom_mode: ZoomMode,
    zoom_percent: u32,
    zoom_scroll: bool,
    restore_scroll: Option<RestorePoint>,

    first_draw: bool,
    loading: bool,
    redraw_queued: bool,
    realized: bool,
    scale_percent: f64,

    notes: NotesOverlay,
    video: VideoAdapter,
    next_available: bool,
    previous_available: bool,

    scaled_frame: Option<Arc<DynamicImage>>,
    last_geometry: Option<Geometry>,
    video_rect: Option<ExposeRect>,
}

impl ViewportController {
    pub fn new(settings: Settings, pipeline: Box<dyn MediaPipeline>) -> Self {
        let zoom_mode = settings.zoom_mode;
        Self {
            scheduler: Scheduler::new(),
            image_drawn: Signal::new(),
            slideshow_ended: Signal::new(),
            navigate: Signal::new(),
            cursor_changed: Signal::new(),
            cleared: Signal::new(),
            settings,
            content: None,
            mailbox: Rc::new(RefCell::new(VecDeque::new())),
            events_token: None,
            draw_handle: None,
            scroll_tick_handle: None,
            cursor_handle: None,
            animator: FrameAnimator::new(),
            scroller: SmoothScroller::new(),
            slideshow: Slideshow::new(),
            hadj: Adjustment::default(),
            vadj: Adjustment::default(),
            viewport_size: (0, 0),
            zoom_mode,
            zoom_percent: 100,
            zoom_scroll: false,
            restore_scroll: None,
            first_draw: true,
            loading: false,
            redraw_queued: false,
            realized: false,
            scale_percent: 100.0,
            notes: NotesOverlay::new(),
            video: VideoAdapter::new(pipeline),
            next_available: false,
            previous_available: false,
            scaled_frame: None,
            last_geometry: None,
            video_rect: None,
        }
    }

    /// Bind the window surface the video pipeline renders into and perform
    /// the first draw of any content set before realization.
    pub fn realize(&mut self, handle: WindowHandle) {
        self.realized = true;
        self.video.realize(handle);
        if self.content.is_some() {
            self.queue_draw(true);
        }
    }

    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if self.viewport_size == (width, height) {
            return;
        }
        self.viewport_size = (width, height);
        self.queue_draw(false);
    }

    /// Replace the displayed content. Setting the same content again only
    /// requests a redraw; otherwise every timer and connection referring to
    /// the old content is torn down before the new one is attached.
    pub fn set_content(&mut self, content: Rc<RefCell<Content>>) {
        if let Some(current) = &self.content {
            if Rc::ptr_eq(current, &content) {
                self.queue_draw(false);
                return;
            }
        }
        self.detach_content();
        self.reset_slideshow_delay();

        {
            let mut c = content.borrow_mut();
            let mailbox = Rc::clone(&self.mailbox);
            self.events_token = Some(
                c.events
                    .connect(move |event| mailbox.borrow_mut().push_back(*event)),
            );
        }
        self.content = Some(content);
        self.first_draw = true;
        self.loading = true;
        self.queue_draw(true);
    }

    /// Drop the displayed content entirely and return to an empty view.
    pub fn clear(&mut self) {
        self.detach_content();
        self.slideshow.stop(&mut self.scheduler);
        self.scaled_frame = None;
        self.last_geometry = None;
        self.video_rect = None;
        self.loading = false;
        self.hadj.configure(0.0, self.viewport_size.0 as f64);
        self.vadj.configure(0.0, self.viewport_size.1 as f64);
        self.cleared.emit(&());
    }

    fn detach_content(&mut self) {
        self.animator.stop(&mut self.scheduler);
        self.stop_smooth_scroll();
        if let Some(handle) = self.draw_handle.take() {
            self.scheduler.cancel(handle);
        }
        self.redraw_queued = false;
        if let Some(old) = self.content.take() {
            let mut c = old.borrow_mut();
            if let Some(token) = self.events_token.take() {
                c.events.disconnect(token);
            }
            // A cached item viewed again starts from its first frame.
            c.reset_animation();
        }
        self.events_token = None;
        self.mailbox.borrow_mut().clear();
        self.notes.clear();
        // Unconditional: a video that errored before playback still holds
        // its URI and paused state.
        self.video.reset();
    }

    /// Request a redraw on the next pump. Multiple requests coalesce into
    /// one; a scroll-forcing or loading-phase request replaces a plain
    /// pending one so its stronger effect is not lost.
    pub fn queue_draw(&mut self, scroll: bool) {
        if !self.realized
            || self.content.is_none()
            || (self.redraw_queued && !(scroll || self.loading))
        {
            return;
        }
        if let Some(handle) = self.draw_handle.take() {
            self.scheduler.cancel(handle);
        }
        self.redraw_queued = true;
        self.draw_handle = Some(
            self.scheduler
                .idle(IDLE_PRIORITY_HIGH, Task::Draw { force_scroll: scroll }),
        );
    }

    pub fn zoom_in(&mut self) {
        self.zoom(self.zoom_percent + ZOOM_STEP_PERCENT);
    }

    pub fn zoom_out(&mut self) {
        self.zoom(self.zoom_percent.saturating_sub(ZOOM_STEP_PERCENT));
    }

    pub fn reset_zoom(&mut self) {
        self.zoom(100);
    }

    /// Set the manual zoom percentage. Ignored outside manual mode or the
    /// accepted range.
    pub fn zoom(&mut self, percent: u32) {
        if self.zoom_mode != ZoomMode::Manual
            || !(MIN_ZOOM_PERCENT..=MAX_ZOOM_PERCENT).contains(&percent)
        {
            return;
        }
        self.zoom_scroll = self.zoom_percent != percent;
        self.zoom_percent = percent;
        self.queue_draw(false);
    }

    pub fn set_zoom_mode(&mut self, mode: ZoomMode) {
        if self.zoom_mode == mode {
            return;
        }
        self.zoom_mode = mode;
        self.queue_draw(true);
    }

    /// User scroll request. Resets the slideshow delay and either animates,
    /// navigates past an edge or ends the slideshow.
    pub fn scroll(&mut self, dx: f64, dy: f64) {
        self.scroll_internal(dx, dy, false);
    }

    /// Direct drag positioning: no animation, no edge navigation.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.reset_slideshow_delay();
        self.stop_smooth_scroll();
        self.hadj.set_value(self.hadj.value + dx);
        self.vadj.set_value(self.vadj.value + dy);
        if let Some(rect) = self.video_rect {
            if self.video.is_playing() {
                self.video.expose_at(rect);
            }
        }
    }

    fn scroll_internal(&mut self, dx: f64, dy: f64, from_slideshow: bool) {
        if !from_slideshow {
            self.reset_slideshow_delay();
        }
        match navigation::route_scroll(
            dx,
            dy,
            &self.hadj,
            &self.vadj,
            self.slideshow.is_running(),
            self.next_available,
        ) {
            ScrollOutcome::AdvanceNext => {
                if self.next_available {
                    self.navigate.emit(&NavDirection::Next);
                }
            }
            ScrollOutcome::AdvancePrevious => {
                if self.previous_available {
                    self.navigate.emit(&NavDirection::Previous);
                }
            }
            ScrollOutcome::SlideshowEnded => {
                self.slideshow.stop(&mut self.scheduler);
                self.slideshow_ended.emit(&());
            }
            ScrollOutcome::Scroll { axis, amount } => self.smooth_scroll(amount, axis),
            ScrollOutcome::None => {}
        }
    }

    fn smooth_scroll(&mut self, amount: f64, axis: Axis) {
        let adjustment = match axis {
            Axis::Horizontal => &self.hadj,
            Axis::Vertical => &self.vadj,
        };
        self.scroller.begin(amount, axis, adjustment);
        // Restart the tick timer so its phase matches the restarted
        // animation time.
        if let Some(handle) = self.scroll_tick_handle.take() {
            self.scheduler.cancel(handle);
        }
        self.scroll_tick_handle = Some(
            self.scheduler
                .timeout_repeating(SCROLL_STEP_MS, Task::ScrollTick),
        );
    }

    fn stop_smooth_scroll(&mut self) {
        if let Some(handle) = self.scroll_tick_handle.take() {
            self.scheduler.cancel(handle);
        }
        self.scroller.cancel();
    }

    /// A click without drag navigates; the left half goes back under smart
    /// navigation.
    pub fn click(&mut self, x: u32) {
        let direction =
            navigation::click_direction(x, self.viewport_size.0, self.settings.smart_navigation);
        match direction {
            NavDirection::Next if self.next_available => self.navigate.emit(&direction),
            NavDirection::Previous if self.previous_available => self.navigate.emit(&direction),
            _ => {}
        }
    }

    pub fn toggle_slideshow(&mut self) {
        self.slideshow.toggle(
            &mut self.scheduler,
            self.settings.slideshow_delay_secs * 1000,
            Task::Slideshow,
        );
    }

    pub fn is_slideshow_running(&self) -> bool {
        self.slideshow.is_running()
    }

    fn reset_slideshow_delay(&mut self) {
        self.slideshow.reset(
            &mut self.scheduler,
            self.settings.slideshow_delay_secs * 1000,
            Task::Slideshow,
        );
    }

    /// Pointer activity: show the cursor and re-arm the hide timer.
    pub fn cursor_activity(&mut self) {
        if let Some(handle) = self.cursor_handle.take() {
            self.scheduler.cancel(handle);
        }
        self.cursor_changed.emit(&CursorState::Normal);
        let delay = self.settings.cursor_hide_delay_secs;
        if delay > 0 {
            self.cursor_handle = Some(self.scheduler.timeout(delay * 1000, Task::CursorHide));
        }
    }

    /// Capture the current scroll position so the next content drawn with a
    /// matching zoom mode starts there.
    pub fn save_scroll_position(&mut self) {
        self.restore_scroll = Some(RestorePoint {
            h: self.hadj.value,
            v: self.vadj.value,
            zoom_mode: self.zoom_mode,
        });
    }

    /// Whether the collection has items after and before the current one.
    pub fn set_navigation_state(&mut self, next_available: bool, previous_available: bool) {
        self.next_available = next_available;
        self.previous_available = previous_available;
    }

    /// Drive the controller: deliver queued content events, drain the
    /// pipeline bus, then dispatch every timer and idle that came due.
    pub fn pump(&mut self, elapsed_ms: u64) {
        loop {
            let event = self.mailbox.borrow_mut().pop_front();
            match event {
                Some(ContentEvent::PixelBufferChanged) => self.queue_draw(false),
                Some(ContentEvent::NotesChanged) => {
                    if let Some(content) = self.content.clone() {
                        let c = content.borrow();
                        self.notes.rebuild(c.notes(), self.scale_percent / 100.0);
                    }
                }
                None => break,
            }
        }
        self.video.pump_bus();
        for task in self.scheduler.advance(elapsed_ms) {
            match task {
                Task::Draw { force_scroll } => {
                    // A cleared handle marks the registration as torn down.
                    if self.draw_handle.take().is_some() {
                        self.draw(force_scroll);
                    }
                }
                Task::ScrollTick => self.on_scroll_tick(),
                Task::AnimFrame => self.on_anim_frame(),
                Task::Slideshow => self.on_slideshow_tick(),
                Task::CursorHide => self.on_cursor_hide(),
            }
        }
    }

    fn on_scroll_tick(&mut self) {
        if self.scroll_tick_handle.is_none() {
            return;
        }
        let running = match self.scroller.axis() {
            Some(Axis::Horizontal) => self.scroller.tick(&mut self.hadj),
            Some(Axis::Vertical) => self.scroller.tick(&mut self.vadj),
            None => false,
        };
        if !running {
            if let Some(handle) = self.scroll_tick_handle.take() {
                self.scheduler.cancel(handle);
            }
        }
    }

    fn on_anim_frame(&mut self) {
        if !self.animator.fired() {
            return;
        }
        let Some(content) = self.content.clone() else {
            return;
        };
        let finished = content.borrow_mut().advance_frame();
        if !finished {
            let delay = content.borrow().frame_delay_ms();
            self.animator.start(&mut self.scheduler, delay, Task::AnimFrame);
        }
    }

    fn on_slideshow_tick(&mut self) {
        if !self.slideshow.is_running() {
            return;
        }
        self.scroll_internal(0.0, SLIDESHOW_SCROLL_AMOUNT, true);
    }

    fn on_cursor_hide(&mut self) {
        if self.cursor_handle.take().is_none() {
            return;
        }
        self.cursor_changed.emit(&CursorState::Hidden);
    }

    fn draw(&mut self, force_scroll: bool) {
        let Some(content_rc) = self.content.clone() else {
            return;
        };
        let mut content = content_rc.borrow_mut();

        self.loading = content.is_loading();
        if self.loading
            && (content.is_animated() || content.is_video() || content.pixel_buffer().is_none())
        {
            self.redraw_queued = false;
            return;
        }

        let mut error = false;
        let natural: (u32, u32);
        let mut pixbuf: Option<Arc<DynamicImage>> = None;

        if content.is_video() {
            if !self.video.is_playing() {
                if let Err(err) = self.video.load(content.file_path(), self.settings.volume) {
                    warn!(
                        "failed to load video {}: {err}",
                        content.file_path().display()
                    );
                    error = true;
                }
            }
            if !error {
                match self.video.query_video_size() {
                    Ok(size) => content.set_video_size(size),
                    Err(err) => {
                        warn!("{err} for {}", content.file_path().display());
                        error = true;
                    }
                }
            }
            if error {
                pixbuf = Some(content::missing_placeholder());
                natural = content::missing_placeholder_size();
            } else {
                natural = content.video_size().unwrap_or((1, 1));
            }
        } else {
            match content.pixel_buffer() {
                Some(buffer) => {
                    natural = buffer.dimensions();
                    pixbuf = Some(buffer);
                }
                None => {
                    debug!("no pixel data for {}", content.file_path().display());
                    error = true;
                    pixbuf = Some(content::missing_placeholder());
                    natural = content::missing_placeholder_size();
                }
            }
        }

        let geometry =
            scale::fit_geometry(natural, self.viewport_size, self.zoom_mode, self.zoom_percent);
        self.scale_percent =
            scale::effective_scale(self.zoom_mode, self.zoom_percent, geometry.width, natural.0);

        self.scaled_frame = match &pixbuf {
            Some(buffer) if !error && geometry.size() != natural => Some(Arc::new(
                buffer.resize_exact(geometry.width, geometry.height, FilterType::Triangle),
            )),
            Some(buffer) => Some(Arc::clone(buffer)),
            None => None,
        };

        // Relative center before the range changes, for zoom preservation.
        let h_frac = if self.hadj.upper > 0.0 {
            (self.hadj.value + self.hadj.page_size * 0.5) / self.hadj.upper
        } else {
            0.0
        };
        let v_frac = if self.vadj.upper > 0.0 {
            (self.vadj.value + self.vadj.page_size * 0.5) / self.vadj.upper
        } else {
            0.0
        };
        self.hadj
            .configure(geometry.width as f64, self.viewport_size.0 as f64);
        self.vadj
            .configure(geometry.height as f64, self.viewport_size.1 as f64);

        if force_scroll || self.first_draw {
            let restorable = matches!(
                &self.restore_scroll,
                Some(r) if r.zoom_mode == self.zoom_mode
            );
            if restorable {
                if let Some(restore) = self.restore_scroll.take() {
                    self.hadj.set_value(restore.h);
                    self.vadj.set_value(restore.v);
                }
            } else {
                self.vadj.set_value(0.0);
                let start = if self.settings.manga_mode {
                    self.hadj.upper_max()
                } else {
                    0.0
                };
                self.hadj.set_value(start);
            }
            self.first_draw = false;
        } else if self.zoom_scroll {
            self.hadj
                .set_value((h_frac * self.hadj.upper - self.hadj.page_size * 0.5).max(0.0));
            self.vadj
                .set_value((v_frac * self.vadj.upper - self.vadj.page_size * 0.5).max(0.0));
            self.zoom_scroll = false;
        }

        if content.is_video() && !error {
            let rect = ExposeRect {
                x: geometry.x,
                y: geometry.y,
                width: geometry.width,
                height: geometry.height,
            };
            self.video_rect = Some(rect);
            self.video.expose_at(rect);
            if !self.video.is_playing() {
                self.video.play();
            }
        } else {
            self.video_rect = None;
        }

        if content.is_animated() && !self.loading && !content.finished_looping() {
            let delay = content.frame_delay_ms();
            self.animator.start(&mut self.scheduler, delay, Task::AnimFrame);
        }

        let note_scale = self.scale_percent / 100.0;
        if self.notes.is_empty() && !content.notes().is_empty() {
            self.notes.rebuild(content.notes(), note_scale);
        } else {
            self.notes.update(note_scale);
        }

        self.last_geometry = Some(geometry);
        self.redraw_queued = false;
        drop(content);

        self.image_drawn.emit(&DrawnImage {
            natural_size: natural,
            geometry,
            scale_percent: self.scale_percent,
            zoom_mode: self.zoom_mode,
        });
    }

    pub fn content(&self) -> Option<Rc<RefCell<Content>>> {
        self.content.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn zoom_mode(&self) -> ZoomMode {
        self.zoom_mode
    }

    pub fn zoom_percent(&self) -> u32 {
        self.zoom_percent
    }

    /// Effective scale percentage of the last draw.
    pub fn scale_percent(&self) -> f64 {
        self.scale_percent
    }

    /// The frame resampled to the drawn size by the last draw.
    pub fn scaled_frame(&self) -> Option<Arc<DynamicImage>> {
        self.scaled_frame.clone()
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.last_geometry
    }

    /// Window rectangle the video pipeline is exposed at, if a video is
    /// showing.
    pub fn video_rect(&self) -> Option<ExposeRect> {
        self.video_rect
    }

    pub fn scroll_offsets(&self) -> (f64, f64) {
        (self.hadj.value, self.vadj.value)
    }

    pub fn adjustments(&self) -> (&Adjustment, &Adjustment) {
        (&self.hadj, &self.vadj)
    }

    pub fn notes(&self) -> &NotesOverlay {
        &self.notes
    }
}
