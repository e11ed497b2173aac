//! The terminal application: collection scanning, content decoding, and the
//! event/render loop driving the viewport controller.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use crossterm::event::{KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage};
use log::{debug, info, warn};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::Terminal;
use walkdir::WalkDir;

use crate::content::DEFAULT_FRAME_DELAY_MS;
use crate::event_source::{Event, EventSource};
use crate::pipeline::{select_video_sink, NoSinkFactory, NullPipeline};
use crate::{
    AnimationFrame, Content, DrawnImage, NavDirection, Settings, ViewportController, ZoomMode,
};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["webm", "mp4"];

/// Keyboard/mouse scroll step in content pixels.
const SCROLL_AMOUNT: f64 = 300.0;

/// Expand the argument into the sorted media files of its directory and the
/// index to start at. Opening a file opens its whole directory with that
/// file selected.
pub fn collect_files(path: &Path) -> Result<(Vec<PathBuf>, usize)> {
    let directory = if path.is_file() {
        path.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else if path.is_dir() {
        path.to_path_buf()
    } else {
        bail!("{} does not exist", path.display());
    };

    let mut files: Vec<PathBuf> = WalkDir::new(&directory)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| is_supported(p))
        .collect();
    files.sort();

    let start = if path.is_file() {
        files.iter().position(|f| f == path).unwrap_or(0)
    } else {
        0
    };
    Ok((files, start))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

fn is_supported(path: &Path) -> bool {
    match extension_of(path) {
        Some(ext) => {
            IMAGE_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Decode a file into displayable content. Failures produce content without
/// pixel data, which the viewport renders as the missing placeholder.
fn load_content(path: &Path) -> Content {
    let ext = extension_of(path).unwrap_or_default();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        return Content::video(path);
    }
    if ext == "gif" {
        match load_gif(path) {
            Ok(content) => return content,
            Err(err) => {
                warn!("failed to decode {}: {err:#}", path.display());
                return broken_content(path);
            }
        }
    }
    match image::open(path) {
        Ok(buffer) => Content::still(path, buffer),
        Err(err) => {
            warn!("failed to decode {}: {err}", path.display());
            broken_content(path)
        }
    }
}

fn load_gif(path: &Path) -> Result<Content> {
    let reader = BufReader::new(File::open(path)?);
    let decoder = GifDecoder::new(reader)?;
    let frames = decoder.into_frames().collect_frames()?;
    if frames.len() <= 1 {
        let buffer = match frames.into_iter().next() {
            Some(frame) => DynamicImage::ImageRgba8(frame.into_buffer()),
            None => bail!("gif has no frames"),
        };
        return Ok(Content::still(path, buffer));
    }
    let frames = frames
        .into_iter()
        .map(|frame| {
            let delay: Duration = frame.delay().into();
            let delay_ms = delay.as_millis() as u64;
            AnimationFrame {
                buffer: Arc::new(DynamicImage::ImageRgba8(frame.into_buffer())),
                delay_ms: if delay_ms == 0 {
                    DEFAULT_FRAME_DELAY_MS
                } else {
                    delay_ms
                },
            }
        })
        .collect();
    Ok(Content::animated(path, frames, true))
}

fn broken_content(path: &Path) -> Content {
    let mut content = Content::still_loading(path);
    content.finish_loading();
    content
}

pub struct App {
    viewport: ViewportController,
    files: Vec<PathBuf>,
    index: usize,
    nav_requests: Rc<RefCell<Vec<NavDirection>>>,
    status: Rc<RefCell<Option<DrawnImage>>>,
    drag_from: Option<(u16, u16)>,
    dragged: bool,
    quit: bool,
}

impl App {
    pub fn new(settings: Settings, files: Vec<PathBuf>, index: usize) -> Self {
        // A terminal has no compositing surface for the pipeline to render
        // into, so sink selection falls through and videos show the
        // placeholder.
        let sink = select_video_sink(&mut NoSinkFactory, settings.video_sink.as_deref());
        if sink.is_none() {
            debug!("no usable video sink, videos will show the placeholder");
        }

        let mut viewport = ViewportController::new(settings, Box::new(NullPipeline));

        let nav_requests = Rc::new(RefCell::new(Vec::new()));
        let nav = Rc::clone(&nav_requests);
        viewport.navigate.connect(move |d| nav.borrow_mut().push(*d));

        let status = Rc::new(RefCell::new(None));
        let drawn = Rc::clone(&status);
        viewport
            .image_drawn
            .connect(move |d| *drawn.borrow_mut() = Some(*d));

        viewport
            .slideshow_ended
            .connect(|()| info!("slideshow reached the end of the collection"));
        viewport
            .cursor_changed
            .connect(|state| debug!("cursor {state:?}"));

        Self {
            viewport,
            files,
            index,
            nav_requests,
            status,
            drag_from: None,
            dragged: false,
            quit: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    fn load_current(&mut self) {
        let path = self.files[self.index].clone();
        debug!("loading {}", path.display());
        let content = load_content(&path);
        self.viewport.set_content(Rc::new(RefCell::new(content)));
        self.viewport
            .set_navigation_state(self.index + 1 < self.files.len(), self.index > 0);
    }

    fn advance(&mut self, direction: NavDirection) {
        let new_index = match direction {
            NavDirection::Next if self.index + 1 < self.files.len() => self.index + 1,
            NavDirection::Previous if self.index > 0 => self.index - 1,
            _ => return,
        };
        self.index = new_index;
        self.load_current();
    }

    fn apply_navigation(&mut self) {
        let requests: Vec<NavDirection> = self.nav_requests.borrow_mut().drain(..).collect();
        for direction in requests {
            self.advance(direction);
        }
    }

    fn cycle_zoom_mode(&mut self) {
        let next = match self.viewport.zoom_mode() {
            ZoomMode::AutoFit => ZoomMode::FitWidth,
            ZoomMode::FitWidth => ZoomMode::FitHeight,
            ZoomMode::FitHeight => ZoomMode::Manual,
            ZoomMode::Manual => ZoomMode::AutoFit,
        };
        self.viewport.set_zoom_mode(next);
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
                KeyCode::Char('n') | KeyCode::Char(' ') | KeyCode::PageDown => {
                    self.advance(NavDirection::Next)
                }
                KeyCode::Char('p') | KeyCode::Backspace | KeyCode::PageUp => {
                    self.advance(NavDirection::Previous)
                }
                KeyCode::Char('j') | KeyCode::Down => self.viewport.scroll(0.0, SCROLL_AMOUNT),
                KeyCode::Char('k') | KeyCode::Up => self.viewport.scroll(0.0, -SCROLL_AMOUNT),
                KeyCode::Char('h') | KeyCode::Left => self.viewport.scroll(-SCROLL_AMOUNT, 0.0),
                KeyCode::Char('l') | KeyCode::Right => self.viewport.scroll(SCROLL_AMOUNT, 0.0),
                KeyCode::Char('+') | KeyCode::Char('=') => self.viewport.zoom_in(),
                KeyCode::Char('-') => self.viewport.zoom_out(),
                KeyCode::Char('0') => self.viewport.reset_zoom(),
                KeyCode::Char('m') => self.cycle_zoom_mode(),
                KeyCode::Char('s') => self.viewport.toggle_slideshow(),
                _ => {}
            },
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        self.viewport.cursor_activity();
        match mouse.kind {
            MouseEventKind::ScrollDown => self.viewport.scroll(0.0, SCROLL_AMOUNT),
            MouseEventKind::ScrollUp => self.viewport.scroll(0.0, -SCROLL_AMOUNT),
            MouseEventKind::ScrollLeft => self.viewport.scroll(-SCROLL_AMOUNT, 0.0),
            MouseEventKind::ScrollRight => self.viewport.scroll(SCROLL_AMOUNT, 0.0),
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag_from = Some((mouse.column, mouse.row));
                self.dragged = false;
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((col, row)) = self.drag_from {
                    let dx = col as f64 - mouse.column as f64;
                    // One cell covers two pixel rows.
                    let dy = (row as f64 - mouse.row as f64) * 2.0;
                    if dx != 0.0 || dy != 0.0 {
                        self.dragged = true;
                        self.viewport.pan(dx, dy);
                    }
                    self.drag_from = Some((mouse.column, mouse.row));
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                // A click is a release with no drag in between.
                if self.drag_from.take().is_some() && !self.dragged {
                    self.viewport.click(mouse.column as u32);
                }
                self.dragged = false;
            }
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        if area.height < 2 {
            return;
        }
        let image_area = Rect {
            height: area.height - 1,
            ..area
        };
        // Half-block rendering packs two pixel rows per cell.
        self.viewport
            .set_viewport_size(image_area.width as u32, image_area.height as u32 * 2);

        let buf = frame.buffer_mut();
        if let (Some(image), Some(geometry)) =
            (self.viewport.scaled_frame(), self.viewport.geometry())
        {
            let (h_off, v_off) = self.viewport.scroll_offsets();
            let rgba = image.to_rgba8();
            let sample = |px: i64, py: i64| -> Option<Color> {
                let x = px.checked_sub(geometry.x as i64)?;
                let y = py.checked_sub(geometry.y as i64)?;
                if x < 0 || y < 0 || x >= geometry.width as i64 || y >= geometry.height as i64 {
                    return None;
                }
                let pixel = rgba.get_pixel(x as u32, y as u32);
                Some(Color::Rgb(pixel[0], pixel[1], pixel[2]))
            };
            for cy in 0..image_area.height {
                for cx in 0..image_area.width {
                    let px = cx as i64 + h_off as i64;
                    let py = cy as i64 * 2 + v_off as i64;
                    let top = sample(px, py).unwrap_or(Color::Black);
                    let bottom = sample(px, py + 1).unwrap_or(Color::Black);
                    if let Some(cell) = buf.cell_mut((image_area.x + cx, image_area.y + cy)) {
                        cell.set_char('▀');
                        cell.set_fg(top);
                        cell.set_bg(bottom);
                    }
                }
            }
        }

        let status_y = area.y + area.height - 1;
        let name = self.files[self.index]
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let status = match *self.status.borrow() {
            Some(drawn) => format!(
                " [{}/{}] {}  {}x{}  {:.0}%  {}{}",
                self.index + 1,
                self.files.len(),
                name,
                drawn.natural_size.0,
                drawn.natural_size.1,
                drawn.scale_percent,
                drawn.zoom_mode.as_str(),
                if self.viewport.is_slideshow_running() {
                    "  [slideshow]"
                } else {
                    ""
                },
            ),
            None => format!(" [{}/{}] {}", self.index + 1, self.files.len(), name),
        };
        let status = format!("{status:<width$}", width = area.width as usize);
        buf.set_string(
            area.x,
            status_y,
            status,
            Style::default().fg(Color::Black).bg(Color::Gray),
        );
    }
}

pub fn run<B, S>(
    app: &mut App,
    terminal: &mut Terminal<B>,
    events: &mut S,
    slideshow: bool,
) -> Result<()>
where
    B: ratatui::backend::Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
    S: EventSource,
{
    app.viewport.realize(1);
    app.load_current();
    if slideshow {
        app.viewport.toggle_slideshow();
    }

    let mut last_tick = Instant::now();
    loop {
        if events.poll(Duration::from_millis(8))? {
            let event = events.read()?;
            app.handle_event(event);
        }

        let elapsed = last_tick.elapsed().as_millis() as u64;
        last_tick = Instant::now();
        app.viewport.pump(elapsed);
        app.apply_navigation();

        terminal.draw(|frame| app.render(frame))?;

        if app.quit {
            break;
        }
    }
    Ok(())
}
