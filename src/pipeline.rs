//! Thin control/state wrapper around an external media pipeline.
//!
//! Only the pipeline's external control surface is consumed: set a URI,
//! change state, query the video geometry, route a window handle for
//! overlay rendering. The pipeline's internal threading is opaque; its
//! notifications cross back into the single-threaded controller through
//! [`MediaPipeline::poll_bus`], ordered only relative to other loop
//! callbacks.

use std::path::Path;
use std::time::Duration;

use log::{debug, error, info, warn};
use thiserror::Error;

/// Sink types tried in order when the configured one is unavailable.
pub const SINK_FALLBACKS: &[&str] = &["xvimagesink", "ximagesink", "d3dvideosink", "glimagesink"];

/// Bound on waiting for a pipeline state change. The original blocks
/// indefinitely here; a timeout is treated as a content error instead of
/// freezing the loop.
pub const STATE_CHANGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Null,
    Ready,
    Paused,
    Playing,
}

/// Notification delivered from the pipeline's message bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusMessage {
    EndOfStream,
    StateChanged(PipelineState),
    Error(String),
}

/// Platform window handle the pipeline renders into.
pub type WindowHandle = u64;

/// Rectangle of the window surface the video should be exposed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposeRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to create video sink of type '{0}'")]
    SinkUnavailable(String),
    #[error("timed out waiting for pipeline to reach {0:?}")]
    StateTimeout(PipelineState),
    #[error("no video pad available")]
    NoVideoPad,
}

/// External control surface of the playback pipeline.
pub trait MediaPipeline {
    fn set_uri(&mut self, uri: &str);
    fn set_state(&mut self, state: PipelineState);
    /// Block, bounded by `timeout`, until the last requested state is
    /// reached.
    fn await_state(&mut self, timeout: Duration) -> Result<PipelineState, PipelineError>;
    /// Geometry from the current video pad, if one exists.
    fn video_size(&self) -> Option<(u32, u32)>;
    fn seek_start(&mut self);
    /// Volume as a fraction in `[0.0, 1.0]`, on the pipeline's perceptual
    /// (cubic) scale.
    fn set_volume(&mut self, fraction: f64);
    fn set_window_handle(&mut self, handle: WindowHandle);
    /// Render into the given rectangle of the bound window surface. A no-op
    /// on platforms without window-handle compositing.
    fn expose_at(&mut self, rect: ExposeRect);
    fn poll_bus(&mut self) -> Option<BusMessage>;
}

/// Creates pipeline video sinks by type name.
pub trait SinkFactory {
    fn create(&mut self, kind: &str) -> bool;
}

/// Factory for front-ends without a compositing surface: no sink type can
/// be created, so selection always falls through to the pipeline default.
#[derive(Debug, Default)]
pub struct NoSinkFactory;

impl SinkFactory for NoSinkFactory {
    fn create(&mut self, _kind: &str) -> bool {
        false
    }
}

/// Pick a video sink: the configured preference first, then the fallback
/// chain, finally none (the pipeline's own default route still plays).
pub fn select_video_sink(factory: &mut dyn SinkFactory, preferred: Option<&str>) -> Option<String> {
    if let Some(name) = preferred {
        if factory.create(name) {
            info!("using video sink of type '{name}'");
            return Some(name.to_string());
        }
        error!("invalid video sink setting provided '{name}'");
    }
    for name in SINK_FALLBACKS {
        if factory.create(name) {
            info!("using video sink of type '{name}'");
            return Some((*name).to_string());
        }
        error!("{}", PipelineError::SinkUnavailable((*name).to_string()));
    }
    warn!("no video sink available, relying on the pipeline default");
    None
}

/// Volume setting (0-100) as the fraction handed to the pipeline, capped at
/// full volume.
pub fn volume_fraction(volume: u8) -> f64 {
    (volume as f64 / 100.0).min(1.0)
}

fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Adapter owning the pipeline control surface and the playing flag.
///
/// The adapter never owns window lifetime: it binds to a handle supplied
/// once at first realization and re-arms the pipeline to ready at that
/// point.
pub struct VideoAdapter {
    pipeline: Box<dyn MediaPipeline>,
    playing: bool,
    window_handle: Option<WindowHandle>,
}

impl VideoAdapter {
    pub fn new(pipeline: Box<dyn MediaPipeline>) -> Self {
        Self {
            pipeline,
            playing: false,
            window_handle: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Bind the window surface and bring the pipeline to ready.
    pub fn realize(&mut self, handle: WindowHandle) {
        self.window_handle = Some(handle);
        self.pipeline.set_window_handle(handle);
        self.pipeline.set_state(PipelineState::Ready);
    }

    /// Point the pipeline at a file, apply the volume setting and pause,
    /// waiting (bounded) for the state change to land.
    pub fn load(&mut self, path: &Path, volume: u8) -> Result<(), PipelineError> {
        let uri = file_uri(path);
        debug!("loading media uri {uri}");
        self.pipeline.set_uri(&uri);
        self.pipeline.set_volume(volume_fraction(volume));
        self.pipeline.set_state(PipelineState::Paused);
        self.pipeline.await_state(STATE_CHANGE_TIMEOUT)?;
        Ok(())
    }

    /// Geometry of the loaded video. A stream without a video pad reports
    /// [`PipelineError::NoVideoPad`] and the content is treated as erroring.
    pub fn query_video_size(&mut self) -> Result<(u32, u32), PipelineError> {
        self.pipeline.video_size().ok_or(PipelineError::NoVideoPad)
    }

    pub fn play(&mut self) {
        self.pipeline.set_state(PipelineState::Playing);
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.pipeline.set_state(PipelineState::Paused);
    }

    /// Return the pipeline to idle and clear the playing flag.
    pub fn reset(&mut self) {
        self.pipeline.set_state(PipelineState::Null);
        self.playing = false;
    }

    pub fn expose_at(&mut self, rect: ExposeRect) {
        self.pipeline.expose_at(rect);
    }

    /// Drain bus notifications. End-of-stream seeks back to position zero
    /// for loop playback.
    pub fn pump_bus(&mut self) {
        while let Some(message) = self.pipeline.poll_bus() {
            match message {
                BusMessage::EndOfStream => {
                    debug!("end of stream, seeking to start");
                    self.pipeline.seek_start();
                }
                BusMessage::StateChanged(state) => debug!("pipeline reached {state:?}"),
                BusMessage::Error(err) => warn!("pipeline error: {err}"),
            }
        }
    }
}

impl std::fmt::Debug for VideoAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoAdapter")
            .field("playing", &self.playing)
            .field("window_handle", &self.window_handle)
            .finish()
    }
}

/// Pipeline stub for platforms without a playback engine: every video gets
/// no video pad, so the controller substitutes the placeholder.
#[derive(Debug, Default)]
pub struct NullPipeline;

impl MediaPipeline for NullPipeline {
    fn set_uri(&mut self, _uri: &str) {}
    fn set_state(&mut self, _state: PipelineState) {}
    fn await_state(&mut self, _timeout: Duration) -> Result<PipelineState, PipelineError> {
        Ok(PipelineState::Null)
    }
    fn video_size(&self) -> Option<(u32, u32)> {
        None
    }
    fn seek_start(&mut self) {}
    fn set_volume(&mut self, _fraction: f64) {}
    fn set_window_handle(&mut self, _handle: WindowHandle) {}
    fn expose_at(&mut self, _rect: ExposeRect) {}
    fn poll_bus(&mut self) -> Option<BusMessage> {
        None
    }
}

pub mod mock {
    //! Scripted pipeline for tests. Observable state lives behind a shared
    //! handle so assertions can inspect it after the pipeline moved into
    //! the adapter.

    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    pub struct MockState {
        pub uri: Option<String>,
        pub state: Option<PipelineState>,
        pub state_history: Vec<PipelineState>,
        pub volume: Option<f64>,
        pub window_handle: Option<WindowHandle>,
        pub video_size: Option<(u32, u32)>,
        pub seeks: u32,
        pub exposes: Vec<ExposeRect>,
        pub bus: VecDeque<BusMessage>,
        pub fail_await: bool,
    }

    #[derive(Debug, Clone, Default)]
    pub struct MockPipeline {
        state: Rc<RefCell<MockState>>,
    }

    impl MockPipeline {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_video_size(size: (u32, u32)) -> Self {
            let mock = Self::default();
            mock.state.borrow_mut().video_size = Some(size);
            mock
        }

        /// Shared handle for inspecting calls after the pipeline has been
        /// handed to an adapter.
        pub fn handle(&self) -> Rc<RefCell<MockState>> {
            Rc::clone(&self.state)
        }

        pub fn push_bus(&self, message: BusMessage) {
            self.state.borrow_mut().bus.push_back(message);
        }
    }

    impl MediaPipeline for MockPipeline {
        fn set_uri(&mut self, uri: &str) {
            self.state.borrow_mut().uri = Some(uri.to_string());
        }

        fn set_state(&mut self, state: PipelineState) {
            let mut s = self.state.borrow_mut();
            s.state = Some(state);
            s.state_history.push(state);
        }

        fn await_state(&mut self, _timeout: Duration) -> Result<PipelineState, PipelineError> {
            let s = self.state.borrow();
            if s.fail_await {
                return Err(PipelineError::StateTimeout(
                    s.state.unwrap_or(PipelineState::Null),
                ));
            }
            Ok(s.state.unwrap_or(PipelineState::Null))
        }

        fn video_size(&self) -> Option<(u32, u32)> {
            self.state.borrow().video_size
        }

        fn seek_start(&mut self) {
            self.state.borrow_mut().seeks += 1;
        }

        fn set_volume(&mut self, fraction: f64) {
            self.state.borrow_mut().volume = Some(fraction);
        }

        fn set_window_handle(&mut self, handle: WindowHandle) {
            self.state.borrow_mut().window_handle = Some(handle);
        }

        fn expose_at(&mut self, rect: ExposeRect) {
            self.state.borrow_mut().exposes.push(rect);
        }

        fn poll_bus(&mut self) -> Option<BusMessage> {
            self.state.borrow_mut().bus.pop_front()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockPipeline;
    use super::*;
    use std::path::PathBuf;

    struct ScriptedFactory {
        available: Vec<&'static str>,
        attempts: Vec<String>,
    }

    impl SinkFactory for ScriptedFactory {
        fn create(&mut self, kind: &str) -> bool {
            self.attempts.push(kind.to_string());
            self.available.contains(&kind)
        }
    }

    #[test]
    fn preferred_sink_wins_when_available() {
        let mut factory = ScriptedFactory {
            available: vec!["glimagesink", "customsink"],
            attempts: Vec::new(),
        };
        let sink = select_video_sink(&mut factory, Some("customsink"));
        assert_eq!(sink.as_deref(), Some("customsink"));
        assert_eq!(factory.attempts, vec!["customsink"]);
    }

    #[test]
    fn unavailable_preference_falls_back_in_order() {
        let mut factory = ScriptedFactory {
            available: vec!["glimagesink"],
            attempts: Vec::new(),
        };
        let sink = select_video_sink(&mut factory, Some("bogussink"));
        assert_eq!(sink.as_deref(), Some("glimagesink"));
        assert_eq!(
            factory.attempts,
            vec!["bogussink", "xvimagesink", "ximagesink", "d3dvideosink", "glimagesink"]
        );
    }

    #[test]
    fn no_sink_at_all_yields_none() {
        assert_eq!(select_video_sink(&mut NoSinkFactory, None), None);
        assert_eq!(select_video_sink(&mut NoSinkFactory, Some("xvimagesink")), None);
    }

    #[test]
    fn volume_fraction_caps_at_full() {
        assert_eq!(volume_fraction(50), 0.5);
        assert_eq!(volume_fraction(100), 1.0);
        assert_eq!(volume_fraction(200), 1.0);
    }

    #[test]
    fn load_pauses_and_applies_volume() {
        let mock = MockPipeline::with_video_size((640, 480));
        let state = mock.handle();
        let mut adapter = VideoAdapter::new(Box::new(mock));

        adapter
            .load(&PathBuf::from("/videos/clip.webm"), 80)
            .unwrap();

        let s = state.borrow();
        assert_eq!(s.uri.as_deref(), Some("file:///videos/clip.webm"));
        assert_eq!(s.volume, Some(0.8));
        assert_eq!(s.state, Some(PipelineState::Paused));
        assert!(!adapter.is_playing());
    }

    #[test]
    fn realize_binds_window_and_arms_ready_state() {
        let mock = MockPipeline::new();
        let state = mock.handle();
        let mut adapter = VideoAdapter::new(Box::new(mock));

        adapter.realize(42);
        let s = state.borrow();
        assert_eq!(s.window_handle, Some(42));
        assert_eq!(s.state, Some(PipelineState::Ready));
    }

    #[test]
    fn end_of_stream_seeks_back_to_start() {
        let mock = MockPipeline::new();
        let state = mock.handle();
        mock.push_bus(BusMessage::EndOfStream);
        mock.push_bus(BusMessage::EndOfStream);
        let mut adapter = VideoAdapter::new(Box::new(mock));

        adapter.pump_bus();
        assert_eq!(state.borrow().seeks, 2);
        assert!(state.borrow().bus.is_empty());
    }

    #[test]
    fn reset_returns_to_null_and_clears_playing() {
        let mock = MockPipeline::new();
        let state = mock.handle();
        let mut adapter = VideoAdapter::new(Box::new(mock));

        adapter.play();
        assert!(adapter.is_playing());
        adapter.reset();
        assert!(!adapter.is_playing());
        assert_eq!(state.borrow().state, Some(PipelineState::Null));
    }

    #[test]
    fn missing_video_pad_reports_the_error() {
        let mut adapter = VideoAdapter::new(Box::new(NullPipeline));
        assert!(matches!(
            adapter.query_video_size(),
            Err(PipelineError::NoVideoPad)
        ));
    }
}
