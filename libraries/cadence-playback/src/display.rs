//! Display synchronizer
//!
//! Projects controller and reporter state onto the small, fixed set of
//! visual fields the player shows. Every write is idempotent, so a late
//! duplicate update (e.g. an extra terminal progress tick) leaves the
//! display consistent.

use crate::adapter::WaveAnimation;
use crate::progress::ProgressSample;
use crate::types::{PlayerConfig, SliderGeometry, Viewport};
use serde::Serialize;
use std::time::Duration;

/// Format seconds as `M:SS`
///
/// Minutes are not padded; seconds always use two digits. Negative and
/// non-finite input formats as `0:00`.
pub fn format_time(secs: f64) -> String {
    let secs = if secs.is_finite() && secs > 0.0 { secs } else { 0.0 };
    let minutes = (secs / 60.0).floor();
    let seconds = (secs - minutes * 60.0).floor();
    format!("{}:{:02}", minutes as u64, seconds as u64)
}

/// Which of the two mutually exclusive transport buttons is visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportButton {
    Play,
    Pause,
}

/// Fade class applied to a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fade {
    In,
    Out,
}

/// A panel that fades in immediately and gives up its layout space only
/// after its fade-out finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    displayed: bool,
    fade: Fade,
    #[serde(skip)]
    hide_at: Option<Duration>,
}

impl Panel {
    fn hidden() -> Self {
        Self {
            displayed: false,
            fade: Fade::Out,
            hide_at: None,
        }
    }

    /// Whether the panel occupies layout space
    pub fn is_displayed(&self) -> bool {
        self.displayed
    }

    pub fn fade(&self) -> Fade {
        self.fade
    }

    /// Whether the panel is shown or about to be (not fading out)
    pub fn is_open(&self) -> bool {
        self.fade == Fade::In
    }

    /// Whether a deferred hide is still pending
    pub fn is_hiding(&self) -> bool {
        self.hide_at.is_some()
    }

    /// Returns whether the panel is now open
    fn toggle(&mut self, now: Duration, fade_delay: Duration) -> bool {
        if self.is_open() {
            self.fade = Fade::Out;
            self.hide_at = Some(now + fade_delay);
            self.settle(now);
            false
        } else {
            self.fade = Fade::In;
            self.displayed = true;
            self.hide_at = None;
            true
        }
    }

    fn settle(&mut self, now: Duration) {
        if let Some(at) = self.hide_at {
            if now >= at {
                self.displayed = false;
                self.hide_at = None;
            }
        }
    }
}

/// Everything the player shows, as plain data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayState {
    pub title: String,

    /// Elapsed time, `M:SS`
    pub timer: String,

    /// Track duration, `M:SS`
    pub duration: String,

    /// Progress bar width in percent
    pub progress_percent: f64,

    pub button: TransportButton,

    /// Loading spinner
    pub loading: bool,

    /// Failure indicator, shown instead of the spinner when loading failed
    pub load_failed: bool,

    /// Waveform visible; the static bar shows otherwise
    pub waveform: bool,

    pub playlist_panel: Panel,

    pub volume_panel: Panel,

    /// Filled part of the volume bar in percent of the viewport width
    pub volume_bar_percent: f64,

    /// Slider handle offset from the left edge, in pixels
    pub slider_offset_px: f64,
}

impl DisplayState {
    /// Static bar visible (the waveform's counterpart)
    pub fn static_bar(&self) -> bool {
        !self.waveform
    }
}

/// Applies display updates and owns the layout context they depend on
pub struct DisplaySynchronizer {
    state: DisplayState,
    viewport: Viewport,
    slider: SliderGeometry,
    fade_delay: Duration,
    volume: f32,
    animation: Option<Box<dyn WaveAnimation>>,
}

impl DisplaySynchronizer {
    pub fn new(config: &PlayerConfig, title: &str) -> Self {
        let mut sync = Self {
            state: DisplayState {
                title: title.to_string(),
                timer: format_time(0.0),
                duration: format_time(0.0),
                progress_percent: 0.0,
                button: TransportButton::Play,
                loading: false,
                load_failed: false,
                waveform: false,
                playlist_panel: Panel::hidden(),
                volume_panel: Panel::hidden(),
                volume_bar_percent: 0.0,
                slider_offset_px: 0.0,
            },
            viewport: config.viewport,
            slider: config.slider,
            fade_delay: Duration::from_millis(config.panel_fade_ms),
            volume: config.initial_volume,
            animation: None,
        };
        sync.sync_slider();
        sync
    }

    /// Attach and start the waveform animation
    pub fn attach_animation(&mut self, mut animation: Box<dyn WaveAnimation>) {
        animation.resize(self.viewport.width, self.viewport.height);
        animation.start();
        self.animation = Some(animation);
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_title(&mut self, title: &str) {
        if self.state.title != title {
            self.state.title = title.to_string();
        }
    }

    /// Track selected but audio not ready yet
    pub fn show_loading(&mut self) {
        self.state.loading = true;
        self.state.load_failed = false;
        self.state.button = TransportButton::Pause;
    }

    /// Audio is playing
    pub fn show_playing(&mut self) {
        self.state.loading = false;
        self.state.load_failed = false;
        self.state.waveform = true;
        self.state.button = TransportButton::Pause;
    }

    /// Asset finished loading; the waveform only shows if it also plays
    pub fn show_loaded(&mut self, playing: bool) {
        self.state.loading = false;
        self.state.waveform = playing;
    }

    /// Playback halted (paused, stopped or ended)
    pub fn show_halted(&mut self) {
        self.state.waveform = false;
    }

    /// User paused
    pub fn show_paused(&mut self) {
        self.state.button = TransportButton::Play;
    }

    pub fn show_load_failed(&mut self) {
        self.state.loading = false;
        self.state.load_failed = true;
        self.state.waveform = false;
        self.state.button = TransportButton::Play;
    }

    pub fn set_duration(&mut self, secs: f64) {
        self.state.duration = format_time(secs);
    }

    pub fn apply_progress(&mut self, sample: &ProgressSample) {
        self.state.timer = format_time(sample.elapsed_secs as f64);
        self.state.progress_percent = sample.fraction * 100.0;
    }

    pub fn reset_progress(&mut self) {
        self.state.progress_percent = 0.0;
    }

    pub fn set_volume(&mut self, level: f32) {
        self.volume = level;
        self.sync_slider();
    }

    /// Viewport changed: re-layout the animation and re-place the slider
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Viewport { width, height };
        if let Some(animation) = self.animation.as_mut() {
            animation.resize(width, height);
        }
        self.sync_slider();
    }

    pub fn toggle_playlist_panel(&mut self, now: Duration) -> bool {
        self.state.playlist_panel.toggle(now, self.fade_delay)
    }

    pub fn toggle_volume_panel(&mut self, now: Duration) -> bool {
        self.state.volume_panel.toggle(now, self.fade_delay)
    }

    /// Apply deferred panel hides that are due
    pub fn settle(&mut self, now: Duration) {
        self.state.playlist_panel.settle(now);
        self.state.volume_panel.settle(now);
    }

    /// Volume selected by a pointer at `x_px` on the volume bar
    ///
    /// Inverse of the handle placement: the bar starts at the left margin
    /// and spans `track_fraction` of the viewport. Positions outside the bar
    /// clamp to silence or full volume.
    pub fn volume_at(&self, x_px: f64) -> f32 {
        let width = self.viewport.width;
        let bar_width = width * self.slider.track_fraction;
        if x_px.is_nan() || !bar_width.is_finite() || bar_width <= 0.0 {
            return 0.0;
        }
        let per = (x_px - width * self.slider.margin_fraction) / bar_width;
        per.clamp(0.0, 1.0) as f32
    }

    fn sync_slider(&mut self) {
        let bar = f64::from(self.volume) * self.slider.track_fraction;
        let width = self.viewport.width;
        self.state.volume_bar_percent = bar * 100.0;
        self.state.slider_offset_px =
            width * bar + width * self.slider.margin_fraction - self.slider.handle_half_width_px;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sync() -> DisplaySynchronizer {
        DisplaySynchronizer::new(&PlayerConfig::default(), "First")
    }

    #[test]
    fn formats_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.0), "0:59");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(3725.0), "62:05");
    }

    #[test]
    fn formats_degenerate_time_as_zero() {
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
    }

    #[test]
    fn initial_state() {
        let sync = sync();
        let state = sync.state();
        assert_eq!(state.title, "First");
        assert_eq!(state.timer, "0:00");
        assert_eq!(state.button, TransportButton::Play);
        assert!(state.static_bar());
        assert!(!state.playlist_panel.is_displayed());
        assert!(!state.volume_panel.is_displayed());
    }

    #[test]
    fn slider_follows_volume_and_viewport() {
        let mut sync = sync();
        sync.resize(1000.0, 600.0);
        sync.set_volume(0.5);

        // bar = 0.45 -> 450 + 50 - 25
        assert!((sync.state().volume_bar_percent - 45.0).abs() < 1e-9);
        assert!((sync.state().slider_offset_px - 475.0).abs() < 1e-9);

        sync.resize(2000.0, 600.0);
        assert!((sync.state().slider_offset_px - 975.0).abs() < 1e-9);
    }

    #[test]
    fn pointer_maps_back_to_volume() {
        let mut sync = sync();
        sync.set_volume(0.3);

        let handle_centre = sync.state().slider_offset_px + 25.0;
        assert!((sync.volume_at(handle_centre) - 0.3).abs() < 1e-6);

        // 1280 px viewport: bar runs from 64 px to 1216 px
        assert_eq!(sync.volume_at(64.0), 0.0);
        assert_eq!(sync.volume_at(640.0), 0.5);
        assert_eq!(sync.volume_at(1216.0), 1.0);
    }

    #[test]
    fn pointer_outside_bar_clamps() {
        let mut sync = sync();
        assert_eq!(sync.volume_at(10.0), 0.0);
        assert_eq!(sync.volume_at(5000.0), 1.0);
        assert_eq!(sync.volume_at(f64::NAN), 0.0);

        sync.resize(0.0, 0.0);
        assert_eq!(sync.volume_at(100.0), 0.0);
    }

    #[test]
    fn loaded_asset_shows_waveform_only_when_playing() {
        let mut sync = sync();
        sync.show_loading();
        sync.show_loaded(false);
        assert!(!sync.state().loading);
        assert!(sync.state().static_bar());

        sync.show_loaded(true);
        assert!(sync.state().waveform);
    }

    #[test]
    fn buttons_are_mutually_exclusive() {
        let mut sync = sync();
        sync.show_loading();
        assert_eq!(sync.state().button, TransportButton::Pause);
        assert!(sync.state().loading);

        sync.show_playing();
        assert!(!sync.state().loading);
        assert!(sync.state().waveform);

        sync.show_paused();
        sync.show_halted();
        assert_eq!(sync.state().button, TransportButton::Play);
        assert!(sync.state().static_bar());
    }

    #[test]
    fn load_failure_replaces_spinner() {
        let mut sync = sync();
        sync.show_loading();
        sync.show_load_failed();

        assert!(!sync.state().loading);
        assert!(sync.state().load_failed);
        assert_eq!(sync.state().button, TransportButton::Play);

        sync.show_loading();
        assert!(!sync.state().load_failed);
    }

    #[test]
    fn panel_shows_immediately_and_hides_after_fade() {
        let mut sync = sync();
        let t0 = Duration::from_secs(10);

        assert!(sync.toggle_playlist_panel(t0));
        assert!(sync.state().playlist_panel.is_displayed());
        assert_eq!(sync.state().playlist_panel.fade(), Fade::In);

        assert!(!sync.toggle_playlist_panel(t0));
        assert_eq!(sync.state().playlist_panel.fade(), Fade::Out);
        assert!(sync.state().playlist_panel.is_displayed());

        sync.settle(t0 + Duration::from_millis(499));
        assert!(sync.state().playlist_panel.is_displayed());

        sync.settle(t0 + Duration::from_millis(500));
        assert!(!sync.state().playlist_panel.is_displayed());
        assert!(!sync.state().playlist_panel.is_hiding());
    }

    #[test]
    fn reopening_during_fade_cancels_hide() {
        let mut sync = sync();
        let t0 = Duration::from_secs(1);

        sync.toggle_volume_panel(t0);
        sync.toggle_volume_panel(t0);
        assert!(sync.toggle_volume_panel(t0 + Duration::from_millis(100)));

        sync.settle(t0 + Duration::from_secs(5));
        assert!(sync.state().volume_panel.is_displayed());
        assert!(sync.state().volume_panel.is_open());
    }

    #[test]
    fn progress_writes_are_idempotent() {
        let mut sync = sync();
        let sample = ProgressSample {
            track: 0,
            position: Duration::from_secs(65),
            elapsed_secs: 65,
            fraction: 0.5,
        };

        sync.apply_progress(&sample);
        let once = sync.state().clone();
        sync.apply_progress(&sample);
        assert_eq!(sync.state(), &once);
        assert_eq!(once.timer, "1:05");
        assert_eq!(once.progress_percent, 50.0);
    }

    #[derive(Default)]
    struct Calls {
        started: u32,
        sizes: Vec<(f64, f64)>,
    }

    struct RecordingAnimation(Rc<RefCell<Calls>>);

    impl WaveAnimation for RecordingAnimation {
        fn start(&mut self) {
            self.0.borrow_mut().started += 1;
        }

        fn resize(&mut self, width: f64, height: f64) {
            self.0.borrow_mut().sizes.push((width, height));
        }
    }

    #[test]
    fn animation_is_started_and_resized() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut sync = sync();

        sync.attach_animation(Box::new(RecordingAnimation(calls.clone())));
        sync.resize(800.0, 400.0);

        let calls = calls.borrow();
        assert_eq!(calls.started, 1);
        assert_eq!(calls.sizes, vec![(1280.0, 720.0), (800.0, 400.0)]);
    }
}
