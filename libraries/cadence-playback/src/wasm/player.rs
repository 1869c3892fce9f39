//! WASM-compatible PlaybackController wrapper

use super::engine::{JsAudioEngine, JsWaveAnimation, Notifiers, WasmEngine};
use crate::{
    Direction, LifecycleEvent, PlaybackController, PlaybackError, PlayerConfig, Playlist,
    TrackEntry,
};
use js_sys::Function;
use std::time::Duration;
use wasm_bindgen::prelude::*;

fn millis(now_ms: f64) -> Duration {
    Duration::try_from_secs_f64(now_ms / 1000.0).unwrap_or_default()
}

/// Map a JavaScript lifecycle callback name onto a [`LifecycleEvent`]
fn lifecycle_event(kind: &str, detail: Option<String>) -> Option<LifecycleEvent> {
    let event = match kind {
        "play" | "ready" => LifecycleEvent::Ready,
        "load" => LifecycleEvent::Loaded,
        "end" => LifecycleEvent::Ended,
        "pause" => LifecycleEvent::Paused,
        "stop" => LifecycleEvent::Stopped,
        "seek" => LifecycleEvent::Seeked,
        "loaderror" | "playerror" => {
            LifecycleEvent::LoadFailed(detail.unwrap_or_else(|| kind.to_string()))
        }
        _ => return None,
    };
    Some(event)
}

/// WASM-compatible playlist player
///
/// Wraps [`PlaybackController`] over a JavaScript audio engine. The page
/// forwards the engine's lifecycle callbacks to [`notify`](Self::notify) and
/// calls [`frame`](Self::frame) from `requestAnimationFrame`.
#[wasm_bindgen]
pub struct WasmPlayer {
    inner: PlaybackController<WasmEngine>,
    notifiers: Notifiers,

    // Event callbacks
    on_event: Option<Function>,
    on_error: Option<Function>,
}

#[wasm_bindgen]
impl WasmPlayer {
    /// Create a player over `engine`
    ///
    /// `tracks` is an array of `{ title, file }`; `config` may be omitted.
    #[wasm_bindgen(constructor)]
    pub fn new(engine: JsAudioEngine, tracks: JsValue, config: JsValue) -> Result<WasmPlayer, JsValue> {
        // Enable panic hooks for better error messages in console
        console_error_panic_hook::set_once();

        let entries: Vec<TrackEntry> = serde_wasm_bindgen::from_value(tracks)
            .map_err(|e| JsValue::from_str(&format!("Invalid tracks: {}", e)))?;

        let config: PlayerConfig = if config.is_undefined() || config.is_null() {
            PlayerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };

        let playlist = Playlist::from_entries(entries, &config.audio_root)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let engine = WasmEngine::new(engine);
        let notifiers = engine.notifiers();

        Ok(Self {
            inner: PlaybackController::new(playlist, engine, config),
            notifiers,
            on_event: None,
            on_error: None,
        })
    }

    /// Attach the waveform animation and start it
    #[wasm_bindgen(js_name = attachAnimation)]
    pub fn attach_animation(&mut self, animation: JsWaveAnimation) {
        self.inner.attach_animation(Box::new(animation));
    }

    // ===== Playback Control =====

    /// Play `index`, or the current track when omitted
    pub fn play(&mut self, index: Option<usize>) -> Result<(), JsValue> {
        let result = self.inner.play(index);
        self.settle(result)
    }

    /// Pause the current track
    pub fn pause(&mut self) -> Result<(), JsValue> {
        let result = self.inner.pause();
        self.settle(result)
    }

    /// Skip to the next track, wrapping to the first
    pub fn next(&mut self) -> Result<(), JsValue> {
        let result = self.inner.skip(Direction::Next);
        self.settle(result)
    }

    /// Skip to the previous track, wrapping to the last
    pub fn previous(&mut self) -> Result<(), JsValue> {
        let result = self.inner.skip(Direction::Prev);
        self.settle(result)
    }

    /// Skip to a specific playlist index
    #[wasm_bindgen(js_name = skipTo)]
    pub fn skip_to(&mut self, index: usize) -> Result<(), JsValue> {
        let result = self.inner.skip_to(index);
        self.settle(result)
    }

    /// Skip to a random track; returns the chosen index
    #[wasm_bindgen(js_name = skipRandom)]
    pub fn skip_random(&mut self) -> Result<usize, JsValue> {
        let result = self.inner.skip_random();
        self.flush_events();
        result.map_err(|e| self.handle_error(e))
    }

    // ===== Volume & Seeking =====

    /// Set global volume (0.0 - 1.0)
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, level: f32) {
        self.inner.set_volume(level);
        self.flush_events();
    }

    /// Get global volume (0.0 - 1.0)
    #[wasm_bindgen(js_name = getVolume)]
    pub fn get_volume(&self) -> f32 {
        self.inner.volume()
    }

    /// Set global volume from a pointer x coordinate on the volume bar;
    /// returns the level applied
    #[wasm_bindgen(js_name = slideVolume)]
    pub fn slide_volume(&mut self, x_px: f64) -> f32 {
        let level = self.inner.set_volume_from_slider(x_px);
        self.flush_events();
        level
    }

    /// Seek by fraction of the track (0.0 - 1.0)
    pub fn seek(&mut self, fraction: f64) {
        self.inner.seek(fraction);
    }

    // ===== Panels & Layout =====

    #[wasm_bindgen(js_name = togglePlaylist)]
    pub fn toggle_playlist(&mut self, now_ms: f64) -> bool {
        let open = self.inner.toggle_playlist_panel(millis(now_ms));
        self.flush_events();
        open
    }

    #[wasm_bindgen(js_name = toggleVolume)]
    pub fn toggle_volume(&mut self, now_ms: f64) -> bool {
        let open = self.inner.toggle_volume_panel(millis(now_ms));
        self.flush_events();
        open
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.inner.resize(width, height);
    }

    // ===== Engine Callbacks =====

    /// Forward a lifecycle callback fired by the engine for `track`
    ///
    /// `kind` is one of `play`, `load`, `end`, `pause`, `stop`, `seek`,
    /// `loaderror` or `playerror`.
    pub fn notify(&self, track: usize, kind: &str, detail: Option<String>) -> Result<(), JsValue> {
        let event = lifecycle_event(kind, detail)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown lifecycle event: {}", kind)))?;

        let notifiers = self.notifiers.borrow();
        let notifier = notifiers
            .get(&track)
            .ok_or_else(|| self.handle_error(PlaybackError::InvalidIndex {
                index: track,
                len: self.inner.track_count(),
            }))?;
        notifier.notify(event);
        Ok(())
    }

    /// One redraw opportunity; `now_ms` is a `performance.now()` timestamp
    pub fn frame(&mut self, now_ms: f64) {
        self.inner.frame(millis(now_ms));
        self.flush_events();
    }

    // ===== Queries =====

    #[wasm_bindgen(js_name = currentIndex)]
    pub fn current_index(&self) -> usize {
        self.inner.current_index()
    }

    #[wasm_bindgen(js_name = trackCount)]
    pub fn track_count(&self) -> usize {
        self.inner.track_count()
    }

    /// Display titles in playlist order
    pub fn titles(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.titles()).unwrap_or(JsValue::NULL)
    }

    /// Snapshot of everything the page should render
    pub fn display(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.inner.display()).unwrap_or(JsValue::NULL)
    }

    /// Status of one track: unconstructed, loading, playing, idle or failed
    pub fn status(&self, index: usize) -> Result<JsValue, JsValue> {
        let status = self
            .inner
            .track_status(index)
            .map_err(|e| self.handle_error(e))?;
        serde_wasm_bindgen::to_value(&status).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Pending playback events, for pages that poll instead of listening
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.drain_events()).unwrap_or(JsValue::NULL)
    }

    // ===== Event Listeners =====

    /// Register a callback receiving each playback event
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&mut self, callback: Function) {
        self.on_event = Some(callback);
    }

    /// Register error callback
    #[wasm_bindgen(js_name = onError)]
    pub fn on_error(&mut self, callback: Function) {
        self.on_error = Some(callback);
    }

    // ===== Internal Helpers =====

    fn settle(&mut self, result: crate::Result<()>) -> Result<(), JsValue> {
        self.flush_events();
        result.map_err(|e| self.handle_error(e))
    }

    /// Hand queued events to the `onEvent` callback; without one they stay
    /// queued for `drainEvents`
    fn flush_events(&mut self) {
        let Some(ref cb) = self.on_event else {
            return;
        };
        for event in self.inner.drain_events() {
            if let Ok(js_event) = serde_wasm_bindgen::to_value(&event) {
                cb.call1(&JsValue::NULL, &js_event).ok();
            }
        }
    }

    fn handle_error(&self, error: PlaybackError) -> JsValue {
        let err_msg = error.to_string();
        web_sys::console::error_1(&JsValue::from_str(&err_msg));

        if let Some(ref cb) = self.on_error {
            cb.call1(&JsValue::NULL, &JsValue::from_str(&err_msg)).ok();
        }

        JsValue::from_str(&err_msg)
    }
}
