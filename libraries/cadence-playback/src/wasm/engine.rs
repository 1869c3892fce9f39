//! JavaScript-backed audio engine
//!
//! Adapts an engine object supplied by the page (for example a thin wrapper
//! around an HTML5 audio library) to [`AudioEngine`]. Lifecycle callbacks
//! fired in JavaScript are routed back through
//! [`WasmPlayer::notify`](super::WasmPlayer::notify).

use crate::adapter::{AudioEngine, AudioResource, LifecycleNotifier, ResourceRequest, WaveAnimation};
use crate::error::EngineError;
use crate::types::LoadState;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// Engine object provided by JavaScript
    pub type JsAudioEngine;

    #[wasm_bindgen(method, catch)]
    fn construct(
        this: &JsAudioEngine,
        track: usize,
        sources: js_sys::Array,
        streaming: bool,
    ) -> Result<JsAudioResource, JsValue>;

    #[wasm_bindgen(method, js_name = setGlobalVolume)]
    fn set_global_volume(this: &JsAudioEngine, level: f32);

    /// Resource object returned by `JsAudioEngine.construct`
    pub type JsAudioResource;

    #[wasm_bindgen(method)]
    fn play(this: &JsAudioResource);

    #[wasm_bindgen(method)]
    fn pause(this: &JsAudioResource);

    #[wasm_bindgen(method)]
    fn stop(this: &JsAudioResource);

    #[wasm_bindgen(method)]
    fn seek(this: &JsAudioResource, seconds: f64);

    #[wasm_bindgen(method)]
    fn position(this: &JsAudioResource) -> f64;

    #[wasm_bindgen(method)]
    fn duration(this: &JsAudioResource) -> f64;

    #[wasm_bindgen(method)]
    fn volume(this: &JsAudioResource) -> f32;

    #[wasm_bindgen(method, js_name = setVolume)]
    fn set_volume(this: &JsAudioResource, level: f32);

    #[wasm_bindgen(method)]
    fn playing(this: &JsAudioResource) -> bool;

    #[wasm_bindgen(method)]
    fn state(this: &JsAudioResource) -> String;

    /// Waveform animation object provided by JavaScript
    pub type JsWaveAnimation;

    #[wasm_bindgen(method)]
    fn start(this: &JsWaveAnimation);

    #[wasm_bindgen(method)]
    fn resize(this: &JsWaveAnimation, width: f64, height: f64);
}

/// Notifiers by track, shared between the engine and the player
pub(crate) type Notifiers = Rc<RefCell<HashMap<usize, LifecycleNotifier>>>;

fn secs(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

/// [`AudioEngine`] over a [`JsAudioEngine`]
pub struct WasmEngine {
    js: JsAudioEngine,
    notifiers: Notifiers,
}

impl WasmEngine {
    pub fn new(js: JsAudioEngine) -> Self {
        Self {
            js,
            notifiers: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub(crate) fn notifiers(&self) -> Notifiers {
        self.notifiers.clone()
    }
}

impl AudioEngine for WasmEngine {
    type Resource = WasmResource;

    fn construct(
        &mut self,
        request: ResourceRequest,
        notifier: LifecycleNotifier,
    ) -> Result<WasmResource, EngineError> {
        let sources: js_sys::Array = request
            .sources
            .iter()
            .map(|s| JsValue::from_str(s))
            .collect();

        let js = self
            .js
            .construct(request.track, sources, request.streaming)
            .map_err(|err| {
                EngineError::new(
                    err.as_string()
                        .unwrap_or_else(|| "engine refused to construct resource".to_string()),
                )
            })?;

        self.notifiers.borrow_mut().insert(request.track, notifier);
        Ok(WasmResource { js })
    }

    fn set_global_volume(&mut self, level: f32) {
        self.js.set_global_volume(level);
    }
}

/// [`AudioResource`] over a [`JsAudioResource`]
pub struct WasmResource {
    js: JsAudioResource,
}

impl AudioResource for WasmResource {
    fn play(&mut self) {
        self.js.play();
    }

    fn pause(&mut self) {
        self.js.pause();
    }

    fn stop(&mut self) {
        self.js.stop();
    }

    fn seek(&mut self, position: Duration) {
        self.js.seek(position.as_secs_f64());
    }

    fn position(&self) -> Option<Duration> {
        secs(self.js.position())
    }

    fn duration(&self) -> Duration {
        secs(self.js.duration()).unwrap_or_default()
    }

    fn volume(&self) -> f32 {
        self.js.volume()
    }

    fn set_volume(&mut self, level: f32) {
        self.js.set_volume(level);
    }

    fn is_playing(&self) -> bool {
        self.js.playing()
    }

    fn state(&self) -> LoadState {
        match self.js.state().as_str() {
            "loading" => LoadState::Loading,
            "loaded" => LoadState::Loaded,
            "failed" | "error" => LoadState::Failed,
            _ => LoadState::Unloaded,
        }
    }
}

impl WaveAnimation for JsWaveAnimation {
    fn start(&mut self) {
        JsWaveAnimation::start(self);
    }

    fn resize(&mut self, width: f64, height: f64) {
        JsWaveAnimation::resize(self, width, height);
    }
}
