//! WASM bindings for cadence-playback
//!
//! This module provides WebAssembly bindings for the PlaybackController,
//! so the transport logic can drive a browser audio library directly.

pub mod engine;
pub mod player;

pub use engine::{JsAudioEngine, JsAudioResource, JsWaveAnimation, WasmEngine, WasmResource};
pub use player::WasmPlayer;
