//! Cadence - Playlist Playback
//!
//! Platform-agnostic playlist player core.
//!
//! This crate provides:
//! - Track registry (fixed playlist, one lazily created resource per track)
//! - Playback controller (play, pause, skip with wraparound, random skip, seek, volume)
//! - Progress reporter (cooperative per-frame position polling)
//! - Display synchronizer (title, timer, progress bar, buttons, panels, volume slider)
//! - A simulated engine for headless sessions and tests
//!
//! # Architecture
//!
//! `cadence-playback` does not decode or output audio. The platform provides
//! an [`AudioEngine`] that creates [`AudioResource`]s and reports their
//! lifecycle (ready, loaded, ended, paused, stopped, seeked, load failed)
//! through a [`LifecycleNotifier`]. The host calls
//! [`PlaybackController::frame`] on every redraw opportunity; that is where
//! lifecycle signals are dispatched and progress is polled.
//!
//! # Example: Headless Session
//!
//! ```rust
//! use cadence_playback::{
//!     Direction, PlaybackController, PlayerConfig, Playlist, SimulatedEngine, TrackEntry,
//! };
//! use std::time::Duration;
//!
//! let entries = vec![
//!     TrackEntry::new("Bass Bros.mp3", "Bass Bros.mp3"),
//!     TrackEntry::new("Prise De Sens.mp3", "Prise De Sens.mp3"),
//! ];
//! let config = PlayerConfig::default();
//! let playlist = Playlist::from_entries(entries, &config.audio_root).unwrap();
//!
//! let engine = SimulatedEngine::new();
//! let mut player = PlaybackController::new(playlist, engine.clone(), config);
//!
//! player.play(None).unwrap();
//! engine.advance(Duration::from_secs(1));
//! player.frame(engine.clock());
//!
//! assert_eq!(player.display().title, "Bass Bros");
//! assert!(player.display().waveform);
//!
//! player.skip(Direction::Next).unwrap();
//! assert_eq!(player.current_index(), 1);
//! ```

mod adapter;
mod controller;
mod display;
mod error;
mod events;
mod progress;
mod registry;
mod simulated;
pub mod types;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use adapter::{
    AudioEngine, AudioResource, LifecycleEvent, LifecycleNotifier, LifecycleSignal,
    ResourceRequest, WaveAnimation,
};
pub use controller::PlaybackController;
pub use display::{format_time, DisplayState, DisplaySynchronizer, Fade, Panel, TransportButton};
pub use error::{EngineError, PlaybackError, Result};
pub use events::{PanelKind, PlaybackEvent};
pub use progress::{progress_fraction, ProgressReporter, ProgressSample};
pub use registry::{display_title, Playlist, TrackDescriptor, TrackEntry};
pub use simulated::{SimulatedEngine, SimulatedResource, SimulatedTrack};
pub use types::{Direction, LoadState, PlayerConfig, SliderGeometry, TrackStatus, Viewport};
