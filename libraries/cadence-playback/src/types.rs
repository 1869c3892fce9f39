//! Core types for playback control

use serde::{Deserialize, Serialize};

/// Direction for stepping through the playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Following track, wrapping from the last to the first
    Next,

    /// Preceding track, wrapping from the first to the last
    Prev,
}

impl Direction {
    /// Neighbouring index of `current` in a playlist of `len` tracks
    ///
    /// `Next` at `len - 1` yields `0` and `Prev` at `0` yields `len - 1`.
    pub fn neighbor(self, current: usize, len: usize) -> usize {
        debug_assert!(len > 0);
        match self {
            Direction::Next => {
                if current + 1 >= len {
                    0
                } else {
                    current + 1
                }
            }
            Direction::Prev => {
                if current == 0 {
                    len - 1
                } else {
                    current - 1
                }
            }
        }
    }
}

/// Load state reported by an audio resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// Nothing requested yet
    Unloaded,

    /// Fetching/decoding in progress
    Loading,

    /// Ready for transport commands
    Loaded,

    /// The asset could not be loaded
    Failed,
}

/// Status of one track, derived from its resource on every query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    /// No resource has been created for the track
    Unconstructed,

    /// Resource exists and is still loading
    Loading,

    /// Audibly playing
    Playing,

    /// Loaded but not playing (paused, stopped or finished)
    Idle,

    /// Loading failed
    Failed,
}

/// Visible area the player is laid out in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Width in pixels
    pub width: f64,

    /// Height in pixels
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Geometry of the volume slider
///
/// The filled bar spans `track_fraction` of the viewport width at full
/// volume and starts `margin_fraction` of the width from the left edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderGeometry {
    /// Share of the viewport width covered at volume 1.0 (default: 0.9)
    pub track_fraction: f64,

    /// Left margin as a share of the viewport width (default: 0.05)
    pub margin_fraction: f64,

    /// Half the handle width, so the handle centres on the bar end (default: 25)
    pub handle_half_width_px: f64,
}

impl Default for SliderGeometry {
    fn default() -> Self {
        Self {
            track_fraction: 0.9,
            margin_fraction: 0.05,
            handle_half_width_px: 25.0,
        }
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial global volume (0.0-1.0, default: 1.0)
    pub initial_volume: f32,

    /// Prefix joined to every track file to form its source locator (default: "./audio/")
    pub audio_root: String,

    /// Ask the engine to stream instead of fully decoding first (default: true)
    pub streaming: bool,

    /// Delay before a hidden panel gives up its layout space (default: 500)
    pub panel_fade_ms: u64,

    /// Volume slider geometry
    pub slider: SliderGeometry,

    /// Initial viewport
    pub viewport: Viewport,

    /// Seed for random advance; entropy when absent
    pub shuffle_seed: Option<u64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_volume: 1.0,
            audio_root: "./audio/".to_string(),
            streaming: true,
            panel_fade_ms: 500,
            slider: SliderGeometry::default(),
            viewport: Viewport::default(),
            shuffle_seed: None,
        }
    }
}
