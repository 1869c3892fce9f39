//! Error types for playback control

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Index outside the playlist
    #[error("Invalid track index {index} (playlist has {len} tracks)")]
    InvalidIndex { index: usize, len: usize },

    /// Operation needs a constructed resource on the selected track
    #[error("No active track")]
    NoActiveTrack,

    /// The audio engine could not create a resource for a track
    #[error("Failed to construct audio resource for track {index}: {reason}")]
    ResourceConstruction { index: usize, reason: String },

    /// Playlist has no tracks
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Failure reported by an [`AudioEngine`](crate::AudioEngine) while constructing a resource
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
