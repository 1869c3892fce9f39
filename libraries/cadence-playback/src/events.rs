//! Playback events
//!
//! Event-based communication for UI synchronization. The controller queues
//! events as state changes and the host drains them once per frame.

use crate::types::TrackStatus;
use serde::{Deserialize, Serialize};

/// Which toggleable panel changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    Playlist,
    Volume,
}

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// Selection moved to another track (or the same track was re-selected)
    TrackChanged {
        index: usize,
        previous: usize,
        title: String,
    },

    /// The selected track's status changed
    StatusChanged { index: usize, status: TrackStatus },

    /// Track duration became known
    DurationKnown { index: usize, duration_secs: f64 },

    /// Periodic position update while playing
    Progress {
        index: usize,
        elapsed_secs: u64,
        fraction: f64,
    },

    /// Global volume changed
    VolumeChanged { level: f32 },

    /// The selected track could not be loaded
    LoadFailed { index: usize, message: String },

    /// A track finished and playback moved on by itself
    AutoAdvanced { from: usize, to: usize },

    /// A panel was shown or hidden
    PanelToggled { panel: PanelKind, open: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = PlaybackEvent::StatusChanged {
            index: 2,
            status: TrackStatus::Playing,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"status_changed","index":2,"status":"playing"}"#);

        let back: PlaybackEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
