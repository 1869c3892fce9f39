//! Audio engine adapter contract
//!
//! The controller never decodes or outputs audio itself. Platform code
//! (a browser audio library, a native output stream, the simulated engine)
//! implements these traits, and reports asynchronous lifecycle transitions
//! through the [`LifecycleNotifier`] handed over at construction time.

use crate::error::EngineError;
use crate::types::LoadState;
use crossbeam_channel::Sender;
use std::time::Duration;

/// Transport primitives of one loaded audio asset
pub trait AudioResource {
    /// Start or resume playback; loading resources start once ready
    fn play(&mut self);

    /// Pause, keeping the position
    fn pause(&mut self);

    /// Stop and rewind; a pending start while loading is cancelled
    fn stop(&mut self);

    /// Jump to an absolute position
    fn seek(&mut self, position: Duration);

    /// Current position, `None` while the engine cannot tell
    fn position(&self) -> Option<Duration>;

    /// Total duration, zero until metadata is known
    fn duration(&self) -> Duration;

    /// Per-resource volume (0.0-1.0)
    fn volume(&self) -> f32;

    fn set_volume(&mut self, level: f32);

    /// Whether the resource is audibly playing right now
    fn is_playing(&self) -> bool;

    fn state(&self) -> LoadState;
}

/// What the controller asks the engine to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    /// Playlist index the resource belongs to
    pub track: usize,

    /// Candidate locators, tried in order
    pub sources: Vec<String>,

    /// Stream the asset instead of decoding it fully before playback
    pub streaming: bool,
}

/// Factory for resources plus process-wide settings
pub trait AudioEngine {
    type Resource: AudioResource;

    /// Create a resource and begin loading it asynchronously
    ///
    /// The engine keeps `notifier` and reports the resource's lifecycle
    /// through it.
    fn construct(
        &mut self,
        request: ResourceRequest,
        notifier: LifecycleNotifier,
    ) -> Result<Self::Resource, EngineError>;

    /// Volume applied to every resource
    fn set_global_volume(&mut self, level: f32);
}

/// Visual animation shown while a track plays
pub trait WaveAnimation {
    fn start(&mut self);

    /// Re-layout after the viewport changed size
    fn resize(&mut self, width: f64, height: f64);
}

/// Lifecycle transition reported by an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The resource started producing audio
    Ready,

    /// Asset finished loading
    Loaded,

    /// Playback reached the natural end of the track
    Ended,

    Paused,

    Stopped,

    /// A seek completed
    Seeked,

    /// The asset could not be loaded
    LoadFailed(String),
}

/// A lifecycle event tagged with the track it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleSignal {
    pub track: usize,
    pub event: LifecycleEvent,
}

/// Callback handle given to the engine for one resource
///
/// Sending never blocks. Signals sent after the controller is gone are
/// dropped.
#[derive(Debug, Clone)]
pub struct LifecycleNotifier {
    track: usize,
    tx: Sender<LifecycleSignal>,
}

impl LifecycleNotifier {
    pub fn new(track: usize, tx: Sender<LifecycleSignal>) -> Self {
        Self { track, tx }
    }

    /// Track this notifier reports for
    pub fn track(&self) -> usize {
        self.track
    }

    pub fn notify(&self, event: LifecycleEvent) {
        let _ = self.tx.send(LifecycleSignal {
            track: self.track,
            event,
        });
    }

    pub fn ready(&self) {
        self.notify(LifecycleEvent::Ready);
    }

    pub fn loaded(&self) {
        self.notify(LifecycleEvent::Loaded);
    }

    pub fn ended(&self) {
        self.notify(LifecycleEvent::Ended);
    }

    pub fn paused(&self) {
        self.notify(LifecycleEvent::Paused);
    }

    pub fn stopped(&self) {
        self.notify(LifecycleEvent::Stopped);
    }

    pub fn seeked(&self) {
        self.notify(LifecycleEvent::Seeked);
    }

    pub fn load_failed(&self, reason: impl Into<String>) {
        self.notify(LifecycleEvent::LoadFailed(reason.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn notifier_tags_signals_with_track() {
        let (tx, rx) = unbounded();
        let notifier = LifecycleNotifier::new(3, tx);

        notifier.loaded();
        notifier.ready();
        notifier.load_failed("404");

        let signals: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            signals,
            vec![
                LifecycleSignal {
                    track: 3,
                    event: LifecycleEvent::Loaded
                },
                LifecycleSignal {
                    track: 3,
                    event: LifecycleEvent::Ready
                },
                LifecycleSignal {
                    track: 3,
                    event: LifecycleEvent::LoadFailed("404".to_string())
                },
            ]
        );
    }

    #[test]
    fn notifier_signals_from_an_engine_thread() {
        let (tx, rx) = unbounded();
        let notifier = LifecycleNotifier::new(1, tx);

        std::thread::spawn(move || notifier.ended()).join().unwrap();

        assert_eq!(
            rx.try_recv(),
            Ok(LifecycleSignal {
                track: 1,
                event: LifecycleEvent::Ended
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn notify_after_receiver_dropped_is_silent() {
        let (tx, rx) = unbounded();
        let notifier = LifecycleNotifier::new(0, tx);
        drop(rx);

        notifier.ended();
    }
}
