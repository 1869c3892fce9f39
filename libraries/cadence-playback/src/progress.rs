//! Progress reporter
//!
//! A cooperative polling chain: every redraw opportunity the host calls
//! [`ProgressReporter::step`], which samples the current resource and keeps
//! the chain alive only while the resource is still playing. The chain is a
//! single slot, so starting a new one replaces whatever was running.

use crate::adapter::AudioResource;
use std::time::Duration;

/// Fraction of `duration` covered by `position`, in [0, 1]
///
/// Zero when the duration is unknown (zero), so the display never sees NaN.
pub fn progress_fraction(position: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }
    let fraction = position.as_secs_f64() / duration.as_secs_f64();
    if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// One published reading of the playback position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    /// Track the sample was taken from
    pub track: usize,

    /// Raw position
    pub position: Duration,

    /// Elapsed whole seconds (rounded), as shown in the timer
    pub elapsed_secs: u64,

    /// Position over duration, in [0, 1]
    pub fraction: f64,
}

/// Cancellable self-rescheduling position poller
#[derive(Debug, Default)]
pub struct ProgressReporter {
    /// Track the running chain is bound to
    chain: Option<usize>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start polling `track`, replacing any running chain
    pub fn start(&mut self, track: usize) {
        self.chain = Some(track);
    }

    pub fn cancel(&mut self) {
        self.chain = None;
    }

    pub fn is_active(&self) -> bool {
        self.chain.is_some()
    }

    /// Track the running chain polls, if any
    pub fn bound_track(&self) -> Option<usize> {
        self.chain
    }

    /// Take one step of the chain
    ///
    /// `current` is the selected track. A chain bound to another track is
    /// stale and is dropped without publishing. Otherwise the sample is
    /// published, and the chain ends if the resource is no longer playing.
    pub fn step<R: AudioResource + ?Sized>(
        &mut self,
        current: usize,
        resource: &R,
    ) -> Option<ProgressSample> {
        let track = self.chain?;
        if track != current {
            self.chain = None;
            return None;
        }

        let position = resource.position().unwrap_or(Duration::ZERO);
        let playing = resource.is_playing();
        if !playing {
            self.chain = None;
        }

        Some(ProgressSample {
            track,
            position,
            elapsed_secs: position.as_secs_f64().round() as u64,
            fraction: progress_fraction(position, resource.duration()),
        })
    }
}
