//! Playback controller - core orchestration
//!
//! Owns the current selection and drives the audio engine, the progress
//! reporter and the display synchronizer. Transport status is never cached
//! here: it is queried from the selected track's resource whenever needed.

use crate::{
    adapter::{
        AudioEngine, AudioResource, LifecycleEvent, LifecycleNotifier, LifecycleSignal,
        ResourceRequest, WaveAnimation,
    },
    display::{DisplayState, DisplaySynchronizer},
    error::{PlaybackError, Result},
    events::{PanelKind, PlaybackEvent},
    progress::ProgressReporter,
    registry::Playlist,
    types::{Direction, LoadState, PlayerConfig, TrackStatus},
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Map a requested volume into [0, 1]; NaN becomes silence
fn sanitize_volume(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

/// Status of a constructed resource
fn resource_status<R: AudioResource + ?Sized>(resource: &R) -> TrackStatus {
    match resource.state() {
        LoadState::Failed => TrackStatus::Failed,
        _ if resource.is_playing() => TrackStatus::Playing,
        LoadState::Unloaded | LoadState::Loading => TrackStatus::Loading,
        LoadState::Loaded => TrackStatus::Idle,
    }
}

/// Playlist transport controller
///
/// Orchestrates:
/// - Track selection (play, skip with wraparound, skip to index, random skip)
/// - Lazy resource construction, reused for the whole session
/// - Lifecycle signals from the engine, filtered against the selection
/// - Progress polling and display projection
/// - Global volume
pub struct PlaybackController<E: AudioEngine> {
    playlist: Playlist<E::Resource>,
    engine: E,
    config: PlayerConfig,

    // Selection
    current: usize,

    // Settings
    volume: f32,

    // Display
    progress: ProgressReporter,
    display: DisplaySynchronizer,

    // Random advance
    rng: StdRng,

    // Engine callbacks
    lifecycle_tx: Sender<LifecycleSignal>,
    lifecycle_rx: Receiver<LifecycleSignal>,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl<E: AudioEngine> PlaybackController<E> {
    /// Create a controller over `playlist`, selecting its first track
    pub fn new(playlist: Playlist<E::Resource>, mut engine: E, config: PlayerConfig) -> Self {
        let volume = sanitize_volume(config.initial_volume);
        engine.set_global_volume(volume);

        let title = playlist.iter().next().map(|t| t.title()).unwrap_or_default();
        let mut display = DisplaySynchronizer::new(&config, title);
        display.set_volume(volume);

        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (lifecycle_tx, lifecycle_rx) = unbounded();

        Self {
            playlist,
            engine,
            config,
            current: 0,
            volume,
            progress: ProgressReporter::new(),
            display,
            rng,
            lifecycle_tx,
            lifecycle_rx,
            pending_events: Vec::new(),
        }
    }

    /// Attach the waveform animation; it is started immediately
    pub fn with_animation(mut self, animation: Box<dyn WaveAnimation>) -> Self {
        self.attach_animation(animation);
        self
    }

    pub fn attach_animation(&mut self, animation: Box<dyn WaveAnimation>) {
        self.display.attach_animation(animation);
    }

    // ===== Transport =====

    /// Play `index`, or the current track when `None`
    ///
    /// Selecting a track other than the current one stops the current one
    /// first, exactly like [`skip_to`](Self::skip_to).
    pub fn play(&mut self, index: Option<usize>) -> Result<()> {
        let index = index.unwrap_or(self.current);
        self.playlist.check_index(index)?;

        if index != self.current {
            return self.skip_to(index);
        }
        self.start_track(index)
    }

    /// Pause the current track
    pub fn pause(&mut self) -> Result<()> {
        let index = self.current;
        let resource = self
            .playlist
            .resource_mut(index)
            .ok_or(PlaybackError::NoActiveTrack)?;

        resource.pause();
        self.display.show_paused();
        debug!(track = index, "paused");
        self.emit_status(index);
        Ok(())
    }

    /// Move to the neighbouring track, wrapping at either end
    pub fn skip(&mut self, direction: Direction) -> Result<()> {
        let index = direction.neighbor(self.current, self.playlist.len());
        self.skip_to(index)
    }

    /// Stop the current track and play `index`
    pub fn skip_to(&mut self, index: usize) -> Result<()> {
        self.playlist.check_index(index)?;

        if let Some(resource) = self.playlist.resource_mut(self.current) {
            resource.stop();
        }
        self.progress.cancel();
        self.display.reset_progress();

        self.start_track(index)
    }

    /// Skip to a uniformly random track; returns the chosen index
    pub fn skip_random(&mut self) -> Result<usize> {
        let index = self.rng.gen_range(0..self.playlist.len());
        self.skip_to(index)?;
        Ok(index)
    }

    /// Set the global volume (0.0-1.0) for every resource
    pub fn set_volume(&mut self, level: f32) {
        let level = sanitize_volume(level);
        self.volume = level;
        self.engine.set_global_volume(level);
        self.display.set_volume(level);
        self.emit(PlaybackEvent::VolumeChanged { level });
    }

    /// Set the volume from a pointer position on the volume bar
    ///
    /// Returns the level applied.
    pub fn set_volume_from_slider(&mut self, x_px: f64) -> f32 {
        let level = self.display.volume_at(x_px);
        self.set_volume(level);
        level
    }

    /// Seek the current track to `fraction` of its duration
    ///
    /// Has no effect unless the current track is playing.
    pub fn seek(&mut self, fraction: f64) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };

        let Some(resource) = self.playlist.resource_mut(self.current) else {
            return;
        };
        if resource.is_playing() {
            let target = resource.duration().mul_f64(fraction);
            debug!(track = self.current, ?target, "seeking");
            resource.seek(target);
        }
    }

    // ===== Panels & layout =====

    /// Show or hide the playlist panel; returns whether it is now open
    pub fn toggle_playlist_panel(&mut self, now: Duration) -> bool {
        let open = self.display.toggle_playlist_panel(now);
        self.emit(PlaybackEvent::PanelToggled {
            panel: PanelKind::Playlist,
            open,
        });
        open
    }

    /// Show or hide the volume panel; returns whether it is now open
    pub fn toggle_volume_panel(&mut self, now: Duration) -> bool {
        let open = self.display.toggle_volume_panel(now);
        self.emit(PlaybackEvent::PanelToggled {
            panel: PanelKind::Volume,
            open,
        });
        open
    }

    /// Viewport resized
    pub fn resize(&mut self, width: f64, height: f64) {
        self.display.resize(width, height);
    }

    // ===== Frame loop =====

    /// One redraw opportunity
    ///
    /// Dispatches pending lifecycle signals, takes one progress step and
    /// applies panel hides that are due. `now` is a monotonic timestamp.
    pub fn frame(&mut self, now: Duration) {
        self.process_lifecycle();
        self.step_progress();
        self.display.settle(now);
    }

    /// Dispatch lifecycle signals received so far
    ///
    /// Signals raised while dispatching wait for the next call.
    pub fn process_lifecycle(&mut self) {
        let signals: Vec<LifecycleSignal> = self.lifecycle_rx.try_iter().collect();
        for signal in signals {
            self.handle_lifecycle(signal);
        }
    }

    fn handle_lifecycle(&mut self, signal: LifecycleSignal) {
        let LifecycleSignal { track, event } = signal;

        if track != self.current {
            // A track we moved away from must not start playing behind the
            // selected one.
            if event == LifecycleEvent::Ready {
                if let Some(resource) = self.playlist.resource_mut(track) {
                    if resource.is_playing() {
                        resource.stop();
                    }
                }
            }
            debug!(track, current = self.current, ?event, "dropping stale lifecycle signal");
            return;
        }

        match event {
            LifecycleEvent::Ready => {
                let duration_secs = self
                    .playlist
                    .resource(track)
                    .map(|r| r.duration().as_secs_f64().round())
                    .unwrap_or(0.0);
                self.display.set_duration(duration_secs);
                self.emit(PlaybackEvent::DurationKnown {
                    index: track,
                    duration_secs,
                });
                // The user may have paused before this was dispatched
                if self.is_playing(track) {
                    self.progress.start(track);
                    self.display.show_playing();
                    self.emit_status(track);
                }
            }
            LifecycleEvent::Loaded => {
                let playing = self.is_playing(track);
                self.display.show_loaded(playing);
            }
            LifecycleEvent::Ended => {
                self.display.show_halted();
                self.emit_status(track);
                self.auto_advance(track);
            }
            LifecycleEvent::Paused | LifecycleEvent::Stopped => {
                if !self.is_playing(track) {
                    self.display.show_halted();
                    self.display.show_paused();
                }
            }
            LifecycleEvent::Seeked => {
                self.progress.start(track);
            }
            LifecycleEvent::LoadFailed(message) => {
                warn!(track, %message, "track failed to load");
                self.progress.cancel();
                self.display.show_load_failed();
                self.emit(PlaybackEvent::LoadFailed {
                    index: track,
                    message,
                });
            }
        }
    }

    fn step_progress(&mut self) {
        let Some(track) = self.progress.bound_track() else {
            return;
        };
        let Some(resource) = self.playlist.resource(track) else {
            self.progress.cancel();
            return;
        };

        if let Some(sample) = self.progress.step(self.current, resource) {
            self.display.apply_progress(&sample);
            self.emit(PlaybackEvent::Progress {
                index: sample.track,
                elapsed_secs: sample.elapsed_secs,
                fraction: sample.fraction,
            });
        }
    }

    fn is_playing(&self, track: usize) -> bool {
        self.playlist
            .resource(track)
            .is_some_and(|r| r.is_playing())
    }

    fn auto_advance(&mut self, from: usize) {
        match self.skip_random() {
            Ok(to) => {
                info!(from, to, "track ended, advancing");
                self.emit(PlaybackEvent::AutoAdvanced { from, to });
            }
            Err(err) => warn!(from, error = %err, "could not advance after track ended"),
        }
    }

    // ===== Internal: selection =====

    fn start_track(&mut self, index: usize) -> Result<()> {
        let previous = self.current;
        self.current = index;

        let title = self.playlist.get(index)?.title().to_string();
        self.display.set_title(&title);
        self.emit(PlaybackEvent::TrackChanged {
            index,
            previous,
            title,
        });

        if self.playlist.resource(index).is_none() {
            self.construct(index)?;
        }

        let resource = self
            .playlist
            .resource_mut(index)
            .ok_or(PlaybackError::NoActiveTrack)?;
        if !resource.is_playing() {
            resource.play();
        }

        if resource.state() == LoadState::Loaded {
            // Already loaded: no load callback will announce this play
            let duration_secs = resource.duration().as_secs_f64().round();
            self.display.set_duration(duration_secs);
            self.display.show_playing();
            self.progress.start(index);
        } else {
            self.display.show_loading();
        }

        info!(track = index, "playing");
        self.emit_status(index);
        Ok(())
    }

    fn construct(&mut self, index: usize) -> Result<()> {
        let request = ResourceRequest {
            track: index,
            sources: vec![self.playlist.get(index)?.source().to_string()],
            streaming: self.config.streaming,
        };
        let notifier = LifecycleNotifier::new(index, self.lifecycle_tx.clone());

        match self.engine.construct(request, notifier) {
            Ok(resource) => {
                self.playlist.get_mut(index)?.install(resource)?;
                debug!(track = index, "constructed audio resource");
                Ok(())
            }
            Err(err) => {
                warn!(track = index, error = %err, "failed to construct audio resource");
                self.display.show_load_failed();
                self.emit(PlaybackEvent::LoadFailed {
                    index,
                    message: err.to_string(),
                });
                Err(PlaybackError::ResourceConstruction {
                    index,
                    reason: err.0,
                })
            }
        }
    }

    // ===== State Queries =====

    /// Selected track
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn track_count(&self) -> usize {
        self.playlist.len()
    }

    /// Titles for populating the playlist panel
    pub fn titles(&self) -> Vec<&str> {
        self.playlist.titles()
    }

    /// Status of a track, queried from its resource
    pub fn track_status(&self, index: usize) -> Result<TrackStatus> {
        let track = self.playlist.get(index)?;
        Ok(track
            .resource()
            .map_or(TrackStatus::Unconstructed, |r| resource_status(r)))
    }

    /// Global volume (0.0-1.0)
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Current display projection
    pub fn display(&self) -> &DisplayState {
        self.display.state()
    }

    /// Whether a progress polling chain is running
    pub fn is_reporting_progress(&self) -> bool {
        self.progress.is_active()
    }

    pub fn playlist(&self) -> &Playlist<E::Resource> {
        &self.playlist
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// The UI should call this every frame to stay in sync.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }

    fn emit_status(&mut self, index: usize) {
        if let Ok(status) = self.track_status(index) {
            self.emit(PlaybackEvent::StatusChanged { index, status });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TrackEntry;
    use crate::simulated::SimulatedEngine;

    fn controller(tracks: usize) -> (PlaybackController<SimulatedEngine>, SimulatedEngine) {
        let entries = (0..tracks).map(|i| TrackEntry::new(format!("Song {i}.mp3"), format!("song{i}.mp3")));
        let playlist = Playlist::from_entries(entries, "./audio/").unwrap();
        let engine = SimulatedEngine::new();
        let config = PlayerConfig {
            shuffle_seed: Some(7),
            ..PlayerConfig::default()
        };
        (
            PlaybackController::new(playlist, engine.clone(), config),
            engine,
        )
    }

    #[test]
    fn starts_on_first_track_unconstructed() {
        let (player, _) = controller(3);
        assert_eq!(player.current_index(), 0);
        assert_eq!(player.track_count(), 3);
        assert_eq!(player.display().title, "Song 0");
        assert_eq!(player.track_status(0).unwrap(), TrackStatus::Unconstructed);
    }

    #[test]
    fn sanitizes_volume() {
        assert_eq!(sanitize_volume(1.5), 1.0);
        assert_eq!(sanitize_volume(-0.5), 0.0);
        assert_eq!(sanitize_volume(f32::NAN), 0.0);
        assert_eq!(sanitize_volume(0.3), 0.3);
    }

    #[test]
    fn play_without_index_constructs_current_track() {
        let (mut player, engine) = controller(3);

        player.play(None).unwrap();

        assert_eq!(engine.constructed_count(), 1);
        assert_eq!(player.track_status(0).unwrap(), TrackStatus::Loading);
        assert!(player.display().loading);
    }

    #[test]
    fn pause_before_any_play_fails() {
        let (mut player, _) = controller(2);
        assert!(matches!(player.pause(), Err(PlaybackError::NoActiveTrack)));
    }

    #[test]
    fn invalid_index_fails_fast() {
        let (mut player, _) = controller(2);
        assert!(matches!(
            player.skip_to(2),
            Err(PlaybackError::InvalidIndex { index: 2, len: 2 })
        ));
        assert!(matches!(
            player.play(Some(9)),
            Err(PlaybackError::InvalidIndex { .. })
        ));
        assert_eq!(player.current_index(), 0);
    }

    #[test]
    fn seek_is_noop_when_not_playing() {
        let (mut player, engine) = controller(2);
        player.seek(0.5);
        assert_eq!(engine.constructed_count(), 0);
    }

    #[test]
    fn volume_is_applied_globally() {
        let (mut player, engine) = controller(2);

        player.set_volume(0.5);

        assert_eq!(player.volume(), 0.5);
        assert_eq!(engine.global_volume(), 0.5);
        assert!(player
            .drain_events()
            .contains(&PlaybackEvent::VolumeChanged { level: 0.5 }));
    }

    #[test]
    fn slider_position_sets_volume() {
        let (mut player, engine) = controller(2);

        // Default 1280 px viewport: the bar starts at 64 px and is 1152 px wide
        let level = player.set_volume_from_slider(64.0 + 1152.0 * 0.25);

        assert!((level - 0.25).abs() < 1e-6);
        assert_eq!(player.volume(), level);
        assert_eq!(engine.global_volume(), level);

        assert_eq!(player.set_volume_from_slider(-40.0), 0.0);
        assert_eq!(player.set_volume_from_slider(1500.0), 1.0);
    }
}
