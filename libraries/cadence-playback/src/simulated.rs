//! Simulated audio engine
//!
//! Deterministic, in-process [`AudioEngine`] driven by a virtual clock. No
//! audio is produced: resources load after a configurable latency, advance
//! their position while playing and report lifecycle transitions the way a
//! real engine would. Used by the headless CLI and by tests.

use crate::adapter::{AudioEngine, AudioResource, LifecycleNotifier, ResourceRequest};
use crate::error::EngineError;
use crate::types::LoadState;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

/// Behaviour of one simulated asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedTrack {
    /// Length of the asset
    pub duration: Duration,

    /// Time from construction (or retry) until the asset is loaded
    pub load_time: Duration,

    /// Loading ends in failure instead of success
    pub fail_load: bool,

    /// A stop issued while loading does not cancel the pending start, like
    /// engines that only honour stop once the asset is decoded
    pub sticky_start: bool,
}

impl Default for SimulatedTrack {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(180),
            load_time: Duration::from_millis(250),
            fail_load: false,
            sticky_start: false,
        }
    }
}

#[derive(Debug)]
struct Slot {
    id: u64,
    track: usize,
    asset: SimulatedTrack,
    state: LoadState,
    load_remaining: Duration,
    play_pending: bool,
    playing: bool,
    position: Duration,
    volume: f32,
    notifier: LifecycleNotifier,
}

impl Slot {
    fn known_duration(&self) -> Duration {
        if self.state == LoadState::Loaded {
            self.asset.duration
        } else {
            Duration::ZERO
        }
    }

    fn advance(&mut self, dt: Duration) {
        match self.state {
            LoadState::Loading => {
                if dt < self.load_remaining {
                    self.load_remaining -= dt;
                    return;
                }
                let leftover = dt - self.load_remaining;
                self.load_remaining = Duration::ZERO;

                if self.asset.fail_load {
                    self.state = LoadState::Failed;
                    self.play_pending = false;
                    self.notifier.load_failed("asset could not be decoded");
                    return;
                }

                self.state = LoadState::Loaded;
                self.notifier.loaded();
                if self.play_pending {
                    self.play_pending = false;
                    self.playing = true;
                    self.notifier.ready();
                    self.advance_position(leftover);
                }
            }
            LoadState::Loaded if self.playing => self.advance_position(dt),
            _ => {}
        }
    }

    fn advance_position(&mut self, dt: Duration) {
        self.position += dt;
        if self.position >= self.asset.duration {
            self.position = Duration::ZERO;
            self.playing = false;
            self.notifier.ended();
        }
    }
}

#[derive(Debug)]
struct Inner {
    clock: Duration,
    default_track: SimulatedTrack,
    tracks: HashMap<String, SimulatedTrack>,
    refused: HashSet<String>,
    global_volume: f32,
    next_id: u64,
    slots: Vec<Rc<RefCell<Slot>>>,
}

/// Shared handle to a simulated engine
///
/// Clones refer to the same engine, so a test or host can keep one to
/// advance the clock while the controller owns another.
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    inner: Rc<RefCell<Inner>>,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::with_default_track(SimulatedTrack::default())
    }

    /// Engine whose assets all behave like `track` unless overridden
    pub fn with_default_track(track: SimulatedTrack) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                clock: Duration::ZERO,
                default_track: track,
                tracks: HashMap::new(),
                refused: HashSet::new(),
                global_volume: 1.0,
                next_id: 0,
                slots: Vec::new(),
            })),
        }
    }

    /// Override the behaviour of one source locator
    pub fn set_track(&self, source: impl Into<String>, track: SimulatedTrack) {
        self.inner.borrow_mut().tracks.insert(source.into(), track);
    }

    /// Make construction fail for a source locator
    pub fn refuse(&self, source: impl Into<String>) {
        self.inner.borrow_mut().refused.insert(source.into());
    }

    /// Undo [`refuse`](Self::refuse)
    pub fn accept(&self, source: &str) {
        self.inner.borrow_mut().refused.remove(source);
    }

    /// Advance the virtual clock, loading and playing resources
    pub fn advance(&self, dt: Duration) {
        let slots = {
            let mut inner = self.inner.borrow_mut();
            inner.clock += dt;
            inner.slots.clone()
        };
        for slot in slots {
            slot.borrow_mut().advance(dt);
        }
    }

    /// Virtual time elapsed
    pub fn clock(&self) -> Duration {
        self.inner.borrow().clock
    }

    /// Resources created so far
    pub fn constructed_count(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    /// Playlist indices whose resource is currently playing
    pub fn playing_tracks(&self) -> Vec<usize> {
        self.inner
            .borrow()
            .slots
            .iter()
            .filter_map(|slot| {
                let slot = slot.borrow();
                slot.playing.then_some(slot.track)
            })
            .collect()
    }

    pub fn playing_count(&self) -> usize {
        self.playing_tracks().len()
    }

    pub fn global_volume(&self) -> f32 {
        self.inner.borrow().global_volume
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for SimulatedEngine {
    type Resource = SimulatedResource;

    fn construct(
        &mut self,
        request: ResourceRequest,
        notifier: LifecycleNotifier,
    ) -> Result<SimulatedResource, EngineError> {
        let mut inner = self.inner.borrow_mut();

        let source = request
            .sources
            .first()
            .ok_or_else(|| EngineError::new("no source given"))?;
        if inner.refused.contains(source) {
            return Err(EngineError::new(format!("cannot open {source}")));
        }

        let asset = inner
            .tracks
            .get(source)
            .copied()
            .unwrap_or(inner.default_track);
        let id = inner.next_id;
        inner.next_id += 1;

        let slot = Rc::new(RefCell::new(Slot {
            id,
            track: request.track,
            asset,
            state: LoadState::Loading,
            load_remaining: asset.load_time,
            play_pending: false,
            playing: false,
            position: Duration::ZERO,
            volume: 1.0,
            notifier,
        }));
        inner.slots.push(slot.clone());

        Ok(SimulatedResource { slot })
    }

    fn set_global_volume(&mut self, level: f32) {
        self.inner.borrow_mut().global_volume = level;
    }
}

/// Resource handle created by [`SimulatedEngine`]
#[derive(Debug)]
pub struct SimulatedResource {
    slot: Rc<RefCell<Slot>>,
}

impl SimulatedResource {
    /// Identity of the resource, unique per engine
    pub fn id(&self) -> u64 {
        self.slot.borrow().id
    }
}

impl AudioResource for SimulatedResource {
    fn play(&mut self) {
        let mut slot = self.slot.borrow_mut();
        match slot.state {
            LoadState::Loaded => {
                if !slot.playing {
                    slot.playing = true;
                    slot.notifier.ready();
                }
            }
            LoadState::Loading | LoadState::Unloaded => slot.play_pending = true,
            LoadState::Failed => {
                // Retry the load
                slot.state = LoadState::Loading;
                slot.load_remaining = slot.asset.load_time;
                slot.play_pending = true;
            }
        }
    }

    fn pause(&mut self) {
        let mut slot = self.slot.borrow_mut();
        slot.play_pending = false;
        if slot.playing {
            slot.playing = false;
            slot.notifier.paused();
        }
    }

    fn stop(&mut self) {
        let mut slot = self.slot.borrow_mut();
        if slot.state == LoadState::Loaded || !slot.asset.sticky_start {
            slot.play_pending = false;
        }
        if slot.state == LoadState::Loaded {
            slot.playing = false;
            slot.position = Duration::ZERO;
            slot.notifier.stopped();
        }
    }

    fn seek(&mut self, position: Duration) {
        let mut slot = self.slot.borrow_mut();
        if slot.state == LoadState::Loaded {
            slot.position = position.min(slot.asset.duration);
            slot.notifier.seeked();
        }
    }

    fn position(&self) -> Option<Duration> {
        let slot = self.slot.borrow();
        (slot.state == LoadState::Loaded).then_some(slot.position)
    }

    fn duration(&self) -> Duration {
        self.slot.borrow().known_duration()
    }

    fn volume(&self) -> f32 {
        self.slot.borrow().volume
    }

    fn set_volume(&mut self, level: f32) {
        self.slot.borrow_mut().volume = level.clamp(0.0, 1.0);
    }

    fn is_playing(&self) -> bool {
        self.slot.borrow().playing
    }

    fn state(&self) -> LoadState {
        self.slot.borrow().state
    }
}
