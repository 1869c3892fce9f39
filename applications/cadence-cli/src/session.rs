//! Headless playback session
//!
//! Runs a controller over the simulated engine on a virtual clock. Every
//! command is followed by at least one frame so engine callbacks are
//! dispatched before the next command.

use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::script::Command;
use cadence_playback::{
    Direction, PlaybackController, PlaybackEvent, Playlist, SimulatedEngine,
};
use std::time::Duration;
use tracing::{debug, warn};

pub struct Session {
    player: PlaybackController<SimulatedEngine>,
    engine: SimulatedEngine,
    frame: Duration,
}

impl Session {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let playlist = Playlist::from_entries(config.playlist.clone(), &config.player.audio_root)?;
        let engine = SimulatedEngine::with_default_track(config.simulation.track());
        let player = PlaybackController::new(playlist, engine.clone(), config.player.clone());

        Ok(Self {
            player,
            engine,
            frame: config.simulation.frame(),
        })
    }

    pub fn player(&self) -> &PlaybackController<SimulatedEngine> {
        &self.player
    }

    pub fn engine(&self) -> &SimulatedEngine {
        &self.engine
    }

    /// Virtual time elapsed since the session started
    pub fn elapsed(&self) -> Duration {
        self.engine.clock()
    }

    /// Execute one command and let time pass
    ///
    /// `wait` advances by the requested time, everything else by one frame.
    pub fn execute(&mut self, command: &Command) -> Result<()> {
        let now = self.engine.clock();
        debug!(?command, "executing");

        let result = match *command {
            Command::Play(index) => self.player.play(index),
            Command::Pause => self.player.pause(),
            Command::Next => self.player.skip(Direction::Next),
            Command::Prev => self.player.skip(Direction::Prev),
            Command::To(index) => self.player.skip_to(index),
            Command::Random => self.player.skip_random().map(|_| ()),
            Command::Seek(fraction) => {
                self.player.seek(fraction);
                Ok(())
            }
            Command::Volume(level) => {
                self.player.set_volume(level);
                Ok(())
            }
            Command::Slide(x_px) => {
                self.player.set_volume_from_slider(x_px);
                Ok(())
            }
            Command::TogglePlaylist => {
                self.player.toggle_playlist_panel(now);
                Ok(())
            }
            Command::ToggleVolume => {
                self.player.toggle_volume_panel(now);
                Ok(())
            }
            Command::Resize { width, height } => {
                self.player.resize(width, height);
                Ok(())
            }
            Command::Wait(_) => Ok(()),
        };

        match *command {
            Command::Wait(secs) => self.wait(Duration::try_from_secs_f64(secs).unwrap_or_default()),
            _ => self.step(),
        }

        result.map_err(CliError::from)
    }

    /// Run a whole script, handing every event to `on_event`
    ///
    /// Playback errors are logged and the script carries on, the way a user
    /// clicking a control that cannot act would simply see nothing happen.
    pub fn run<F>(&mut self, script: &[Command], mut on_event: F) -> Result<()>
    where
        F: FnMut(&PlaybackEvent) -> Result<()>,
    {
        for command in script {
            match self.execute(command) {
                Ok(()) => {}
                Err(CliError::Playback(err)) => warn!(?command, error = %err, "command had no effect"),
                Err(err) => return Err(err),
            }

            for event in self.player.drain_events() {
                on_event(&event)?;
            }
        }
        Ok(())
    }

    fn wait(&mut self, total: Duration) {
        let mut remaining = total;
        while !remaining.is_zero() {
            let dt = remaining.min(self.frame);
            remaining -= dt;
            self.engine.advance(dt);
            self.player.frame(self.engine.clock());
        }
    }

    fn step(&mut self) {
        self.engine.advance(self.frame);
        self.player.frame(self.engine.clock());
    }
}
