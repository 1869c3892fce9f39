/// CLI configuration
use crate::error::{CliError, Result};
use cadence_playback::{PlayerConfig, SimulatedTrack, TrackEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default = "default_simulation")]
    pub simulation: SimulationSettings,

    #[serde(default = "default_playlist")]
    pub playlist: Vec<TrackEntry>,
}

/// Behaviour of the simulated engine the CLI plays through
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Length of every simulated track
    #[serde(default = "default_track_secs")]
    pub track_secs: u64,

    /// Time each track takes to load
    #[serde(default = "default_load_ms")]
    pub load_ms: u64,

    /// Frame interval used when waiting
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
}

impl SimulationSettings {
    pub fn track(&self) -> SimulatedTrack {
        SimulatedTrack {
            duration: Duration::from_secs(self.track_secs),
            load_time: Duration::from_millis(self.load_ms),
            ..SimulatedTrack::default()
        }
    }

    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            simulation: default_simulation(),
            playlist: default_playlist(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `cadence.toml` is used when
    /// present. Environment variables prefixed with `CADENCE_` override
    /// file values, with `__` between nested keys
    /// (e.g. `CADENCE_PLAYER__INITIAL_VOLUME=0.4`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_environment(path, None)
    }

    /// Like [`load`](Self::load), reading overrides from `vars` instead of
    /// the process environment when given
    pub fn load_with_environment(
        path: Option<&Path>,
        vars: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                // Load from config file if it exists
                let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        // Override with environment variables (prefixed with CADENCE_)
        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(vars),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playlist.is_empty() {
            return Err(CliError::Config(
                "Playlist is empty (add [[playlist]] entries)".to_string(),
            ));
        }

        if let Some(entry) = self.playlist.iter().find(|e| e.file.is_empty()) {
            return Err(CliError::Config(format!(
                "Track {:?} has no file",
                entry.title
            )));
        }

        let volume = self.player.initial_volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(CliError::Config(format!(
                "Initial volume must be between 0 and 1, got {}",
                volume
            )));
        }

        if self.simulation.frame_ms == 0 {
            return Err(CliError::Config(
                "Frame interval must be at least 1 ms".to_string(),
            ));
        }

        Ok(())
    }

    /// Default configuration as TOML
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).map_err(|e| CliError::Config(e.to_string()))
    }
}

// Default values
fn default_simulation() -> SimulationSettings {
    SimulationSettings {
        track_secs: default_track_secs(),
        load_ms: default_load_ms(),
        frame_ms: default_frame_ms(),
    }
}

fn default_track_secs() -> u64 {
    180
}

fn default_load_ms() -> u64 {
    250
}

fn default_frame_ms() -> u64 {
    16
}

fn default_playlist() -> Vec<TrackEntry> {
    ["Morning Light.mp3", "Harbour Lights.mp3", "Late Train.mp3"]
        .into_iter()
        .map(|file| TrackEntry::new(file, file))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.playlist.len(), 3);
        assert_eq!(config.simulation.frame(), Duration::from_millis(16));
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let mut config = AppConfig::default();
        config.player.initial_volume = 1.5;
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn rejects_empty_playlist() {
        let mut config = AppConfig::default();
        config.playlist.clear();
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn default_toml_parses_back() {
        let text = AppConfig::default_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.playlist, AppConfig::default().playlist);
        assert_eq!(parsed.player, PlayerConfig::default());
    }
}
