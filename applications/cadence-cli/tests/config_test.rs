//! Configuration loading tests
//!
//! Each test writes its own configuration file into a temporary directory.

use cadence_cli::{parse_script, AppConfig, CliError, Session};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("cadence.toml");
    fs::write(&path, contents).unwrap();
    path
}

const CONFIG: &str = r#"
[player]
initial_volume = 0.8
audio_root = "/srv/music"
shuffle_seed = 11

[player.viewport]
width = 1024.0

[simulation]
track_secs = 30

[[playlist]]
title = "First Light.mp3"
file = "first-light.mp3"

[[playlist]]
title = "Second Wind.mp3"
file = "second-wind.mp3"
"#;

#[test]
fn loads_file_and_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, CONFIG);

    let config = AppConfig::load_with_environment(Some(&path), Some(HashMap::new())).unwrap();

    assert_eq!(config.player.initial_volume, 0.8);
    assert_eq!(config.player.audio_root, "/srv/music");
    assert_eq!(config.player.shuffle_seed, Some(11));
    assert_eq!(config.player.viewport.width, 1024.0);
    assert_eq!(config.player.viewport.height, 720.0);
    assert_eq!(config.player.panel_fade_ms, 500);
    assert_eq!(config.simulation.track_secs, 30);
    assert_eq!(config.simulation.load_ms, 250);
    assert_eq!(config.playlist.len(), 2);
}

#[test]
fn environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, CONFIG);
    let vars = HashMap::from([
        ("CADENCE_PLAYER__INITIAL_VOLUME".to_string(), "0.25".to_string()),
        ("CADENCE_SIMULATION__FRAME_MS".to_string(), "40".to_string()),
    ]);

    let config = AppConfig::load_with_environment(Some(&path), Some(vars)).unwrap();

    assert_eq!(config.player.initial_volume, 0.25);
    assert_eq!(config.simulation.frame_ms, 40);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = AppConfig::load_with_environment(Some(&path), Some(HashMap::new())).unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
}

#[test]
fn invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[player]
initial_volume = 3.0
"#,
    );

    let err = AppConfig::load_with_environment(Some(&path), Some(HashMap::new())).unwrap_err();
    assert!(err.to_string().contains("Initial volume"));
}

#[test]
fn init_config_output_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &AppConfig::default_toml().unwrap());

    let config = AppConfig::load_with_environment(Some(&path), Some(HashMap::new())).unwrap();

    assert_eq!(config.playlist, AppConfig::default().playlist);
}

#[test]
fn loaded_config_drives_a_session() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, CONFIG);
    let config = AppConfig::load_with_environment(Some(&path), Some(HashMap::new())).unwrap();

    let mut session = Session::new(&config).unwrap();
    assert_eq!(session.player().titles(), vec!["First Light", "Second Wind"]);

    // Both 30 s tracks play through and the player keeps going by itself
    let script = parse_script(&["play", "wait", "65"]).unwrap();
    let mut advanced = 0;
    session
        .run(&script, |event| {
            if matches!(event, cadence_playback::PlaybackEvent::AutoAdvanced { .. }) {
                advanced += 1;
            }
            Ok(())
        })
        .unwrap();

    assert!(advanced >= 2);
    assert_eq!(session.engine().playing_count(), 1);
    assert_eq!(session.engine().global_volume(), 0.8);
}
