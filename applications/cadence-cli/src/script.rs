//! Command scripts
//!
//! A script is a flat list of words, e.g. `play next wait 2 volume 0.5`.
//! Commands that take arguments consume the words that follow them.

use crate::error::{CliError, Result};
use std::str::FromStr;

/// One scripted player action
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Play the given track, or the current one
    Play(Option<usize>),
    Pause,
    Next,
    Prev,
    /// Skip to a playlist index
    To(usize),
    Random,
    /// Seek to a fraction of the track
    Seek(f64),
    Volume(f32),
    /// Click or drag on the volume bar at an x coordinate in pixels
    Slide(f64),
    TogglePlaylist,
    ToggleVolume,
    Resize { width: f64, height: f64 },
    /// Let the given number of seconds pass
    Wait(f64),
}

/// Parse a script from its words
pub fn parse_script<S: AsRef<str>>(words: &[S]) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    let mut words = words.iter().map(|w| AsRef::<str>::as_ref(w)).peekable();
    let mut position = 0;

    while let Some(word) = words.next() {
        position += 1;
        let command = match word {
            "play" => {
                let has_index = words
                    .peek()
                    .is_some_and(|next| next.parse::<usize>().is_ok());
                let index = if has_index {
                    Some(argument(&mut words, position, "play")?)
                } else {
                    None
                };
                Command::Play(index)
            }
            "pause" => Command::Pause,
            "next" => Command::Next,
            "prev" => Command::Prev,
            "to" => Command::To(argument(&mut words, position, "to")?),
            "random" => Command::Random,
            "seek" => Command::Seek(argument(&mut words, position, "seek")?),
            "volume" => Command::Volume(argument(&mut words, position, "volume")?),
            "slide" => Command::Slide(argument(&mut words, position, "slide")?),
            "playlist" => Command::TogglePlaylist,
            "volume-panel" => Command::ToggleVolume,
            "resize" => Command::Resize {
                width: argument(&mut words, position, "resize")?,
                height: argument(&mut words, position, "resize")?,
            },
            "wait" => {
                let secs: f64 = argument(&mut words, position, "wait")?;
                if !secs.is_finite() || secs < 0.0 {
                    return Err(CliError::Script {
                        position,
                        message: format!("cannot wait {} seconds", secs),
                    });
                }
                Command::Wait(secs)
            }
            other => {
                return Err(CliError::Script {
                    position,
                    message: format!("unknown command {:?}", other),
                })
            }
        };
        commands.push(command);
    }

    Ok(commands)
}

fn argument<'a, T, I>(words: &mut I, position: usize, command: &str) -> Result<T>
where
    T: FromStr,
    I: Iterator<Item = &'a str>,
{
    let word = words.next().ok_or_else(|| CliError::Script {
        position,
        message: format!("{} is missing an argument", command),
    })?;
    word.parse().map_err(|_| CliError::Script {
        position,
        message: format!("{} cannot take {:?}", command, word),
    })
}
