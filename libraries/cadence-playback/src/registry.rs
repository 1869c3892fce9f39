//! Track registry
//!
//! Fixed-length, index-addressable playlist. Each descriptor lazily owns the
//! audio resource created for it on first play; once installed the resource
//! is reused for the rest of the session.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of trailing characters stripped from a configured title
const TITLE_SUFFIX_CHARS: usize = 4;

/// One static playlist entry, as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEntry {
    /// Raw title, usually the file name including its extension
    pub title: String,

    /// Audio file, relative to the configured audio root
    pub file: String,
}

impl TrackEntry {
    pub fn new(title: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            file: file.into(),
        }
    }
}

/// Display title for a raw configured title
///
/// Drops the last four characters (the ".mp3"-style extension). Counting is
/// done in characters so multi-byte titles are never split mid-sequence.
/// Titles that are not longer than the suffix are returned unchanged.
pub fn display_title(raw: &str) -> String {
    let chars = raw.chars().count();
    if chars <= TITLE_SUFFIX_CHARS {
        warn!(title = raw, "title too short to carry an extension, keeping it whole");
        return raw.to_string();
    }
    raw.chars().take(chars - TITLE_SUFFIX_CHARS).collect()
}

fn source_locator(audio_root: &str, file: &str) -> String {
    if audio_root.is_empty() || audio_root.ends_with('/') {
        format!("{audio_root}{file}")
    } else {
        format!("{audio_root}/{file}")
    }
}

/// A playlist track and its lazily created resource handle
#[derive(Debug)]
pub struct TrackDescriptor<R> {
    title: String,
    source: String,
    resource: Option<R>,
}

impl<R> TrackDescriptor<R> {
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            resource: None,
        }
    }

    /// Title shown in the player and the playlist panel
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Path/URI handed to the audio engine
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn resource(&self) -> Option<&R> {
        self.resource.as_ref()
    }

    pub fn resource_mut(&mut self) -> Option<&mut R> {
        self.resource.as_mut()
    }

    pub fn is_constructed(&self) -> bool {
        self.resource.is_some()
    }

    /// Install the resource for this track
    ///
    /// A track owns at most one resource for its whole lifetime, so a second
    /// install is refused.
    pub fn install(&mut self, resource: R) -> Result<&mut R> {
        if self.resource.is_some() {
            return Err(PlaybackError::InvalidOperation(format!(
                "resource for '{}' already constructed",
                self.title
            )));
        }
        Ok(self.resource.insert(resource))
    }
}

/// Ordered, fixed-length sequence of tracks
#[derive(Debug)]
pub struct Playlist<R> {
    tracks: Vec<TrackDescriptor<R>>,
}

impl<R> Playlist<R> {
    /// Build a playlist from configured entries
    ///
    /// Each entry's file is joined to `audio_root` to form its source locator.
    pub fn from_entries<I>(entries: I, audio_root: &str) -> Result<Self>
    where
        I: IntoIterator<Item = TrackEntry>,
    {
        let tracks = entries
            .into_iter()
            .map(|entry| {
                TrackDescriptor::new(
                    display_title(&entry.title),
                    source_locator(audio_root, &entry.file),
                )
            })
            .collect();
        Self::new(tracks)
    }

    pub fn new(tracks: Vec<TrackDescriptor<R>>) -> Result<Self> {
        if tracks.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }
        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Always false; construction rejects empty playlists
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Fail with `InvalidIndex` unless `index` addresses a track
    pub fn check_index(&self, index: usize) -> Result<()> {
        if index < self.tracks.len() {
            Ok(())
        } else {
            Err(PlaybackError::InvalidIndex {
                index,
                len: self.tracks.len(),
            })
        }
    }

    pub fn get(&self, index: usize) -> Result<&TrackDescriptor<R>> {
        self.check_index(index)?;
        Ok(&self.tracks[index])
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut TrackDescriptor<R>> {
        self.check_index(index)?;
        Ok(&mut self.tracks[index])
    }

    /// Resource of `index`, if the index is valid and the resource exists
    pub fn resource(&self, index: usize) -> Option<&R> {
        self.tracks.get(index).and_then(|t| t.resource())
    }

    pub fn resource_mut(&mut self, index: usize) -> Option<&mut R> {
        self.tracks.get_mut(index).and_then(|t| t.resource_mut())
    }

    pub fn titles(&self) -> Vec<&str> {
        self.tracks.iter().map(|t| t.title()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackDescriptor<R>> {
        self.tracks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<TrackEntry> {
        vec![
            TrackEntry::new("KnowMads - Better World.mp3", "KnowMads - Better World.mp3"),
            TrackEntry::new("Bass Bros.mp3", "Bass Bros.mp3"),
        ]
    }

    #[test]
    fn strips_extension_from_title() {
        assert_eq!(display_title("Bass Bros.mp3"), "Bass Bros");
        assert_eq!(display_title("Prise De Sens.ogg"), "Prise De Sens");
    }

    #[test]
    fn strips_characters_not_bytes() {
        assert_eq!(display_title("rhêtorík.mp3"), "rhêtorík");
        assert_eq!(display_title("日本語の歌.mp3"), "日本語の歌");
    }

    #[test]
    fn short_title_is_kept_whole() {
        assert_eq!(display_title(".mp3"), ".mp3");
        assert_eq!(display_title("abc"), "abc");
        assert_eq!(display_title(""), "");
        assert_eq!(display_title("a.mp3"), "a");
    }

    #[test]
    fn builds_playlist_from_entries() {
        let playlist: Playlist<()> = Playlist::from_entries(entries(), "./audio/").unwrap();
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.titles(), vec!["KnowMads - Better World", "Bass Bros"]);
        assert_eq!(playlist.get(1).unwrap().source(), "./audio/Bass Bros.mp3");
        assert!(!playlist.get(0).unwrap().is_constructed());
    }

    #[test]
    fn joins_root_without_trailing_slash() {
        let playlist: Playlist<()> = Playlist::from_entries(entries(), "/srv/songs").unwrap();
        assert_eq!(playlist.get(1).unwrap().source(), "/srv/songs/Bass Bros.mp3");

        let playlist: Playlist<()> = Playlist::from_entries(entries(), "").unwrap();
        assert_eq!(playlist.get(1).unwrap().source(), "Bass Bros.mp3");
    }

    #[test]
    fn empty_playlist_is_rejected() {
        let result: Result<Playlist<()>> = Playlist::from_entries(Vec::new(), "./audio/");
        assert!(matches!(result, Err(PlaybackError::EmptyPlaylist)));
    }

    #[test]
    fn out_of_range_index_fails() {
        let playlist: Playlist<()> = Playlist::from_entries(entries(), "./audio/").unwrap();
        assert!(playlist.check_index(1).is_ok());
        assert!(matches!(
            playlist.get(2),
            Err(PlaybackError::InvalidIndex { index: 2, len: 2 })
        ));
        assert!(playlist.resource(7).is_none());
    }

    #[test]
    fn resource_is_installed_once() {
        let mut playlist: Playlist<u32> = Playlist::from_entries(entries(), "./audio/").unwrap();
        let track = playlist.get_mut(0).unwrap();

        assert_eq!(*track.install(7).unwrap(), 7);
        assert!(track.is_constructed());
        assert!(matches!(
            track.install(8),
            Err(PlaybackError::InvalidOperation(_))
        ));
        assert_eq!(playlist.resource(0), Some(&7));
    }
}
