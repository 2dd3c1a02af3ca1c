//! Episode metadata extraction
//!
//! Turns [`AudioTags`] into the title/artist/album triple shown in the feed.
//! Missing or unreadable tags never fail: they fall back to placeholder values.

use crate::tags::{read_tags, AudioTags};
use std::path::Path;

/// Artist used when the tags name none
pub const UNKNOWN_ARTIST: &str = "Unknown";

/// Normalized episode metadata
///
/// `title` is never empty and `artist` defaults to [`UNKNOWN_ARTIST`].
/// `album` may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl Metadata {
    /// Text used for the feed item description: `"{album or title} – {artist}"`
    pub fn description(&self) -> String {
        let lead = if self.album.is_empty() {
            &self.title
        } else {
            &self.album
        };
        format!("{} – {}", lead, self.artist)
    }
}

/// Metadata plus embedded-cover presence, from a single tag parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeInfo {
    pub metadata: Metadata,
    pub has_cover: bool,
}

/// Extract metadata for one audio file
pub fn extract(path: &Path) -> Metadata {
    metadata_from_tags(path, read_tags(path).as_ref())
}

/// Whether the file carries an embedded cover image
///
/// Unreadable files have none.
pub fn has_embedded_cover(path: &Path) -> bool {
    read_tags(path).is_some_and(|tags| tags.has_cover())
}

/// Metadata and cover presence for one audio file
pub fn inspect(path: &Path) -> EpisodeInfo {
    let tags = read_tags(path);
    EpisodeInfo {
        metadata: metadata_from_tags(path, tags.as_ref()),
        has_cover: tags.as_ref().is_some_and(AudioTags::has_cover),
    }
}

/// Build metadata from already-read tags
///
/// `None` means the file could not be parsed at all; the title is then the
/// full file name, extension included. Parsed files without a title use the
/// file name with its extension stripped.
pub fn metadata_from_tags(path: &Path, tags: Option<&AudioTags>) -> Metadata {
    let Some(tags) = tags else {
        return Metadata {
            title: file_name(path),
            artist: UNKNOWN_ARTIST.to_string(),
            album: String::new(),
        };
    };

    let (title, artist, album) = match tags {
        AudioTags::Id3(id3) => (id3.title.clone(), id3.artist.clone(), id3.album.clone()),
        AudioTags::Mp4(mp4) => (mp4.title.clone(), mp4.artist.clone(), mp4.album.clone()),
        AudioTags::Unknown => (None, None, None),
    };

    Metadata {
        title: title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| file_stem(path)),
        artist: artist
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        album: album.unwrap_or_default(),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
