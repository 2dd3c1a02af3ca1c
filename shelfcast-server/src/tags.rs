//! Tag reading adapter over `lofty`
//!
//! Reduces whatever lofty reports for a file to a closed set of tag shapes:
//! ID3 (MP3), MP4 `ilst` atoms (M4A/M4B), or unknown. Everything downstream
//! matches on [`AudioTags`] and never touches lofty directly.
//!
//! Picture mime types pass through lofty's `MimeType`, which normalises known
//! aliases (a declared `image/jpg` comes back as `image/jpeg`). Unrecognised
//! types are kept as declared.

use lofty::config::ParseOptions;
use lofty::file::{FileType, TaggedFile, TaggedFileExt};
use lofty::picture::MimeType;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{Tag, TagType};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Tag reading errors
///
/// Never leaves this module: a file that cannot be read is reported as `None`.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Failed to open or identify the file
    #[error("Failed to open file: {0}")]
    OpenError(String),

    /// File type identified but its structure could not be parsed
    #[error("Failed to read tags: {0}")]
    ReadError(String),
}

/// Tags of one audio file, by container format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioTags {
    /// MPEG audio with (possibly absent) ID3 frames
    Id3(Id3Tags),
    /// MP4 container with (possibly absent) `ilst` atoms
    Mp4(Mp4Tags),
    /// Parsed, but neither of the two supported containers
    Unknown,
}

/// Text frames and APIC pictures of an ID3 tag
///
/// Text fields come from the ID3v2 tag, with ID3v1 filling the ones it lacks.
/// Pictures only exist in ID3v2.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Id3Tags {
    /// `TIT2`
    pub title: Option<String>,
    /// `TPE1`
    pub artist: Option<String>,
    /// `TALB`
    pub album: Option<String>,
    /// `APIC` frames in tag order
    pub pictures: Vec<Id3Picture>,
}

/// One `APIC` frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id3Picture {
    /// MIME type as declared in the frame, if any
    pub mime: Option<String>,
    pub data: Vec<u8>,
}

/// Atoms of an MP4 `ilst` tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mp4Tags {
    /// `©nam`
    pub title: Option<String>,
    /// `©ART`
    pub artist: Option<String>,
    /// `©alb`
    pub album: Option<String>,
    /// `covr` entries in atom order
    pub covers: Vec<Mp4Cover>,
}

/// One `covr` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mp4Cover {
    pub format: CoverFormat,
    pub data: Vec<u8>,
}

/// Image format declared by a `covr` data atom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverFormat {
    Png,
    Jpeg,
    Other,
}

impl AudioTags {
    /// Whether the tags carry at least one embedded image
    pub fn has_cover(&self) -> bool {
        match self {
            AudioTags::Id3(tags) => !tags.pictures.is_empty(),
            AudioTags::Mp4(tags) => !tags.covers.is_empty(),
            AudioTags::Unknown => false,
        }
    }
}

/// Read the tags of an audio file
///
/// Returns `None` when the file cannot be opened or parsed. This is not treated
/// as an error anywhere: callers substitute placeholder metadata.
pub fn read_tags(path: &Path) -> Option<AudioTags> {
    match probe(path) {
        Ok(tagged_file) => Some(classify(&tagged_file)),
        Err(e) => {
            debug!(file = %path.display(), error = %e, "Unparseable audio file");
            None
        }
    }
}

fn probe(path: &Path) -> Result<TaggedFile, MetadataError> {
    // Guess from content first; the extension is the fallback
    Probe::open(path)
        .map_err(|e| MetadataError::OpenError(e.to_string()))?
        .options(ParseOptions::new().read_properties(false))
        .guess_file_type()
        .map_err(|e| MetadataError::OpenError(e.to_string()))?
        .read()
        .map_err(|e| MetadataError::ReadError(e.to_string()))
}

fn classify(tagged_file: &TaggedFile) -> AudioTags {
    match tagged_file.file_type() {
        FileType::Mpeg => {
            let v2 = tagged_file.tag(TagType::Id3v2).map(id3_from_tag);
            let v1 = tagged_file.tag(TagType::Id3v1).map(id3_from_tag);
            AudioTags::Id3(merge_id3(v2.unwrap_or_default(), v1))
        }
        FileType::Mp4 => AudioTags::Mp4(
            tagged_file
                .tag(TagType::Mp4Ilst)
                .map(mp4_from_tag)
                .unwrap_or_default(),
        ),
        _ => AudioTags::Unknown,
    }
}

fn id3_from_tag(tag: &Tag) -> Id3Tags {
    Id3Tags {
        title: non_empty(tag.title()),
        artist: non_empty(tag.artist()),
        album: non_empty(tag.album()),
        pictures: tag
            .pictures()
            .iter()
            .map(|pic| Id3Picture {
                mime: pic.mime_type().map(|m| m.as_str().to_string()),
                data: pic.data().to_vec(),
            })
            .collect(),
    }
}

/// Fill text fields missing from the ID3v2 tag with the ID3v1 values
fn merge_id3(mut v2: Id3Tags, v1: Option<Id3Tags>) -> Id3Tags {
    if let Some(v1) = v1 {
        v2.title = v2.title.or(v1.title);
        v2.artist = v2.artist.or(v1.artist);
        v2.album = v2.album.or(v1.album);
    }
    v2
}

fn mp4_from_tag(tag: &Tag) -> Mp4Tags {
    Mp4Tags {
        title: non_empty(tag.title()),
        artist: non_empty(tag.artist()),
        album: non_empty(tag.album()),
        covers: tag
            .pictures()
            .iter()
            .map(|pic| Mp4Cover {
                format: match pic.mime_type() {
                    Some(MimeType::Png) => CoverFormat::Png,
                    Some(MimeType::Jpeg) => CoverFormat::Jpeg,
                    _ => CoverFormat::Other,
                },
                data: pic.data().to_vec(),
            })
            .collect(),
    }
}

fn non_empty(value: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    value.map(|v| v.into_owned()).filter(|v| !v.is_empty())
}
