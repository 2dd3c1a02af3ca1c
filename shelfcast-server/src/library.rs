//! Media directory listing
//!
//! The episode list is recomputed from the filesystem for every feed request.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Container kind of an episode file, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// `.mp3`
    Mpeg,
    /// `.m4a` / `.m4b`
    Mp4,
}

impl MediaKind {
    /// Kind for a file extension (case-insensitive), `None` if not an episode
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => Some(MediaKind::Mpeg),
            "m4a" | "m4b" => Some(MediaKind::Mp4),
            _ => None,
        }
    }

    /// MIME type used for the feed enclosure
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaKind::Mpeg => "audio/mpeg",
            MediaKind::Mp4 => "audio/mp4",
        }
    }
}

/// One eligible episode file in the media root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// File name, also used as the feed item guid
    pub name: String,
    pub path: PathBuf,
    pub kind: MediaKind,
}

/// List eligible episode files in `root`, sorted by file name
///
/// A missing or unreadable directory yields an empty list.
pub fn scan(root: &Path) -> Vec<MediaFile> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(root = %root.display(), error = %e, "Cannot list media root, feed will be empty");
            return Vec::new();
        }
    };

    let mut files: Vec<MediaFile> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    debug!(name = ?raw, "Skipping non UTF-8 file name");
                    return None;
                }
            };
            // Follows symlinks
            if !path.is_file() {
                return None;
            }
            let kind = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(MediaKind::from_extension)?;
            Some(MediaFile { name, path, kind })
        })
        .collect();

    files.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(root = %root.display(), count = files.len(), "Scanned media root");
    files
}
