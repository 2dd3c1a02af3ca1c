//! Cover art resolution
//!
//! Lookup order for `/cover?file=...`:
//! 1. No file named: the global cover
//! 2. Named file missing or outside the media root: not found
//! 3. Image embedded in the file's tags
//! 4. The global cover
//! 5. Not found

use crate::tags::{read_tags, AudioTags, CoverFormat};
use shelfcast_common::FeedConfig;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_PNG: &str = "image/png";

/// Raw image bytes with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Outcome of a cover lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverLookup {
    Found(CoverImage),
    NotFound,
}

/// Resolves cover images against the media root and the global cover file
#[derive(Debug, Clone)]
pub struct CoverResolver {
    media_root: PathBuf,
    global_cover_path: PathBuf,
}

impl CoverResolver {
    pub fn new(media_root: impl Into<PathBuf>, global_cover_path: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
            global_cover_path: global_cover_path.into(),
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(&config.media_root, &config.global_cover_path)
    }

    /// Whether the global cover file is currently present
    pub fn has_global_cover(&self) -> bool {
        self.global_cover_path.is_file()
    }

    /// The global cover, always served as JPEG
    pub fn global(&self) -> CoverLookup {
        if !self.has_global_cover() {
            return CoverLookup::NotFound;
        }
        match std::fs::read(&self.global_cover_path) {
            Ok(bytes) => CoverLookup::Found(CoverImage {
                bytes,
                mime: MIME_JPEG.to_string(),
            }),
            Err(e) => {
                warn!(
                    path = %self.global_cover_path.display(),
                    error = %e,
                    "Global cover exists but cannot be read"
                );
                CoverLookup::NotFound
            }
        }
    }

    /// Cover for a media file, falling back to the global cover
    ///
    /// An empty file name counts as no file name.
    pub fn resolve(&self, file: Option<&str>) -> CoverLookup {
        let Some(name) = file.filter(|f| !f.is_empty()) else {
            return self.global();
        };

        let Some(path) = resolve_in_root(&self.media_root, name) else {
            debug!(file = name, "Rejected cover request outside media root");
            return CoverLookup::NotFound;
        };
        if !path.exists() {
            return CoverLookup::NotFound;
        }

        match read_tags(&path).and_then(|tags| embedded_cover(&tags)) {
            Some(image) => CoverLookup::Found(image),
            None => {
                debug!(file = name, "No embedded cover, using global cover");
                self.global()
            }
        }
    }
}

/// First embedded image of the tags, with its MIME type
///
/// ID3: first APIC frame, declared MIME as lofty reports it (JPEG when absent).
/// MP4: first `covr` entry, PNG when declared so, JPEG otherwise.
pub fn embedded_cover(tags: &AudioTags) -> Option<CoverImage> {
    match tags {
        AudioTags::Id3(id3) => id3.pictures.first().map(|pic| CoverImage {
            bytes: pic.data.clone(),
            mime: pic
                .mime
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(MIME_JPEG)
                .to_string(),
        }),
        AudioTags::Mp4(mp4) => mp4.covers.first().map(|cover| CoverImage {
            bytes: cover.data.clone(),
            mime: match cover.format {
                CoverFormat::Png => MIME_PNG,
                CoverFormat::Jpeg | CoverFormat::Other => MIME_JPEG,
            }
            .to_string(),
        }),
        AudioTags::Unknown => None,
    }
    .filter(|image| !image.bytes.is_empty())
}

/// Join a client-supplied relative name onto `root`
///
/// Returns `None` for names that are absolute or step outside the root.
pub fn resolve_in_root(root: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    let mut path = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (path != root).then_some(path)
}
