//! Shared fixtures for integration tests
//!
//! Builds media directories with synthetic MP3 files (valid MPEG frames, with
//! an ID3v2 tag, an ID3v1 trailer or neither) and skeleton MP4 files carrying
//! an `ilst` tag, and parses feed XML back into plain structs.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
};
use id3::frame::{Content, Frame, Picture, PictureType};
use id3::{TagLike, Version};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use shelfcast_common::FeedConfig;
use shelfcast_server::{build_router, AppState};
use std::path::PathBuf;
use tower::util::ServiceExt; // for `oneshot` method

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz, joint stereo
const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
const FRAME_LEN: usize = 417;

/// `covr` data atom type codes
pub const COVR_JPEG: u32 = 13;
pub const COVR_PNG: u32 = 14;
const DATA_UTF8: u32 = 1;

/// Media root plus a global cover location inside one temp dir
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub media_root: PathBuf,
    pub cover_path: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let media_root = dir.path().join("media");
        std::fs::create_dir(&media_root).unwrap();
        let cover_path = dir.path().join("cover").join("global_cover.jpg");
        std::fs::create_dir(cover_path.parent().unwrap()).unwrap();
        Self {
            dir,
            media_root,
            cover_path,
        }
    }

    pub fn config(&self) -> FeedConfig {
        FeedConfig::new(&self.media_root, &self.cover_path)
    }

    pub fn app(&self) -> axum::Router {
        build_router(AppState::new(self.config()))
    }

    pub fn write_global_cover(&self, bytes: &[u8]) {
        std::fs::write(&self.cover_path, bytes).unwrap();
    }

    /// Arbitrary bytes under the media root
    pub fn write_file(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.media_root.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    /// MP3 without any tag
    pub fn write_untagged_mp3(&self, name: &str) -> PathBuf {
        self.write_file(name, &mpeg_frames(20))
    }

    /// MP3 carrying the given ID3v2.4 tag
    pub fn write_tagged_mp3(&self, name: &str, tag: &id3::Tag) -> PathBuf {
        let path = self.write_untagged_mp3(name);
        tag.write_to_path(&path, Version::Id3v24).unwrap();
        path
    }

    /// MP3 with only a 128-byte ID3v1 trailer
    pub fn write_id3v1_mp3(&self, name: &str, title: &str, artist: &str, album: &str) -> PathBuf {
        let mut data = mpeg_frames(20);
        data.extend_from_slice(&id3v1_trailer(title, artist, album));
        self.write_file(name, &data)
    }

    /// MP4 file with an `ilst` tag
    pub fn write_mp4(&self, name: &str, tags: &Mp4Fixture<'_>) -> PathBuf {
        self.write_file(name, &tags.to_bytes())
    }
}

/// A run of identical, valid MPEG audio frames with silent payload
pub fn mpeg_frames(count: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(count * FRAME_LEN);
    for _ in 0..count {
        data.extend_from_slice(&FRAME_HEADER);
        data.resize(data.len() + FRAME_LEN - FRAME_HEADER.len(), 0);
    }
    data
}

fn id3v1_field(value: &str, len: usize) -> Vec<u8> {
    let mut field = value.as_bytes().to_vec();
    field.resize(len, 0);
    field
}

/// `TAG` + title(30) + artist(30) + album(30) + year(4) + comment(30) + genre(1)
pub fn id3v1_trailer(title: &str, artist: &str, album: &str) -> Vec<u8> {
    let mut tag = b"TAG".to_vec();
    tag.extend(id3v1_field(title, 30));
    tag.extend(id3v1_field(artist, 30));
    tag.extend(id3v1_field(album, 30));
    tag.extend(id3v1_field("2020", 4));
    tag.extend(id3v1_field("", 30));
    tag.push(255);
    tag
}

/// Fields of a skeleton MP4 file; empty strings are left out of the `ilst`
#[derive(Debug, Default)]
pub struct Mp4Fixture<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub album: &'a str,
    /// `(type code, bytes)` per `covr` data atom
    pub covers: Vec<(u32, &'a [u8])>,
}

impl Mp4Fixture<'_> {
    /// `ftyp`, then `moov/mvhd` and `moov/udta/meta/{hdlr,ilst}`, then a small `mdat`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut items = Vec::new();
        for (ident, value) in [
            (*b"\xa9nam", self.title),
            (*b"\xa9ART", self.artist),
            (*b"\xa9alb", self.album),
        ] {
            if !value.is_empty() {
                items.extend(atom(&ident, &data_atom(DATA_UTF8, value.as_bytes())));
            }
        }
        if !self.covers.is_empty() {
            let covr: Vec<u8> = self
                .covers
                .iter()
                .flat_map(|(code, bytes)| data_atom(*code, bytes))
                .collect();
            items.extend(atom(b"covr", &covr));
        }

        let mut hdlr = vec![0u8; 8];
        hdlr.extend_from_slice(b"mdirappl");
        hdlr.extend_from_slice(&[0u8; 9]);

        let mut meta = vec![0u8; 4];
        meta.extend(atom(b"hdlr", &hdlr));
        meta.extend(atom(b"ilst", &items));

        let mut moov = atom(b"mvhd", &mvhd());
        moov.extend(atom(b"udta", &atom(b"meta", &meta)));

        let mut ftyp = b"M4A ".to_vec();
        ftyp.extend_from_slice(&[0u8; 4]);
        ftyp.extend_from_slice(b"M4A isom");

        let mut file = atom(b"ftyp", &ftyp);
        file.extend(atom(b"moov", &moov));
        file.extend(atom(b"mdat", &[0u8; 16]));
        file
    }
}

fn atom(ident: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((8 + payload.len()) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(ident);
    out.extend_from_slice(payload);
    out
}

/// Version 0, 24-bit type code, zero locale, then the value
fn data_atom(type_code: u32, value: &[u8]) -> Vec<u8> {
    let mut payload = type_code.to_be_bytes().to_vec();
    payload.extend_from_slice(&[0u8; 4]);
    payload.extend_from_slice(value);
    atom(b"data", &payload)
}

/// Version 0 movie header: 1000 Hz timescale, zero duration
fn mvhd() -> Vec<u8> {
    let mut mvhd = vec![0u8; 100];
    mvhd[12..16].copy_from_slice(&1000u32.to_be_bytes());
    mvhd[20..24].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    mvhd[24..26].copy_from_slice(&0x0100u16.to_be_bytes());
    // identity matrix
    mvhd[36..40].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    mvhd[52..56].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    mvhd[68..72].copy_from_slice(&0x4000_0000u32.to_be_bytes());
    mvhd[96..100].copy_from_slice(&1u32.to_be_bytes());
    mvhd
}

/// ID3 tag with TIT2 / TPE1 / TALB set
pub fn id3_tag(title: &str, artist: &str, album: &str) -> id3::Tag {
    let mut tag = id3::Tag::new();
    tag.set_title(title);
    tag.set_artist(artist);
    tag.set_album(album);
    tag
}

/// Append an APIC frame
pub fn add_picture(tag: &mut id3::Tag, mime: &str, data: &[u8]) {
    let picture = Picture {
        mime_type: mime.to_string(),
        picture_type: PictureType::CoverFront,
        description: String::new(),
        data: data.to_vec(),
    };
    tag.add_frame(Frame::with_content("APIC", Content::Picture(picture)));
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("host", "pods.local:5000")
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: axum::Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

pub fn content_type(response: &Response<Body>) -> String {
    response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    pub title: String,
    pub guid: String,
    pub description: String,
    pub enclosure_url: String,
    pub enclosure_type: String,
    pub image: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub rss_version: String,
    pub itunes_ns: String,
    pub title: String,
    pub link: String,
    pub image: Option<String>,
    pub items: Vec<ParsedItem>,
}

fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .unwrap()
        .map(|a| a.unescape_value().unwrap().into_owned())
}

/// Parse the RSS document produced by `/feed`
pub fn parse_feed(xml: &str) -> ParsedFeed {
    let mut reader = Reader::from_str(xml);
    let mut feed = ParsedFeed::default();
    let mut current: Option<ParsedItem> = None;
    let mut element = String::new();

    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) => {
                element = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match element.as_str() {
                    "rss" => {
                        feed.rss_version = attr(&e, "version").unwrap_or_default();
                        feed.itunes_ns = attr(&e, "xmlns:itunes").unwrap_or_default();
                    }
                    "item" => current = Some(ParsedItem::default()),
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match (name.as_str(), current.as_mut()) {
                    ("enclosure", Some(item)) => {
                        item.enclosure_url = attr(&e, "url").unwrap_or_default();
                        item.enclosure_type = attr(&e, "type").unwrap_or_default();
                    }
                    ("itunes:image", Some(item)) => item.image = attr(&e, "href"),
                    ("itunes:image", None) => feed.image = attr(&e, "href"),
                    _ => {}
                }
            }
            Event::Text(t) => {
                let text = t.unescape().unwrap().into_owned();
                match (element.as_str(), current.as_mut()) {
                    ("title", Some(item)) => item.title = text,
                    ("guid", Some(item)) => item.guid = text,
                    ("description", Some(item)) => item.description = text,
                    ("title", None) => feed.title = text,
                    ("link", None) => feed.link = text,
                    _ => {}
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        feed.items.push(item);
                    }
                }
                element.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    feed
}

/// Fetch and parse `/feed`
pub async fn fetch_feed(app: axum::Router, request: Request<Body>) -> ParsedFeed {
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let xml = String::from_utf8(body_bytes(response).await).unwrap();
    parse_feed(&xml)
}
