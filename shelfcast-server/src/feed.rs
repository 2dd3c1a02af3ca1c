//! RSS 2.0 podcast feed generation
//!
//! One `<item>` per episode file in the media root, in file name order, with
//! iTunes `image` elements pointing back at the cover endpoints.

use crate::cover::CoverResolver;
use crate::library::{self, MediaFile};
use crate::metadata;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use shelfcast_common::config::ChannelInfo;
use shelfcast_common::FeedConfig;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

pub const ITUNES_NS: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";
pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

/// Feed generation errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// XML writer failure
    #[error("XML write error: {0}")]
    Xml(String),
}

/// One rendered `<item>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub guid: String,
    pub description: String,
    pub enclosure_url: String,
    pub enclosure_type: &'static str,
    /// iTunes image href, present when the file embeds a cover
    pub image_href: Option<String>,
}

impl FeedItem {
    /// Build the item for one episode file
    pub fn for_file(file: &MediaFile, base_url: &str) -> Self {
        let info = metadata::inspect(&file.path);
        let escaped = urlencoding::encode(&file.name);
        Self {
            description: info.metadata.description(),
            title: info.metadata.title,
            guid: file.name.clone(),
            enclosure_url: format!("{base_url}/media/{escaped}"),
            enclosure_type: file.kind.mime_type(),
            image_href: info
                .has_cover
                .then(|| format!("{base_url}/cover?file={escaped}")),
        }
    }
}

/// Builds the feed document from the media root
#[derive(Debug, Clone)]
pub struct FeedBuilder {
    media_root: PathBuf,
    channel: ChannelInfo,
    covers: CoverResolver,
}

impl FeedBuilder {
    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            media_root: config.media_root.clone(),
            channel: config.channel.clone(),
            covers: CoverResolver::from_config(config),
        }
    }

    /// Scan the media root and collect one item per episode
    pub fn items(&self, base_url: &str) -> Vec<FeedItem> {
        library::scan(&self.media_root)
            .iter()
            .map(|file| FeedItem::for_file(file, base_url))
            .collect()
    }

    /// Complete RSS document as UTF-8 bytes
    ///
    /// Filesystem problems never fail the feed; they only shrink it.
    pub fn build(&self, base_url: &str) -> Result<Vec<u8>, FeedError> {
        let items = self.items(base_url);
        let channel_image = self
            .covers
            .has_global_cover()
            .then(|| format!("{base_url}/global-cover"));

        debug!(items = items.len(), global_cover = channel_image.is_some(), "Building feed");

        let mut out = RssWriter::new();
        out.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        out.start("rss", &[("version", "2.0"), ("xmlns:itunes", ITUNES_NS)])?;
        out.start("channel", &[])?;
        out.text_element("title", &self.channel.title)?;
        out.text_element("description", &self.channel.description)?;
        out.text_element("link", base_url)?;
        if let Some(href) = &channel_image {
            out.empty("itunes:image", &[("href", href.as_str())])?;
        }

        for item in &items {
            out.start("item", &[])?;
            out.text_element("title", &item.title)?;
            out.text_element("guid", &item.guid)?;
            out.text_element("description", &item.description)?;
            out.empty(
                "enclosure",
                &[("url", item.enclosure_url.as_str()), ("type", item.enclosure_type)],
            )?;
            if let Some(href) = &item.image_href {
                out.empty("itunes:image", &[("href", href.as_str())])?;
            }
            out.end("item")?;
        }

        out.end("channel")?;
        out.end("rss")?;
        Ok(out.into_inner())
    }
}

/// Thin wrapper over the quick-xml writer for element-at-a-time output
struct RssWriter {
    writer: Writer<Vec<u8>>,
}

impl RssWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), FeedError> {
        self.writer
            .write_event(event)
            .map_err(|e| FeedError::Xml(e.to_string()))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), FeedError> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Start(elem))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), FeedError> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Empty(elem))
    }

    fn end(&mut self, name: &str) -> Result<(), FeedError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), FeedError> {
        self.start(name, &[])?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn into_inner(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}
