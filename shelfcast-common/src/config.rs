//! Configuration loading and priority resolution
//!
//! Every value is resolved in this order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MEDIA_ROOT: &str = "/media";
pub const DEFAULT_GLOBAL_COVER_PATH: &str = "/cover/global_cover.jpg";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_CHANNEL_TITLE: &str = "Meine Hörbücher";
pub const DEFAULT_CHANNEL_DESCRIPTION: &str = "Automatischer Hörbuch-Podcast";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const MEDIA_ROOT_ENV: &str = "MEDIA_ROOT";
pub const GLOBAL_COVER_PATH_ENV: &str = "GLOBAL_COVER_PATH";
pub const BIND_ADDR_ENV: &str = "SHELFCAST_BIND";
pub const CHANNEL_TITLE_ENV: &str = "SHELFCAST_CHANNEL_TITLE";
pub const CHANNEL_DESCRIPTION_ENV: &str = "SHELFCAST_CHANNEL_DESCRIPTION";
pub const REQUEST_TIMEOUT_ENV: &str = "SHELFCAST_REQUEST_TIMEOUT";
pub const CONFIG_FILE_ENV: &str = "SHELFCAST_CONFIG";

/// Fixed channel-level text of the generated feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub title: String,
    pub description: String,
}

impl Default for ChannelInfo {
    fn default() -> Self {
        Self {
            title: DEFAULT_CHANNEL_TITLE.to_string(),
            description: DEFAULT_CHANNEL_DESCRIPTION.to_string(),
        }
    }
}

/// Resolved service configuration
///
/// Built once at startup and never mutated afterwards. Handlers receive it
/// through the router state.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Directory scanned for episodes and served under `/media`
    pub media_root: PathBuf,
    /// Fallback cover image served under `/global-cover`
    pub global_cover_path: PathBuf,
    /// Socket address the HTTP server binds to
    pub bind_addr: String,
    pub channel: ChannelInfo,
    /// Deadline for sending a response
    ///
    /// Blocking tag parsing already started for the request runs to completion
    /// in the background after the deadline.
    pub request_timeout: Duration,
}

impl FeedConfig {
    /// Configuration with the given paths and compiled defaults for everything else
    pub fn new(media_root: impl Into<PathBuf>, global_cover_path: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
            global_cover_path: global_cover_path.into(),
            ..Self::default()
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from(DEFAULT_MEDIA_ROOT),
            global_cover_path: PathBuf::from(DEFAULT_GLOBAL_COVER_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            channel: ChannelInfo::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Contents of a `config.toml` file; every key is optional
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub media_root: Option<PathBuf>,
    pub global_cover_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub channel_title: Option<String>,
    pub channel_description: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub media_root: Option<PathBuf>,
    pub global_cover_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub channel_title: Option<String>,
    pub channel_description: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Resolve the full configuration from overrides, environment, config file and defaults
pub fn load_config(overrides: &ConfigOverrides) -> Result<FeedConfig> {
    let file = load_config_file(overrides.config_file.as_deref())?;

    let media_root = overrides
        .media_root
        .clone()
        .or_else(|| env_value(MEDIA_ROOT_ENV).map(PathBuf::from))
        .or(file.media_root)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT));

    let global_cover_path = overrides
        .global_cover_path
        .clone()
        .or_else(|| env_value(GLOBAL_COVER_PATH_ENV).map(PathBuf::from))
        .or(file.global_cover_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GLOBAL_COVER_PATH));

    let bind_addr = overrides
        .bind_addr
        .clone()
        .or_else(|| env_value(BIND_ADDR_ENV))
        .or(file.bind_addr)
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

    let title = overrides
        .channel_title
        .clone()
        .or_else(|| env_value(CHANNEL_TITLE_ENV))
        .or(file.channel_title)
        .unwrap_or_else(|| DEFAULT_CHANNEL_TITLE.to_string());

    let description = overrides
        .channel_description
        .clone()
        .or_else(|| env_value(CHANNEL_DESCRIPTION_ENV))
        .or(file.channel_description)
        .unwrap_or_else(|| DEFAULT_CHANNEL_DESCRIPTION.to_string());

    let timeout_secs = match overrides.request_timeout_secs {
        Some(secs) => secs,
        None => match env_value(REQUEST_TIMEOUT_ENV) {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                Error::Config(format!("{REQUEST_TIMEOUT_ENV}={raw:?} is not a number of seconds: {e}"))
            })?,
            None => file
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        },
    };

    if timeout_secs == 0 {
        return Err(Error::Config("request timeout must be at least 1 second".to_string()));
    }

    Ok(FeedConfig {
        media_root,
        global_cover_path,
        bind_addr,
        channel: ChannelInfo { title, description },
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

/// Parse a TOML config file
pub fn parse_config_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Load the explicitly named config file, or the first default location that exists
///
/// A named file must be readable and valid. Default locations are optional; a broken
/// one is logged and ignored.
fn load_config_file(explicit: Option<&Path>) -> Result<TomlConfig> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| env_value(CONFIG_FILE_ENV).map(PathBuf::from));

    if let Some(path) = explicit {
        debug!(path = %path.display(), "Loading config file");
        return parse_config_file(&path);
    }

    let Some(path) = default_config_paths().into_iter().find(|p| p.is_file()) else {
        debug!("No config file found, using environment and defaults");
        return Ok(TomlConfig::default());
    };

    match parse_config_file(&path) {
        Ok(config) => {
            debug!(path = %path.display(), "Loaded config file");
            Ok(config)
        }
        Err(e) => {
            warn!("Ignoring config file: {}", e);
            Ok(TomlConfig::default())
        }
    }
}

/// Default config file locations, most specific first
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("shelfcast").join("config.toml"));
    }
    if cfg!(unix) {
        paths.push(PathBuf::from("/etc/shelfcast/config.toml"));
    }
    paths
}

/// Non-empty environment variable value
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
