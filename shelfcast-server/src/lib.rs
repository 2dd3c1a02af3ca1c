//! shelfcast server library
//!
//! Publishes a directory of audio files as a podcast feed:
//! - `GET /feed`: RSS 2.0 document with one item per episode
//! - `GET /media/{file}`: the episode files themselves
//! - `GET /cover?file=...`: embedded cover art, falling back to the global cover
//! - `GET /global-cover`: the configured fallback cover
//! - `GET /health`: liveness check

use axum::Router;
use shelfcast_common::FeedConfig;
use std::sync::Arc;

pub mod api;
pub mod cover;
pub mod error;
pub mod feed;
pub mod library;
pub mod metadata;
pub mod tags;

use cover::CoverResolver;
use feed::FeedBuilder;

/// Application state shared across HTTP handlers
///
/// Everything in here is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<FeedConfig>,
    pub feed: Arc<FeedBuilder>,
    pub covers: Arc<CoverResolver>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: FeedConfig) -> Self {
        Self {
            feed: Arc::new(FeedBuilder::from_config(&config)),
            covers: Arc::new(CoverResolver::from_config(&config)),
            config: Arc::new(config),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    api::routes(state)
}
