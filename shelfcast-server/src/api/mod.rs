//! HTTP API handlers and routing

pub mod base_url;
pub mod cover;
pub mod feed;
pub mod health;

pub use base_url::BaseUrl;
pub use cover::{get_cover, get_global_cover};
pub use feed::get_feed;
pub use health::health_routes;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::AppState;

/// All routes with their layers
///
/// `/media` is served straight from the media root; `ServeDir` rejects
/// paths that would leave it and answers range requests. The timeout answers
/// 408 but does not cancel blocking work already handed to `spawn_blocking`.
pub fn routes(state: AppState) -> Router {
    let media = ServeDir::new(&state.config.media_root).append_index_html_on_directories(false);
    let timeout = state.config.request_timeout;

    Router::new()
        .route("/feed", get(get_feed))
        .route("/cover", get(get_cover))
        .route("/global-cover", get(get_global_cover))
        .merge(health_routes())
        .nest_service("/media", media)
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
