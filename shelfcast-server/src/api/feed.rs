//! Podcast feed endpoint

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::api::BaseUrl;
use crate::error::ApiResult;
use crate::feed::RSS_CONTENT_TYPE;
use crate::AppState;

/// GET /feed
///
/// Regenerates the RSS document from the media root on every request.
pub async fn get_feed(State(state): State<AppState>, base_url: BaseUrl) -> ApiResult<Response> {
    let builder = state.feed.clone();
    let xml = tokio::task::spawn_blocking(move || builder.build(base_url.as_str())).await??;

    Ok(([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], xml).into_response())
}
