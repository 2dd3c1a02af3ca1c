//! Cover image endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::cover::CoverLookup;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Query parameters for `/cover`
#[derive(Debug, Deserialize)]
pub struct CoverQuery {
    /// Media file name, relative to the media root
    pub file: Option<String>,
}

/// GET /cover?file={name}
///
/// Embedded cover of the named file, else the global cover. Without `file`
/// the global cover is served directly.
pub async fn get_cover(
    State(state): State<AppState>,
    Query(query): Query<CoverQuery>,
) -> ApiResult<Response> {
    let covers = state.covers.clone();
    let lookup = tokio::task::spawn_blocking(move || covers.resolve(query.file.as_deref())).await?;
    image_response(lookup, "cover")
}

/// GET /global-cover
pub async fn get_global_cover(State(state): State<AppState>) -> ApiResult<Response> {
    let covers = state.covers.clone();
    let lookup = tokio::task::spawn_blocking(move || covers.global()).await?;
    image_response(lookup, "global cover")
}

fn image_response(lookup: CoverLookup, what: &str) -> ApiResult<Response> {
    match lookup {
        CoverLookup::Found(image) => {
            Ok(([(header::CONTENT_TYPE, image.mime)], image.bytes).into_response())
        }
        CoverLookup::NotFound => Err(ApiError::NotFound(what.to_string())),
    }
}
