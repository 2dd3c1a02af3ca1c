//! Externally visible base URL of the service
//!
//! Built from `X-Forwarded-Proto` and `Host` as set by the reverse proxy in
//! front of the service. The headers are trusted as-is.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::HOST, request::Parts},
};
use std::convert::Infallible;

pub const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// `scheme://host` without a trailing slash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(pub String);

impl BaseUrl {
    pub fn from_parts(parts: &Parts) -> Self {
        let scheme = header_str(parts, FORWARDED_PROTO)
            .or_else(|| parts.uri.scheme_str())
            .unwrap_or("http");
        let host = header_str(parts, HOST.as_str())
            .or_else(|| parts.uri.authority().map(|a| a.as_str()))
            .unwrap_or("");
        Self(format!("{scheme}://{host}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for BaseUrl
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
