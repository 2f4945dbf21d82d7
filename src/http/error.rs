//! Error types for the HTTP layer.
//!
//! Every per-request failure maps to exactly one plain-text response. Errors
//! that happen after the status line is committed never reach this type; they
//! are logged by the body stream instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// A failure while turning an inbound request into an upstream exchange.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The `path` query parameter is absent or empty.
    #[error("Missing 'path' parameter")]
    MissingPath,

    /// The `path` query parameter cannot be forwarded as given.
    #[error("Invalid 'path' parameter: {0}")]
    InvalidPath(String),

    /// The `proxy` query parameter is not a usable base URL.
    #[error("Invalid proxy URL: {0}")]
    InvalidProxyUrl(String),

    /// The outbound request could not be assembled.
    #[error("Failed to create request: {0}")]
    RequestBuild(#[source] reqwest::Error),

    /// The upstream exchange failed (connect, DNS, timeout, protocol).
    #[error("Proxy request failed: {0}")]
    Upstream(#[source] reqwest::Error),
}

impl ProxyError {
    /// Status code reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingPath
            | ProxyError::InvalidPath(_)
            | ProxyError::InvalidProxyUrl(_) => StatusCode::BAD_REQUEST,
            ProxyError::RequestBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Errors raised while assembling the server from its configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid header value for {name}: {value:?}")]
    InvalidHeader { name: &'static str, value: String },

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}
