//! Header allow-lists and CORS headers.
//!
//! Only a fixed set of headers crosses the proxy in either direction.
//! Credentials, cookies and hop-by-hop headers are never forwarded.

use axum::http::{
    header::{self, HeaderName},
    HeaderMap, HeaderValue,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::http::error::ServerError;

/// Inbound headers copied onto the upstream request.
pub const FORWARDED_REQUEST_HEADERS: [HeaderName; 3] =
    [header::ACCEPT, header::ACCEPT_ENCODING, header::USER_AGENT];

/// Upstream headers copied onto the caller's response.
pub const FORWARDED_RESPONSE_HEADERS: [HeaderName; 3] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_ENCODING,
];

/// `Cache-Control` value for immutable module-proxy content.
pub const CACHE_CONTROL_IMMUTABLE: &str = "public, max-age=3600";

pub const CORS_ALLOW_METHODS: &str = "HEAD, GET, POST, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type";

/// Headers for the upstream request, taken from the inbound request.
///
/// Empty values are skipped.
pub fn forwarded_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in FORWARDED_REQUEST_HEADERS {
        if let Some(value) = inbound.get(&name).filter(|v| !v.is_empty()) {
            headers.insert(name, value.clone());
        }
    }
    headers
}

/// Copy the response allow-list from `upstream` into `response`.
///
/// Headers the upstream did not send are left unset.
pub fn copy_response_headers(upstream: &HeaderMap, response: &mut HeaderMap) {
    for name in FORWARDED_RESPONSE_HEADERS {
        if let Some(value) = upstream.get(&name) {
            response.insert(name, value.clone());
        }
    }
}

/// The three CORS headers stamped on every `/proxy` response.
pub fn cors_headers(allowed_origins: &str) -> Result<[(HeaderName, HeaderValue); 3], ServerError> {
    let origin =
        HeaderValue::from_str(allowed_origins).map_err(|_| ServerError::InvalidHeader {
            name: "Access-Control-Allow-Origin",
            value: allowed_origins.to_string(),
        })?;

    Ok([
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, origin),
        (
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ),
    ])
}

/// Layers that set the CORS headers, overriding anything already present.
pub fn cors_layers(
    allowed_origins: &str,
) -> Result<Vec<SetResponseHeaderLayer<HeaderValue>>, ServerError> {
    Ok(cors_headers(allowed_origins)?
        .into_iter()
        .map(|(name, value)| SetResponseHeaderLayer::overriding(name, value))
        .collect())
}
