//! The `/proxy` handler.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → OPTIONS? answer preflight
//!     → target.rs (path/proxy params → upstream URL)
//!     → headers.rs (Accept, Accept-Encoding, User-Agent)
//!     → reqwest (same method, body streamed through, total timeout)
//!     → headers.rs (Content-Type, Content-Length, Content-Encoding)
//!     → Cache-Control unless the URL names a listing
//!     → upstream status + streamed body
//! ```

use std::time::Instant;

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;

use crate::http::error::ProxyError;
use crate::http::headers::{copy_response_headers, forwarded_request_headers, CACHE_CONTROL_IMMUTABLE};
use crate::http::server::AppState;
use crate::http::target::TargetDescriptor;
use crate::observability::metrics;

/// Forward one request upstream and relay the answer.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    if method == Method::OPTIONS {
        metrics::record_request(method.as_str(), StatusCode::OK.as_u16(), start_time);
        return StatusCode::OK.into_response();
    }

    let response = match forward(&state, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(method = %method, status = %e.status(), error = %e, "Proxy request rejected");
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}

async fn forward(state: &AppState, request: Request) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();

    let target = TargetDescriptor::from_query(parts.uri.query(), &state.default_upstream)?;
    let url = target.url().clone();

    tracing::debug!(method = %parts.method, upstream = %url, "Forwarding request");

    let mut builder = state
        .client
        .request(parts.method.clone(), url.clone())
        .headers(forwarded_request_headers(&parts.headers));

    // GET/HEAD without a body must not turn into a chunked upload.
    if !body.is_end_stream() {
        builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let outbound = builder.build().map_err(ProxyError::RequestBuild)?;
    let upstream = state
        .client
        .execute(outbound)
        .await
        .map_err(ProxyError::Upstream)?;

    let status = upstream.status();
    tracing::debug!(upstream = %url, status = %status, "Upstream responded");

    let mut headers = axum::http::HeaderMap::new();
    copy_response_headers(upstream.headers(), &mut headers);
    if target.is_cacheable() {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_IMMUTABLE),
        );
    }

    // Status and headers are committed before the first body chunk; a failure
    // from here on can only be logged.
    let stream = upstream.bytes_stream().inspect_err(move |e| {
        tracing::error!(upstream = %url, error = %e, "Error copying response");
    });

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
