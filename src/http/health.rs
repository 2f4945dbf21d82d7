//! Liveness endpoint.

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};

/// Fixed body returned by `/health`.
pub const HEALTH_BODY: &str = r#"{"status":"ok","service":"go-mod-graph-proxy"}"#;

pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        HEALTH_BODY,
    )
}
