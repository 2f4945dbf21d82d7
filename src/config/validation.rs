//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and URLs. Every
//! problem is reported, not just the first one.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.port must be non-zero")]
    ZeroPort,

    #[error("upstream.timeout_secs must be non-zero")]
    ZeroTimeout,

    #[error("upstream.default_base_url {url:?} is invalid: {reason}")]
    InvalidUpstream { url: String, reason: String },

    #[error("cors.allowed_origins must not be empty")]
    EmptyAllowedOrigins,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let base = &config.upstream.default_base_url;
    match Url::parse(base) {
        Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
            errors.push(ValidationError::InvalidUpstream {
                url: base.clone(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::InvalidUpstream {
            url: base.clone(),
            reason: e.to_string(),
        }),
    }

    if config.cors.allowed_origins.trim().is_empty() {
        errors.push(ValidationError::EmptyAllowedOrigins);
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
