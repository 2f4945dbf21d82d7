//! Module metadata client.
//!
//! Talks to a running proxy the way the browser front-end does: every
//! upstream path goes through `/proxy?path=...&proxy=...`.
//!
//! # Data Flow
//! ```text
//! ModuleClient (module.rs)
//!     → GET  /{module}/@latest           → latest version
//!     → GET  /{module}/@v/list           → versions
//!     → GET  /{module}/@v/{release}.mod  → gomod.rs (require directives)
//!     → HEAD /{module}/@v/{release}.zip  → Content-Length → format.rs
//!
//! ModuleClient::dependency_tree (mvs.rs)
//!     → go_mod breadth first from the root, highest version wins
//!     → DependencyNode tree
//! ```

pub mod format;
pub mod gomod;
pub mod module;
pub mod mvs;

use reqwest::StatusCode;
use thiserror::Error;

pub use format::format_bytes;
pub use gomod::{normalize_module_path, parse_requires, Requirement};
pub use module::{HealthStatus, ModuleClient};
pub use mvs::{compare_versions, DependencyNode, DEFAULT_MAX_DEPTH};

/// Errors returned by [`ModuleClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Module \"{0}\" not found. Please check the module path.")]
    ModuleNotFound(String),

    #[error("Release \"{release}\" not found for module \"{module}\".")]
    ReleaseNotFound { module: String, release: String },

    #[error("HTTP error! status: {0}")]
    Status(StatusCode),

    #[error("invalid proxy endpoint: {0}")]
    InvalidEndpoint(String),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON from upstream: {0}")]
    Json(#[from] serde_json::Error),
}
