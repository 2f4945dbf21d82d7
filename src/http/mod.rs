//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span)
//!     → /health → health.rs (fixed liveness payload)
//!     → /proxy  → proxy.rs
//!                   → target.rs (upstream URL)
//!                   → headers.rs (allow-lists, CORS, Cache-Control)
//!                   → upstream via reqwest, body streamed back
//! ```

pub mod error;
pub mod headers;
pub mod health;
pub mod proxy;
pub mod server;
pub mod target;

pub use error::{ProxyError, ServerError};
pub use server::{AppState, HttpServer};
pub use target::TargetDescriptor;
