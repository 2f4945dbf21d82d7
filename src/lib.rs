//! Go Module Graph Proxy Library
//!
//! A CORS-enabled forwarding proxy in front of a Go module proxy, plus a
//! typed client for the module metadata it serves.

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
