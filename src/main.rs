//! Go Module Graph Proxy
//!
//! Lets a browser fetch Go module metadata from a module proxy that does not
//! speak CORS.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser                  ┌──────────────────────────────────────────┐
//!     ────────────────────────▶│ /proxy?path=..&proxy=..                  │
//!                              │   target URL → 3 request headers         │──▶ Upstream
//!     ◀────────────────────────│   status + 3 response headers + body     │◀── (proxy.golang.org)
//!                              │   + CORS, + Cache-Control                │
//!                              │                                          │
//!                              │ /health → {"status":"ok",...}            │
//!                              └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use go_mod_graph_proxy::config::{resolve_config, ConfigOverrides};
use go_mod_graph_proxy::lifecycle::startup;
use go_mod_graph_proxy::observability::init_logging;

#[derive(Parser)]
#[command(name = "go-mod-graph-proxy", version)]
#[command(about = "CORS-enabled forwarding proxy for Go module proxies", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "GO_MOD_GRAPH_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Listening port.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Value for Access-Control-Allow-Origin.
    #[arg(long, env = "ALLOWED_ORIGINS")]
    allowed_origins: Option<String>,

    /// Upstream used when a request carries no `proxy` parameter.
    #[arg(long)]
    default_upstream: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        port: cli.port,
        allowed_origins: cli.allowed_origins,
        default_upstream: cli.default_upstream,
    };
    let config = resolve_config(cli.config.as_deref(), &overrides)?;

    init_logging(config.observability.log_format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.listener.port,
        timeout_secs = config.upstream.timeout_secs,
        "go-mod-graph-proxy starting"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
