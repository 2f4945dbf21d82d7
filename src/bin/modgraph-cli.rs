use clap::{Parser, Subcommand};
use serde_json::json;

use go_mod_graph_proxy::client::{format_bytes, ModuleClient, DEFAULT_MAX_DEPTH};

#[derive(Parser)]
#[command(name = "modgraph-cli")]
#[command(about = "Query Go module metadata through go-mod-graph-proxy", long_about = None)]
struct Cli {
    /// Base URL of the running proxy.
    #[arg(short, long, env = "GO_MOD_PROXY_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Upstream module proxy (the server default when omitted).
    #[arg(short, long)]
    proxy: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxy liveness
    Health,
    /// Show the latest release of a module
    Latest { module: String },
    /// List releases of a module, newest first
    Releases { module: String },
    /// List direct dependencies of a module release (latest by default)
    Deps { module: String, release: Option<String> },
    /// Show the zip size of a module release
    Size { module: String, release: String },
    /// Resolve the full dependency tree with minimal version selection
    Graph {
        module: String,
        release: Option<String>,
        /// Look up the zip size of every selected module
        #[arg(long)]
        sizes: bool,
        /// Depth below which nodes are no longer expanded
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = ModuleClient::new(&cli.url, cli.proxy)?;

    let output = match cli.command {
        Commands::Health => {
            let health = client.health().await?;
            json!({ "status": health.status, "service": health.service })
        }
        Commands::Latest { module } => {
            json!({ "module": module, "version": client.latest_release(&module).await? })
        }
        Commands::Releases { module } => {
            json!({ "module": module, "releases": client.releases(&module).await? })
        }
        Commands::Deps { module, release } => {
            let release = match release {
                Some(release) => release,
                None => client.latest_release(&module).await?,
            };
            let deps = client.go_mod(&module, &release).await?;
            json!({ "module": module, "release": release, "requires": deps })
        }
        Commands::Size { module, release } => match client.module_size(&module, &release).await {
            Some(bytes) => json!({
                "module": module,
                "release": release,
                "bytes": bytes,
                "human": format_bytes(bytes),
            }),
            None => return Err(format!("size unavailable for {module}@{release}").into()),
        },
        Commands::Graph {
            module,
            release,
            sizes,
            max_depth,
        } => {
            let release = match release {
                Some(release) => release,
                None => client.latest_release(&module).await?,
            };
            let tree = client
                .dependency_tree(&module, &release, sizes, max_depth)
                .await;
            serde_json::to_value(tree)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
