use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zeno_explorer::api::{self, AppState, Dashboard};
use zeno_explorer::config::{load_config, AppConfig};
use zeno_explorer::rpc::RpcRelay;

/// CLI arguments
#[derive(Parser)]
#[command(name = "Zeno Explorer", about = "Zeno Chain explorer backend")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// IP address to bind the server to
    #[arg(long)]
    listen_ip: Option<String>,

    /// Port to bind the server to
    #[arg(long)]
    port: Option<u16>,

    /// Upstream JSON-RPC endpoint
    #[arg(long, env = "ZENO_RPC_ENDPOINT")]
    rpc_endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let mut config: AppConfig = load_config(&args.config)?;

    // CLI and environment win over the config file
    if let Some(ip) = args.listen_ip {
        config.server.listen_ip = Some(ip);
    }
    if let Some(port) = args.port {
        config.server.port = Some(port);
    }
    if let Some(endpoint) = args.rpc_endpoint {
        config.rpc.endpoint = endpoint;
    }

    let relay = Arc::new(RpcRelay::new(&config.rpc)?);
    info!("RPC endpoint: {}", relay.endpoint());

    let dashboard = Arc::new(Dashboard::default());
    let _pollers = dashboard.spawn_pollers(Arc::clone(&relay), &config.poll);

    let state = AppState { relay, dashboard };
    let app = api::router(state, config.server.static_dir.clone());

    let addr = config.server.socket_addr()?;
    info!("Server running on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
