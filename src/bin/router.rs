// Router binary: resolves coordinators and forwards client RPCs.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use dynamo_kv_store::api::{router_router, RouterAppState};
use dynamo_kv_store::config::RouterConfig;
use dynamo_kv_store::logging::init_tracing;
use dynamo_kv_store::router::RouterService;
use dynamo_kv_store::transport::HttpNodeClient;

#[derive(Parser)]
struct Args {
    /// Path to the router's YAML config file.
    #[arg(long, default_value = "router.yaml")]
    config: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = RouterConfig::load(&args.config)?;
    let addr = SocketAddr::new(config.lb_host.parse()?, config.lb_port);

    let node_client = Arc::new(HttpNodeClient::new());
    let router = Arc::new(RouterService::new(config, node_client));

    info!(%addr, "router listening");
    let app = router_router(RouterAppState { router });
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
