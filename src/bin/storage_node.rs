// Storage node binary: serves the coordinator-replication RPC surface over
// HTTP and runs the hinted-handoff background worker.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use dynamo_kv_store::api::{node_router, NodeAppState};
use dynamo_kv_store::config::NodeConfig;
use dynamo_kv_store::logging::init_tracing;
use dynamo_kv_store::storage_node::StorageNode;
use dynamo_kv_store::transport::HttpNodeClient;

#[derive(Parser)]
struct Args {
    /// Path to the node's YAML config file.
    #[arg(long, default_value = "node.yaml")]
    config: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = NodeConfig::load(&args.config)?;
    let addr = SocketAddr::new(config.host.parse()?, config.port);

    let node_client = Arc::new(HttpNodeClient::new());
    let node = StorageNode::new(config, node_client);

    tokio::spawn(Arc::clone(&node).run_handoff_worker());

    info!(%addr, "storage node listening");
    let app = node_router(NodeAppState { node });
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
