use anyhow::Result;
use clap::Parser;
use rendezvous_server::{ServerConfig, serve};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();
    info!("Initializing signaling server...");

    serve(config).await
}
