use std::path::PathBuf;

use apinet::config::ServerConfig;
use apinet::handler::echo::EchoHandler;
use apinet::net::server::Server;
use clap::Parser;
use log::{info, warn};

#[derive(Debug, Parser)]
#[command(version, about = "JSON API server with per-connection request assembly")]
struct Args {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[async_std::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match args.config {
        Some(path) => ServerConfig::from_file(&path)?,
        None => ServerConfig::default(),
    };
    if config.api_username.is_empty() || config.api_password.is_empty() {
        warn!("API credentials are empty; only an empty Basic user:password will be accepted");
    }

    let server = Server::bind(config, EchoHandler).await?;
    info!("listening on {}", server.local_addr()?);
    server.run().await?;
    Ok(())
}
