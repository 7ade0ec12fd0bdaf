//! Demo server for the request-log middleware.
//!
//! Serves `/slog/{id}`, `POST /slog` and `/health` behind the request id
//! and request log layers, configured from an optional TOML file.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use request_log::config::{load_config, validate_config, AppConfig, ConfigError};
use request_log::observability::logging::init_logging;
use request_log::HttpServer;

#[derive(Parser)]
#[command(name = "request-log")]
#[command(about = "Demo server for request id and request logging middleware", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    init_logging(&config.logging)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.limits.max_body_bytes,
        request_timeout_secs = config.limits.request_timeout_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
