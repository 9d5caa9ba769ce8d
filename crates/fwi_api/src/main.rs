//! FWI Prediction API
//!
//! Loads the prediction artifact once and serves predictions over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use fwi_api::{load_state, start_server, ApiConfig};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fwi-api")]
#[command(about = "Fire Weather Index prediction API")]
#[command(version)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Prediction artifact path
    #[arg(short, long)]
    artifact: Option<PathBuf>,

    /// Refuse to start without a digest sidecar
    #[arg(long)]
    require_hash: bool,
}

fn resolve_config(cli: &Cli) -> Result<ApiConfig> {
    let mut config = match &cli.config {
        Some(path) => ApiConfig::from_file(path)?,
        None => ApiConfig::default(),
    };
    config.apply_env_overrides()?;

    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(artifact) = &cli.artifact {
        config.artifact_path = artifact.clone();
    }
    if cli.require_hash {
        config.require_hash = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli).context("Failed to load configuration")?;

    info!("FWI API v{}", env!("CARGO_PKG_VERSION"));
    info!("Loading artifact from {}", config.artifact_path.display());

    let state = load_state(&config).map_err(|err| {
        error!("Cannot start without a valid artifact: {}", err);
        err
    })?;

    start_server(state, &config).await
}
