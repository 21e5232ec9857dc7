//! # Cinelog Server
//!
//! Serves a demonstration stream addon behind the cinelog request pipeline:
//! CORS, optional metadata enrichment and structured request logging.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use cinelog_config::{ConfigLoad, ConfigLoader};
use cinelog_core::{CinemetaClient, CinemetaOptions, MetaClient};
use cinelog_server::{Pipeline, demo::build_router, infra::telemetry::init_tracing};
use clap::Parser;
use tracing::{info, warn};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "cinelog-server")]
#[command(about = "Stremio addon request instrumentation: CORS, metadata enrichment and request logs")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "CINELOG_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a .env file loaded before reading the environment
    #[arg(long, env = "CINELOG_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }

    init_tracing(config.logging.format).context("failed to initialise tracing")?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "loaded configuration file");
    }
    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    let client: Arc<dyn MetaClient> = Arc::new(
        CinemetaClient::new(CinemetaOptions {
            base_url: config.cinemeta.base_url.clone(),
            timeout: config.cinemeta.timeout,
            cache_ttl: config.cinemeta.cache_ttl,
        })
        .context("failed to build Cinemeta client")?,
    );

    let pipeline = Pipeline::from_config(&config, client)
        .context("invalid request pipeline configuration")?;
    let router = build_router(&pipeline, config.addon.requires_user_data);

    let host = config.server.host.as_str();
    let port = config.server.port;
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    let addr = listener.local_addr().context("failed to read listen address")?;
    info!(%addr, "cinelog-server listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("cinelog-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
