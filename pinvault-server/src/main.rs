//! PinVault API Server
//!
//! Serves the account and credential API for the web client. Credential
//! passwords arrive already encrypted by the client; the server only ever
//! stores ciphertext and digests.

mod config;
mod error;
mod extract;
mod handlers;
mod server;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pinvault-server", about = "PinVault credential API server")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "pinvault-server.toml")]
    config: PathBuf,

    /// Listen address override
    #[arg(short, long)]
    listen: Option<String>,

    /// Database path override
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Directory of the built web client to serve
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut cfg = if cli.config.exists() {
        config::ServerConfig::load(&cli.config)?
    } else {
        tracing::info!("No config file found, using defaults");
        config::ServerConfig::default()
    };

    if let Some(listen) = cli.listen {
        cfg.listen_addr = listen;
    }
    if let Some(database) = cli.database {
        cfg.storage_path = database;
    }
    if let Some(static_dir) = cli.static_dir {
        cfg.static_dir = Some(static_dir);
    }

    tracing::info!("Starting PinVault server on {}", cfg.listen_addr);

    let db = pinvault_core::Database::open(&cfg.storage_path)?;
    let app = server::build_router(db, &cfg);

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
