//! slipscan-relay - upload relay for the transfer-slip extraction backend
//!
//! Accepts image uploads and export requests from SlipScan clients, forwards
//! them to the configured extraction backend and relays the answer.

use anyhow::{Context, Result};
use clap::Parser;
use slipscan_common::config::{ConfigOverrides, RelayConfig};
use slipscan_relay::{build_router, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for slipscan-relay
///
/// Unset options fall back to SLIPSCAN_* environment variables, then the
/// TOML config file.
#[derive(Parser, Debug)]
#[command(name = "slipscan-relay")]
#[command(about = "Upload relay for the SlipScan extraction backend")]
#[command(version)]
struct Args {
    /// Extraction backend base URL (e.g. http://127.0.0.1:8000)
    #[arg(short, long)]
    backend_url: Option<String>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = RelayConfig::resolve(ConfigOverrides {
        backend_url: args.backend_url,
        bind: args.bind,
        config_path: args.config,
    })
    .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "slipscan_relay={level},slipscan_common={level},tower_http={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting SlipScan relay v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match config.backend_url.as_deref() {
        Some(url) => info!("Extraction backend: {}", url),
        None => warn!(
            "No extraction backend configured (set --backend-url or SLIPSCAN_BACKEND_URL); \
             relay endpoints will answer 503"
        ),
    }

    let bind = config.bind;
    let state = AppState::new(config).context("Failed to initialize backend client")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("slipscan-relay listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
