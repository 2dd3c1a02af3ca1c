//! shelfcast - podcast feed for a directory of audio files
//!
//! Serves `/feed`, `/media/*`, `/cover` and `/global-cover` over plain HTTP.
//! Meant to sit behind a reverse proxy that terminates TLS and sets
//! `X-Forwarded-Proto` and `Host`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use shelfcast_common::config::{load_config, ConfigOverrides};
use shelfcast_server::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments
///
/// Anything not given here falls back to the environment, then the config
/// file, then compiled defaults.
#[derive(Parser, Debug)]
#[command(name = "shelfcast")]
#[command(about = "Publish a directory of audio files as a podcast feed")]
#[command(version)]
struct Args {
    /// TOML config file (also SHELFCAST_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the episode files (also MEDIA_ROOT)
    #[arg(short, long)]
    media_root: Option<PathBuf>,

    /// Fallback cover image (also GLOBAL_COVER_PATH)
    #[arg(short, long)]
    global_cover_path: Option<PathBuf>,

    /// Address to listen on (also SHELFCAST_BIND)
    #[arg(short, long)]
    bind: Option<String>,

    /// Feed channel title
    #[arg(long)]
    channel_title: Option<String>,

    /// Feed channel description
    #[arg(long)]
    channel_description: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    request_timeout: Option<u64>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        Self {
            config_file: args.config,
            media_root: args.media_root,
            global_cover_path: args.global_cover_path,
            bind_addr: args.bind,
            channel_title: args.channel_title,
            channel_description: args.channel_description,
            request_timeout_secs: args.request_timeout,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shelfcast=info,shelfcast_server=info,shelfcast_common=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting shelfcast v{}", env!("CARGO_PKG_VERSION"));

    let overrides = ConfigOverrides::from(Args::parse());
    let config = load_config(&overrides).context("Failed to load configuration")?;

    info!("Media root: {}", config.media_root.display());
    info!("Global cover: {}", config.global_cover_path.display());
    if !config.media_root.is_dir() {
        warn!("Media root is not a directory yet, feed will be empty until it is");
    }

    let bind_addr = config.bind_addr.clone();
    let app = build_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;
    info!("Listening on http://{}", bind_addr);
    info!("Feed: http://{}/feed", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
