//! caltrack-server - calibration checklist tracker
//!
//! Serves the checklist UI and JSON API, keeps browsers in sync over SSE,
//! and opens the default browser on startup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use caltrack_common::config::{load_toml_config, Overrides, ServerConfig};
use caltrack_common::db::init_database;
use caltrack_server::{browser, build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for caltrack-server
#[derive(Parser, Debug)]
#[command(name = "caltrack-server")]
#[command(about = "Calibration checklist tracker with live multi-client sync")]
#[command(version)]
struct Args {
    /// Folder holding instance/calibration.db (default: executable's folder)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "CALTRACK_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CALTRACK_PORT")]
    port: Option<u16>,

    /// TOML config file (default: <config dir>/caltrack/config.toml)
    #[arg(short, long, env = "CALTRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Do not open a browser on startup
    #[arg(long)]
    no_browser: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "caltrack_server=info,caltrack_common=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting CalTrack server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let toml_config =
        load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let config = ServerConfig::resolve(
        Overrides {
            root_folder: args.root_folder,
            host: args.host,
            port: args.port,
            no_browser: args.no_browser,
        },
        toml_config,
    );

    info!("Root folder: {}", config.root_folder.display());
    info!("Database path: {}", config.db_path.display());

    let pool = init_database(&config.db_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    let state = AppState::new(pool, config.credentials.clone());
    let app = build_router(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("caltrack-server listening on http://{}", bind_addr);

    if config.open_browser {
        browser::spawn_open_browser(config.local_url(), browser::OPEN_DELAY);
    }

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
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
