//! Warden - Background task runtime for a game server admin layer
//!
//! Wraps a game server's console: stdout carries server commands, logs go to
//! stderr.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warden::api::create_router;
use warden::tasks::DEFAULT_POLL_INTERVAL;
use warden::{AppState, Config};

/// Main entry point for the Warden admin layer.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration (defaults, properties file, environment)
/// 3. Start the background tasks
/// 4. Serve the admin API on the configured port
/// 5. On SIGINT/SIGTERM stop the tasks and close the database connection
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warden=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Warden");

    let config = Config::load().context("Failed to load configuration")?;
    let port = config.admin_port();
    info!(
        port,
        db_enabled = config.get_bool("dbEnabled"),
        "Configuration loaded"
    );

    let state = AppState::start(config, DEFAULT_POLL_INTERVAL);
    let tasks = state.tasks.clone();
    let registry = state.registry.clone();

    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind admin API on {}", addr))?;
    info!("Admin API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Admin API server failed")?;

    tasks.shutdown().await;
    if let Err(e) = registry.close().await {
        warn!(error = %e, "Failed to close database connection");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
