//! # Ventas API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ventas API Server                               │
//! │                                                                         │
//! │  Client ───► HTTP (PORT) ───► axum routes ───► services ───► SQLite   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Start-up order: tracing, configuration, database (with migrations),
//! application state, listener. Shuts down gracefully on SIGINT / SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use ventas_api::{create_app, ApiConfig, AppState};
use ventas_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Ventas API server...");

    let config = ApiConfig::load().context("loading configuration")?;
    info!(
        port = config.port,
        database = %config.database_path,
        policy = %config.cancellation_policy,
        environment = %config.environment,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await
    .context("opening database")?;

    let addr = config.bind_address();
    let state = Arc::new(AppState::new(config, db.clone()).context("building application state")?);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, starting graceful shutdown"),
        () = terminate => info!("received SIGTERM, starting graceful shutdown"),
    }
}
