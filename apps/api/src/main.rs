//! # Rihla API
//!
//! HTTP server for the booking core.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Rihla API Server                               │
//! │                                                                         │
//! │  Web app ─────────┐                                                    │
//! │  Payment webhook ─┼──► HTTP (8080) ───► Services ───► SQLite           │
//! │  Provider scanner ┘                        │                            │
//! │                                            ▼                            │
//! │                                   Email / SMS relays                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rihla_api::config::ApiConfig;
use rihla_api::{http, notifiers_from_config, AppState};
use rihla_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Rihla API server...");

    let config = ApiConfig::load()?;
    info!(
        addr = %config.socket_addr(),
        db = %config.database_path.display(),
        commission_policy = ?config.commission_policy(),
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await?;
    info!("Database ready");

    let notifiers = notifiers_from_config(&config)?;
    info!(count = notifiers.len(), "Notifiers configured");

    let state = Arc::new(AppState::new(db.clone(), &config, notifiers));
    let app = http::router(state);

    let listener = TcpListener::bind(config.socket_addr()).await?;
    info!(addr = %config.socket_addr(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rihla=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
