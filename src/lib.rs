//! # Raffle Board
//!
//! A shared 00-99 raffle grid. Participants claim free numbers by name and
//! every connected client sees the board change live.
//!
//! - **Remote store**: one document per number, claims decided inside a
//!   document transaction (Redis, or an in-process document store)
//! - **Local store**: the whole board as one JSON blob under a single key
//!   (a file on disk, or memory)
//! - **Admin**: CSV export and reset behind a shared passphrase
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Raffle Board                            │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌──────────────────┐  ┌────────┐  │
//! │  │ API Layer │  │  Service  │  │ ReservationStore │  │ Domain │  │
//! │  │  (Axum)   │→ │   Layer   │→ │ local | remote   │  │ Models │  │
//! │  └───────────┘  └───────────┘  └──────────────────┘  └────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::api::create_router;
use crate::api::state::AppState;
use crate::config::AppConfig;
use crate::storage::create_store;

/// Run the raffle board service.
///
/// This function:
/// 1. Loads configuration from files and environment
/// 2. Installs the Prometheus recorder when metrics are enabled
/// 3. Opens and health-checks the reservation store
/// 4. Starts the HTTP server
/// 5. Handles graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded
/// - The reservation store is unreachable
/// - HTTP server fails to bind
pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting raffle board");

    let metrics = if config.observability.metrics_enabled {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    // A store that fails its first health check aborts startup
    let store = create_store(&config.storage).await?;
    info!(backend = store.backend_name(), "Reservation store ready");

    let mut state = AppState::new(Arc::new(config.clone()), store);
    // Prime the free-slot gauge; claims and resets keep it current afterwards
    state.board_service.board().await?;
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize logging based on configuration.
fn init_logging(config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.observability.log_format == "json" {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
