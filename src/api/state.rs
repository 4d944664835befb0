//! Application state for Axum handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::AppConfig;
use crate::service::{AdminGate, BoardService};
use crate::storage::ReservationStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Board service.
    pub board_service: Arc<BoardService>,
    /// Admin passphrase gate.
    pub admin_gate: Arc<AdminGate>,
    /// Prometheus render handle, present when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn ReservationStore>) -> Self {
        let board_service = Arc::new(BoardService::new(store));
        let admin_gate = Arc::new(AdminGate::new(&config.admin));

        Self {
            config,
            board_service,
            admin_gate,
            metrics: None,
        }
    }

    /// Attach the Prometheus handle used by `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
