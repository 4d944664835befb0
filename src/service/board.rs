//! Board service.
//!
//! Thin layer over the configured reservation store that logs outcomes and
//! records metrics. It never branches on which backend is active.

use std::sync::Arc;

use metrics::{counter, gauge};
use tracing::{info, warn};

use crate::domain::{Board, Reservation, ResetReport, SlotKey};
use crate::error::{AppError, Result};
use crate::service::export::export_csv;
use crate::storage::{BoardSubscription, ReservationStore};

/// Service for reading, claiming and resetting the board.
pub struct BoardService {
    /// Storage backend.
    store: Arc<dyn ReservationStore>,
}

impl BoardService {
    /// Create a new board service.
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self { store }
    }

    /// Name of the active backend.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Current board.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn board(&self) -> Result<Board> {
        let board = self.store.snapshot().await?;
        record_free_slots(&board);
        Ok(board)
    }

    /// Live view of the board.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be established.
    pub async fn subscribe(&self) -> Result<BoardSubscription> {
        self.store.observe().await
    }

    /// Claim a slot for a participant.
    ///
    /// Failed claims are reported as-is and never retried here; a retry after
    /// losing a race must be the participant's explicit decision.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank name, `AlreadyReserved` when the slot
    /// is taken, or `BackendUnavailable` when the store fails.
    pub async fn claim(&self, slot: SlotKey, name: &str) -> Result<Reservation> {
        let result = self.store.claim(slot, name).await;

        let outcome = match &result {
            Ok(reservation) => {
                info!(slot = %slot, name = %reservation.participant_name, "Slot reserved");
                gauge!("raffle_free_slots").decrement(1.0);
                "reserved"
            }
            Err(AppError::AlreadyReserved { name: holder, .. }) => {
                info!(slot = %slot, holder = %holder, "Slot already taken");
                "taken"
            }
            Err(AppError::InvalidInput(_)) => "invalid",
            Err(e) => {
                warn!(slot = %slot, error = %e, "Claim failed");
                "error"
            }
        };
        counter!("raffle_claims_total", "outcome" => outcome).increment(1);

        result
    }

    /// Clear every reservation. Confirmation is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the store fails; a remote board may then
    /// be partially cleared.
    pub async fn reset(&self) -> Result<ResetReport> {
        let report = self.store.reset_all().await?;
        warn!(cleared = report.cleared, "Board reset");

        counter!("raffle_resets_total").increment(1);
        record_free_slots(&Board::empty());
        Ok(report)
    }

    /// Board rendered as CSV.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn export(&self) -> Result<String> {
        let board = self.board().await?;
        Ok(export_csv(&board))
    }

    /// Check the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable.
    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await
    }
}

/// Set the free-slot gauge from a full board; claims adjust it in between.
#[allow(clippy::cast_precision_loss)]
fn record_free_slots(board: &Board) {
    gauge!("raffle_free_slots").set(board.free_count() as f64);
}
