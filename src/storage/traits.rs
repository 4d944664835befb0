//! Storage trait definitions.
//!
//! `ReservationStore` is the capability every backend provides. The API layer
//! only ever sees `Arc<dyn ReservationStore>`, picked once by the factory.

use async_trait::async_trait;

use crate::domain::{Board, Reservation, ResetReport, SlotKey};
use crate::error::Result;
use crate::storage::subscription::BoardSubscription;

/// Claim-if-free reservation storage for one board.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Subscribe to the board.
    ///
    /// The subscription starts with the current snapshot and then yields a new
    /// snapshot whenever the underlying data changes. Dropping it stops
    /// delivery without touching the store.
    async fn observe(&self) -> Result<BoardSubscription>;

    /// Read the whole board once.
    async fn snapshot(&self) -> Result<Board>;

    /// Atomically move a slot from free to reserved.
    ///
    /// The name is trimmed; a blank name fails with `InvalidInput` before the
    /// store is touched. A slot that is already reserved (including one lost
    /// to a concurrent claim) fails with `AlreadyReserved` naming the holder.
    async fn claim(&self, slot: SlotKey, participant_name: &str) -> Result<Reservation>;

    /// Clear every reservation.
    async fn reset_all(&self) -> Result<ResetReport>;

    /// Check if the storage backend is healthy and reachable.
    async fn health_check(&self) -> Result<()>;

    /// Get the storage backend name.
    fn backend_name(&self) -> &'static str;
}
