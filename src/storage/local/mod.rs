//! Local reservation store.
//!
//! The whole board lives under one key of a synchronous key-value store as a
//! single JSON blob. Every mutation reads the blob, decides and writes it back
//! inside one critical section, so two claims on the same slot can never both
//! see it free.
//!
//! Subscribers get the board loaded at startup and a fresh snapshot after each
//! mutation made through this instance. Writes by other processes sharing the
//! same data directory are not announced.

mod blob;
mod kv;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::{Board, ParticipantName, Reservation, ResetReport, SlotKey, decide_claim};
use crate::error::{Result, StorageResult};
use crate::storage::subscription::BoardSubscription;
use crate::storage::traits::ReservationStore;

pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};

/// Board kept as one blob in a local key-value store.
pub struct LocalReservationStore {
    kv: Box<dyn KeyValueStore>,
    key: String,
    /// Serializes read-decide-write cycles within this process.
    write_lock: Mutex<()>,
    board: watch::Sender<Board>,
}

impl LocalReservationStore {
    /// Open the store and load the current board.
    ///
    /// # Errors
    ///
    /// Returns an error if the key-value store cannot be read.
    pub fn new(kv: Box<dyn KeyValueStore>, key: impl Into<String>) -> StorageResult<Self> {
        let key = key.into();
        let initial = load_board(kv.as_ref(), &key)?;
        debug!(
            driver = kv.driver_name(),
            key = %key,
            reserved = initial.reserved_count(),
            "Loaded local board"
        );

        Ok(Self {
            kv,
            key,
            write_lock: Mutex::new(()),
            board: watch::Sender::new(initial),
        })
    }

    /// Run one read-decide-write cycle and publish the result.
    fn update<T>(&self, apply: impl FnOnce(&mut Board) -> Result<T>) -> Result<T> {
        let _guard = self.write_lock.lock();

        let mut board = load_board(self.kv.as_ref(), &self.key)?;
        let outcome = apply(&mut board)?;
        self.kv.set(&self.key, &blob::encode(&board)?)?;
        self.board.send_replace(board);

        Ok(outcome)
    }
}

/// Read the blob; an unreadable blob counts as an empty board.
fn load_board(kv: &dyn KeyValueStore, key: &str) -> StorageResult<Board> {
    let Some(raw) = kv.get(key)? else {
        return Ok(Board::empty());
    };

    match blob::decode(&raw) {
        Ok(board) => Ok(board),
        Err(e) => {
            warn!(key = %key, error = %e, "Stored board is unreadable, starting empty");
            Ok(Board::empty())
        }
    }
}

#[async_trait]
impl ReservationStore for LocalReservationStore {
    async fn observe(&self) -> Result<BoardSubscription> {
        Ok(BoardSubscription::new(self.board.subscribe()))
    }

    async fn snapshot(&self) -> Result<Board> {
        let _guard = self.write_lock.lock();
        Ok(load_board(self.kv.as_ref(), &self.key)?)
    }

    async fn claim(&self, slot: SlotKey, participant_name: &str) -> Result<Reservation> {
        let name = ParticipantName::parse(participant_name)?;

        self.update(|board| {
            let reservation = decide_claim(slot, board.get(slot), name, Utc::now())?;
            board.set(slot, Some(reservation.clone()));
            Ok(reservation)
        })
    }

    async fn reset_all(&self) -> Result<ResetReport> {
        self.update(|board| {
            let cleared = board.reserved_count();
            *board = Board::empty();
            Ok(ResetReport { cleared })
        })
    }

    async fn health_check(&self) -> Result<()> {
        Ok(self.kv.health_check()?)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::error::AppError;

    fn slot(n: u8) -> SlotKey {
        SlotKey::new(n).unwrap()
    }

    fn memory_store() -> LocalReservationStore {
        LocalReservationStore::new(Box::new(MemoryKeyValueStore::new()), "rifa_numbers_v1").unwrap()
    }

    fn file_store(dir: &TempDir) -> LocalReservationStore {
        let kv = FileKeyValueStore::new(dir.path()).unwrap();
        LocalReservationStore::new(Box::new(kv), "rifa_numbers_v1").unwrap()
    }

    #[tokio::test]
    async fn test_claim_then_conflict() {
        let store = memory_store();

        let ana = store.claim(slot(5), "Ana").await.unwrap();
        assert_eq!(ana.participant_name, "Ana");

        let board = store.snapshot().await.unwrap();
        assert_eq!(board.get(slot(5)).unwrap().participant_name, "Ana");

        let err = store.claim(slot(5), "Luis").await.unwrap_err();
        match err {
            AppError::AlreadyReserved { slot: s, name } => {
                assert_eq!(s, slot(5));
                assert_eq!(name, "Ana");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_name_never_writes() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = LocalReservationStore::new(Box::new(SharedKv(Arc::clone(&kv))), "k").unwrap();

        for raw in ["", "   "] {
            let err = store.claim(slot(1), raw).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }

        assert!(kv.get("k").unwrap().is_none());
        assert_eq!(store.snapshot().await.unwrap(), Board::empty());
    }

    #[tokio::test]
    async fn test_name_is_trimmed() {
        let store = memory_store();
        let reservation = store.claim(slot(8), "  Eva  ").await.unwrap();
        assert_eq!(reservation.participant_name, "Eva");
    }

    #[tokio::test]
    async fn test_observe_reflects_claims_immediately() {
        let store = memory_store();
        let mut subscription = store.observe().await.unwrap();
        assert_eq!(subscription.current().free_count(), 100);

        store.claim(slot(42), "Ana").await.unwrap();
        let board = subscription.next().await.unwrap();
        assert_eq!(board.get(slot(42)).unwrap().participant_name, "Ana");
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let store = memory_store();
        store.claim(slot(1), "Ana").await.unwrap();
        store.claim(slot(2), "Luis").await.unwrap();

        let report = store.reset_all().await.unwrap();
        assert_eq!(report.cleared, 2);

        let subscription = store.observe().await.unwrap();
        let board = subscription.current();
        assert_eq!(board.iter().count(), 100);
        assert!(board.iter().all(|(_, reservation)| reservation.is_none()));
    }

    #[tokio::test]
    async fn test_concurrent_claims_single_winner() {
        let store = Arc::new(memory_store());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.claim(slot(77), &format!("player {i}")).await
            }));
        }

        let mut winners = Vec::new();
        let mut losers = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(reservation) => winners.push(reservation.participant_name),
                Err(AppError::AlreadyReserved { name, .. }) => losers.push(name),
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(winners.len(), 1);
        assert_eq!(losers.len(), 15);
        assert!(losers.iter().all(|name| *name == winners[0]));
    }

    #[tokio::test]
    async fn test_file_board_persists() {
        let dir = TempDir::new().unwrap();
        file_store(&dir).claim(slot(13), "Ana").await.unwrap();

        let reopened = file_store(&dir);
        let subscription = reopened.observe().await.unwrap();
        assert_eq!(
            subscription.current().get(slot(13)).unwrap().participant_name,
            "Ana"
        );
    }

    #[tokio::test]
    async fn test_corrupt_blob_reads_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("rifa_numbers_v1.json"), "{oops").unwrap();

        let store = file_store(&dir);
        assert_eq!(store.snapshot().await.unwrap(), Board::empty());

        store.claim(slot(0), "Ana").await.unwrap();
        assert_eq!(store.snapshot().await.unwrap().reserved_count(), 1);
    }

    #[tokio::test]
    async fn test_bad_entry_does_not_erase_other_reservations() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("rifa_numbers_v1.json"),
            r#"{"01":{"name":"Ana","time":"2024-12-24T20:15:00.000Z"},"02":{"name":"Luis"}}"#,
        )
        .unwrap();

        let store = file_store(&dir);
        assert_eq!(store.snapshot().await.unwrap().reserved_count(), 1);

        store.claim(slot(3), "Eva").await.unwrap();

        let reopened = file_store(&dir);
        let board = reopened.snapshot().await.unwrap();
        assert_eq!(board.get(slot(1)).unwrap().participant_name, "Ana");
        assert_eq!(board.get(slot(3)).unwrap().participant_name, "Eva");
        assert!(board.is_free(slot(2)));
        assert_eq!(board.reserved_count(), 2);
    }

    /// Lets a test keep a handle on the key-value store it hands over.
    struct SharedKv(Arc<MemoryKeyValueStore>);

    impl KeyValueStore for SharedKv {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.0.set(key, value)
        }

        fn health_check(&self) -> StorageResult<()> {
            self.0.health_check()
        }

        fn driver_name(&self) -> &'static str {
            "shared"
        }
    }
}
