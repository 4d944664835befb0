//! Remote reservation store.
//!
//! One document per slot in a shared, transactional document database.
//! Claims run as read-check-write transactions: the slot is re-read inside the
//! transaction and the write commits only if nobody touched the document in
//! between. A commit that loses to another writer re-runs the whole
//! transaction, whose fresh read then sees the winner and reports it.
//!
//! Document databases plug in through [`DocumentStore`]; see [`memory`] and
//! [`redis`] for the drivers.

pub mod memory;
pub mod redis;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::{
    Board, ParticipantName, Reservation, ResetReport, SlotKey, decide_claim, slot_keys,
};
use crate::error::{Result, StorageError, StorageResult};
use crate::storage::subscription::BoardSubscription;
use crate::storage::traits::ReservationStore;

pub use self::memory::MemoryDocumentStore;
pub use self::redis::RedisDocumentStore;

/// A slot document: fields `name` and `time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Participant holding the slot.
    pub name: String,
    /// Claim time.
    pub time: DateTime<Utc>,
}

impl From<&Reservation> for Document {
    fn from(reservation: &Reservation) -> Self {
        Self {
            name: reservation.participant_name.clone(),
            time: reservation.reserved_at,
        }
    }
}

impl From<Document> for Reservation {
    fn from(document: Document) -> Self {
        Self {
            participant_name: document.name,
            reserved_at: document.time,
        }
    }
}

/// Stream of "the collection changed" signals.
pub type ChangeFeed = BoxStream<'static, ()>;

/// An optimistic transaction on a single document.
#[async_trait]
pub trait DocumentTransaction: Send {
    /// Read the document as seen by this transaction.
    async fn get(&mut self) -> StorageResult<Option<Document>>;

    /// Write the document.
    ///
    /// Returns `false` when another writer changed the document after it was
    /// read; nothing is written in that case.
    async fn commit_set(self: Box<Self>, document: Document) -> StorageResult<bool>;

    /// Abandon the transaction without writing.
    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}

/// A document database with per-document transactions and a change feed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Start a transaction on one document.
    async fn begin(&self, collection: &str, id: &str)
    -> StorageResult<Box<dyn DocumentTransaction>>;

    /// Fetch the listed documents that exist.
    async fn get_all(&self, collection: &str, ids: &[String])
    -> StorageResult<Vec<(String, Document)>>;

    /// Delete the listed documents as one batch; returns how many existed.
    ///
    /// The batch is not atomic across documents: a failure may leave some
    /// documents deleted.
    async fn delete_all(&self, collection: &str, ids: &[String]) -> StorageResult<usize>;

    /// Subscribe to changes in a collection.
    async fn watch(&self, collection: &str) -> StorageResult<ChangeFeed>;

    /// Check the database is reachable.
    async fn health_check(&self) -> StorageResult<()>;

    /// Driver name for logs.
    fn driver_name(&self) -> &'static str;
}

/// Board stored as one document per slot.
pub struct RemoteReservationStore {
    db: Arc<dyn DocumentStore>,
    collection: String,
    max_attempts: u32,
}

impl RemoteReservationStore {
    /// Create a store over `db`, using documents in `collection`.
    #[must_use]
    pub fn new(db: Arc<dyn DocumentStore>, collection: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            db,
            collection: collection.into(),
            max_attempts: max_attempts.max(1),
        }
    }
}

async fn load_board(db: &dyn DocumentStore, collection: &str) -> StorageResult<Board> {
    let documents = db.get_all(collection, &slot_keys()).await?;

    let entries = documents.into_iter().filter_map(|(id, document)| {
        let slot = id.parse::<SlotKey>().ok()?;
        if document.name.trim().is_empty() {
            return None;
        }
        Some((slot, Reservation::from(document)))
    });

    Ok(Board::from_reservations(entries))
}

/// Roll back a transaction that will not commit. Every exit after `begin`
/// goes through here or through `commit_set`.
async fn abandon(tx: Box<dyn DocumentTransaction>, slot: SlotKey) {
    if let Err(e) = tx.rollback().await {
        warn!(slot = %slot, error = %e, "Rollback failed");
    }
}

#[async_trait]
impl ReservationStore for RemoteReservationStore {
    async fn observe(&self) -> Result<BoardSubscription> {
        // Subscribe before the first read so no write slips between the two
        let mut feed = self.db.watch(&self.collection).await?;
        let initial = load_board(self.db.as_ref(), &self.collection).await?;
        let (sender, receiver) = watch::channel(initial);

        let db = Arc::clone(&self.db);
        let collection = self.collection.clone();
        let feeder = tokio::spawn(async move {
            while feed.next().await.is_some() {
                match load_board(db.as_ref(), &collection).await {
                    Ok(board) => {
                        if sender.send(board).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(collection = %collection, error = %e, "Failed to refresh board"),
                }
            }
            debug!(collection = %collection, "Board change feed closed");
        });

        Ok(BoardSubscription::with_feeder(receiver, feeder))
    }

    async fn snapshot(&self) -> Result<Board> {
        Ok(load_board(self.db.as_ref(), &self.collection).await?)
    }

    async fn claim(&self, slot: SlotKey, participant_name: &str) -> Result<Reservation> {
        let name = ParticipantName::parse(participant_name)?;
        let id = slot.to_string();

        for attempt in 1..=self.max_attempts {
            let mut tx = self.db.begin(&self.collection, &id).await?;
            let existing = match tx.get().await {
                Ok(document) => document.map(Reservation::from),
                Err(e) => {
                    abandon(tx, slot).await;
                    return Err(e.into());
                }
            };

            let reservation = match decide_claim(slot, existing.as_ref(), name.clone(), Utc::now())
            {
                Ok(reservation) => reservation,
                Err(e) => {
                    abandon(tx, slot).await;
                    return Err(e);
                }
            };

            if tx.commit_set(Document::from(&reservation)).await? {
                return Ok(reservation);
            }
            debug!(slot = %slot, attempt, "Claim transaction contended, retrying");
        }

        info!(slot = %slot, attempts = self.max_attempts, "Claim transaction gave up");
        Err(StorageError::ConcurrentModification(format!("{}/{id}", self.collection)).into())
    }

    async fn reset_all(&self) -> Result<ResetReport> {
        let cleared = self
            .db
            .delete_all(&self.collection, &slot_keys())
            .await
            .inspect_err(|e| {
                warn!(
                    collection = %self.collection,
                    error = %e,
                    "Reset failed, board may be partially cleared"
                );
            })?;

        Ok(ResetReport { cleared })
    }

    async fn health_check(&self) -> Result<()> {
        Ok(self.db.health_check().await?)
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}
