//! Storage backend factory.
//!
//! Creates the reservation store selected by configuration. This is the only
//! place that knows which backend is active.

use std::sync::Arc;

use tracing::info;

use crate::config::{LocalDriver, RemoteDriver, StorageBackend, StorageConfig};
use crate::error::AppError;
use crate::storage::local::{
    FileKeyValueStore, KeyValueStore, LocalReservationStore, MemoryKeyValueStore,
};
use crate::storage::remote::{
    DocumentStore, MemoryDocumentStore, RedisDocumentStore, RemoteReservationStore,
};
use crate::storage::traits::ReservationStore;

/// Create a reservation store based on configuration.
///
/// # Arguments
///
/// * `config` - Storage configuration
///
/// # Returns
///
/// An `Arc<dyn ReservationStore>` pointing to the configured backend, already
/// health-checked.
///
/// # Errors
///
/// Returns `AppError::BackendUnavailable` if the backend cannot be initialized
/// or fails its first health check.
pub async fn create_store(config: &StorageConfig) -> Result<Arc<dyn ReservationStore>, AppError> {
    let store: Arc<dyn ReservationStore> = match config.backend {
        StorageBackend::Local => {
            let kv: Box<dyn KeyValueStore> = match config.local.driver {
                LocalDriver::File => Box::new(FileKeyValueStore::new(&config.local.data_dir)?),
                LocalDriver::Memory => Box::new(MemoryKeyValueStore::new()),
            };
            info!(driver = kv.driver_name(), key = %config.local.key, "Using local board storage");
            Arc::new(LocalReservationStore::new(kv, config.local.key.clone())?)
        }
        StorageBackend::Remote => {
            let db: Arc<dyn DocumentStore> = match config.remote.driver {
                RemoteDriver::Redis => Arc::new(RedisDocumentStore::new(&config.remote.redis)?),
                RemoteDriver::Memory => Arc::new(MemoryDocumentStore::new()),
            };
            info!(
                driver = db.driver_name(),
                collection = %config.remote.collection,
                "Using remote board storage"
            );
            Arc::new(RemoteReservationStore::new(
                db,
                config.remote.collection.clone(),
                config.remote.max_transaction_attempts,
            ))
        }
    };

    // Verify storage is healthy
    store.health_check().await?;

    Ok(store)
}
