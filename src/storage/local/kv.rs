//! Synchronous key-value stores behind the local backend.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use fs2::FileExt;
use parking_lot::RwLock;

use crate::error::{StorageError, StorageResult};

/// A synchronous string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace a value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Check the store is usable.
    fn health_check(&self) -> StorageResult<()>;

    /// Driver name for logs.
    fn driver_name(&self) -> &'static str;
}

/// One file per key under a data directory, guarded by `flock`.
pub struct FileKeyValueStore {
    data_dir: PathBuf,
}

impl FileKeyValueStore {
    /// Open the store, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(|e| {
            StorageError::FileIO(format!("Failed to create directory {}: {e}", data_dir.display()))
        })?;
        Ok(Self { data_dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", sanitize_name(key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let mut file = std::fs::File::open(&path)?;
        file.lock_shared()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let mut contents = String::new();
        let read = file.read_to_string(&mut contents);
        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;
        read?;

        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.key_path(key);

        // Truncate only once the lock is held so readers never see a half-written file
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        file.lock_exclusive()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let written = (|| -> std::io::Result<()> {
            file.seek(SeekFrom::Start(0))?;
            file.set_len(0)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()
        })();

        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;
        written?;

        Ok(())
    }

    fn health_check(&self) -> StorageResult<()> {
        if !self.data_dir.exists() {
            return Err(StorageError::Unavailable);
        }

        let probe = self.data_dir.join(".health_check");
        std::fs::write(&probe, b"ok")
            .map_err(|e| StorageError::FileIO(format!("Health check failed: {e}")))?;
        std::fs::remove_file(&probe)
            .map_err(|e| StorageError::FileIO(format!("Health check cleanup failed: {e}")))?;

        Ok(())
    }

    fn driver_name(&self) -> &'static str {
        "file"
    }
}

/// Values kept in process memory.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn driver_name(&self) -> &'static str {
        "memory"
    }
}

/// Sanitize a name for use as a filename.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
