//! In-process document database.
//!
//! Every document carries a version that moves on each write or delete.
//! Transactions remember the version they read and commit only if it is
//! still current, the same optimistic scheme hosted document stores use.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::{ChangeFeed, Document, DocumentStore, DocumentTransaction};
use crate::error::StorageResult;

const CHANGE_BUFFER: usize = 256;

#[derive(Debug, Clone, Default)]
struct VersionedDocument {
    version: u64,
    document: Option<Document>,
}

struct Inner {
    documents: DashMap<String, VersionedDocument>,
    changes: broadcast::Sender<String>,
}

impl Inner {
    fn notify(&self, collection: &str) {
        // No subscribers is fine
        let _ = self.changes.send(collection.to_string());
    }
}

/// Document database held in process memory.
#[derive(Clone)]
pub struct MemoryDocumentStore {
    inner: Arc<Inner>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            inner: Arc::new(Inner {
                documents: DashMap::new(),
                changes,
            }),
        }
    }
}

fn document_path(collection: &str, id: &str) -> String {
    format!("{collection}/{id}")
}

struct MemoryTransaction {
    inner: Arc<Inner>,
    collection: String,
    path: String,
    read_version: Option<u64>,
}

impl MemoryTransaction {
    fn current(&self) -> VersionedDocument {
        self.inner
            .documents
            .get(&self.path)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentTransaction for MemoryTransaction {
    async fn get(&mut self) -> StorageResult<Option<Document>> {
        let current = self.current();
        self.read_version = Some(current.version);
        Ok(current.document)
    }

    async fn commit_set(self: Box<Self>, document: Document) -> StorageResult<bool> {
        let expected = self.read_version.unwrap_or_else(|| self.current().version);

        let committed = {
            let mut entry = self.inner.documents.entry(self.path.clone()).or_default();
            if entry.version == expected {
                entry.version += 1;
                entry.document = Some(document);
                true
            } else {
                false
            }
        };

        if committed {
            self.inner.notify(&self.collection);
        }
        Ok(committed)
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn begin(
        &self,
        collection: &str,
        id: &str,
    ) -> StorageResult<Box<dyn DocumentTransaction>> {
        Ok(Box::new(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            collection: collection.to_string(),
            path: document_path(collection, id),
            read_version: None,
        }))
    }

    async fn get_all(
        &self,
        collection: &str,
        ids: &[String],
    ) -> StorageResult<Vec<(String, Document)>> {
        let documents = ids
            .iter()
            .filter_map(|id| {
                let entry = self.inner.documents.get(&document_path(collection, id))?;
                let document = entry.document.clone()?;
                Some((id.clone(), document))
            })
            .collect();
        Ok(documents)
    }

    async fn delete_all(&self, collection: &str, ids: &[String]) -> StorageResult<usize> {
        let mut deleted = 0;
        for id in ids {
            if let Some(mut entry) = self.inner.documents.get_mut(&document_path(collection, id))
                && entry.document.take().is_some()
            {
                entry.version += 1;
                deleted += 1;
            }
        }

        if deleted > 0 {
            self.inner.notify(collection);
        }
        Ok(deleted)
    }

    async fn watch(&self, collection: &str) -> StorageResult<ChangeFeed> {
        let receiver = self.inner.changes.subscribe();
        let collection = collection.to_string();

        let feed = futures::stream::unfold(receiver, move |mut receiver| {
            let collection = collection.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(changed) if changed == collection => return Some(((), receiver)),
                        Ok(_) => {}
                        // Missed signals collapse into one refresh
                        Err(RecvError::Lagged(_)) => return Some(((), receiver)),
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(Box::pin(feed))
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn driver_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use futures::StreamExt;

    use super::*;

    fn doc(name: &str) -> Document {
        Document {
            name: name.to_string(),
            time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commit_after_read() {
        let db = MemoryDocumentStore::new();

        let mut tx = db.begin("rifa", "05").await.unwrap();
        assert!(tx.get().await.unwrap().is_none());
        assert!(tx.commit_set(doc("Ana")).await.unwrap());

        let all = db.get_all("rifa", &["05".to_string()]).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].1.name, "Ana");
    }

    #[tokio::test]
    async fn test_stale_commit_rejected() {
        let db = MemoryDocumentStore::new();

        let mut first = db.begin("rifa", "05").await.unwrap();
        let mut second = db.begin("rifa", "05").await.unwrap();
        assert!(first.get().await.unwrap().is_none());
        assert!(second.get().await.unwrap().is_none());

        assert!(first.commit_set(doc("Ana")).await.unwrap());
        assert!(!second.commit_set(doc("Luis")).await.unwrap());

        let all = db.get_all("rifa", &["05".to_string()]).await.unwrap();
        assert_eq!(all[0].1.name, "Ana");
    }

    #[tokio::test]
    async fn test_delete_conflicts_with_open_transaction() {
        let db = MemoryDocumentStore::new();
        let mut seed = db.begin("rifa", "07").await.unwrap();
        seed.get().await.unwrap();
        seed.commit_set(doc("Ana")).await.unwrap();

        let mut tx = db.begin("rifa", "07").await.unwrap();
        assert!(tx.get().await.unwrap().is_some());

        assert_eq!(db.delete_all("rifa", &["07".to_string()]).await.unwrap(), 1);
        assert!(!tx.commit_set(doc("Luis")).await.unwrap());
    }

    #[tokio::test]
    async fn test_collections_are_separate() {
        let db = MemoryDocumentStore::new();
        let mut tx = db.begin("a", "01").await.unwrap();
        tx.get().await.unwrap();
        tx.commit_set(doc("Ana")).await.unwrap();

        assert!(db.get_all("b", &["01".to_string()]).await.unwrap().is_empty());
        assert_eq!(db.delete_all("b", &["01".to_string()]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_watch_only_sees_its_collection() {
        let db = MemoryDocumentStore::new();
        let mut feed = db.watch("rifa").await.unwrap();

        let mut other = db.begin("other", "01").await.unwrap();
        other.get().await.unwrap();
        other.commit_set(doc("Ana")).await.unwrap();

        let mut mine = db.begin("rifa", "01").await.unwrap();
        mine.get().await.unwrap();
        mine.commit_set(doc("Eva")).await.unwrap();

        let signal = tokio::time::timeout(Duration::from_secs(1), feed.next())
            .await
            .unwrap();
        assert!(signal.is_some());

        let quiet = tokio::time::timeout(Duration::from_millis(50), feed.next()).await;
        assert!(quiet.is_err());
    }
}
