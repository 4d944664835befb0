//! Redis document database.
//!
//! Each document is a hash at `<collection>:<id>` with fields `name` and
//! `time` (RFC 3339). Transactions use `WATCH` + `MULTI`/`EXEC`: `EXEC`
//! returns nil when the watched key changed, which is reported as a lost
//! commit. Every committed write or delete publishes on
//! `<collection>:changes`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config as PoolSettings, Connection, Pool, PoolConfig, Runtime};
use futures::StreamExt;
use tokio::time::timeout;

use super::{ChangeFeed, Document, DocumentStore, DocumentTransaction};
use crate::config::RedisStorageConfig;
use crate::error::{StorageError, StorageResult};

/// Document database backed by Redis.
pub struct RedisDocumentStore {
    pool: Pool,
    client: redis::Client,
    connect_timeout: Duration,
}

impl RedisDocumentStore {
    /// Create the connection pool. No connection is opened until first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the pool cannot be built.
    pub fn new(config: &RedisStorageConfig) -> StorageResult<Self> {
        let client = redis::Client::open(config.url.as_str())?;

        let mut settings = PoolSettings::from_url(config.url.clone());
        settings.pool = Some(PoolConfig::new(config.pool_size.max(1)));
        let pool = settings
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            client,
            connect_timeout: Duration::from_secs(config.connect_timeout),
        })
    }

    async fn connection(&self) -> StorageResult<Connection> {
        timeout(self.connect_timeout, self.pool.get())
            .await
            .map_err(|_| StorageError::Connection("timed out waiting for Redis".to_string()))?
            .map_err(StorageError::from)
    }
}

fn document_key(collection: &str, id: &str) -> String {
    format!("{collection}:{id}")
}

fn changes_channel(collection: &str) -> String {
    format!("{collection}:changes")
}

/// Decode a slot hash; an empty hash or a blank name is an absent document.
fn parse_document(key: &str, fields: &HashMap<String, String>) -> StorageResult<Option<Document>> {
    let Some(name) = fields.get("name").filter(|name| !name.trim().is_empty()) else {
        return Ok(None);
    };

    let raw_time = fields
        .get("time")
        .ok_or_else(|| StorageError::Serialization(format!("{key}: missing time field")))?;
    let time = DateTime::parse_from_rfc3339(raw_time)
        .map_err(|e| StorageError::Serialization(format!("{key}: bad time '{raw_time}': {e}")))?
        .with_timezone(&Utc);

    Ok(Some(Document {
        name: name.clone(),
        time,
    }))
}

struct RedisTransaction {
    conn: Connection,
    key: String,
    id: String,
    channel: String,
}

impl RedisTransaction {
    async fn unwatch(&mut self) -> StorageResult<()> {
        redis::cmd("UNWATCH")
            .query_async::<()>(&mut self.conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentTransaction for RedisTransaction {
    async fn get(&mut self) -> StorageResult<Option<Document>> {
        let fields: HashMap<String, String> = self.conn.hgetall(&self.key).await?;
        parse_document(&self.key, &fields)
    }

    async fn commit_set(mut self: Box<Self>, document: Document) -> StorageResult<bool> {
        let time = document.time.to_rfc3339_opts(SecondsFormat::AutoSi, true);

        let outcome: redis::RedisResult<Option<redis::Value>> = redis::pipe()
            .atomic()
            .hset(&self.key, "name", &document.name)
            .hset(&self.key, "time", time)
            .publish(&self.channel, &self.id)
            .query_async(&mut self.conn)
            .await;

        match outcome {
            Ok(reply) => Ok(reply.is_some()),
            Err(e) => {
                // Leave nothing watched on a connection that goes back to the pool
                self.unwatch().await.ok();
                Err(e.into())
            }
        }
    }

    async fn rollback(mut self: Box<Self>) -> StorageResult<()> {
        self.unwatch().await
    }
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn begin(
        &self,
        collection: &str,
        id: &str,
    ) -> StorageResult<Box<dyn DocumentTransaction>> {
        let mut conn = self.connection().await?;
        let key = document_key(collection, id);

        redis::cmd("WATCH")
            .arg(&key)
            .query_async::<()>(&mut conn)
            .await?;

        Ok(Box::new(RedisTransaction {
            conn,
            key,
            id: id.to_string(),
            channel: changes_channel(collection),
        }))
    }

    async fn get_all(
        &self,
        collection: &str,
        ids: &[String],
    ) -> StorageResult<Vec<(String, Document)>> {
        let mut conn = self.connection().await?;

        let mut pipe = redis::pipe();
        for id in ids {
            pipe.hgetall(document_key(collection, id));
        }
        let hashes: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;

        let mut documents = Vec::new();
        for (id, fields) in ids.iter().zip(hashes) {
            if let Some(document) = parse_document(&document_key(collection, id), &fields)? {
                documents.push((id.clone(), document));
            }
        }
        Ok(documents)
    }

    async fn delete_all(&self, collection: &str, ids: &[String]) -> StorageResult<usize> {
        let mut conn = self.connection().await?;

        // Plain pipeline, not MULTI: deletions are not atomic as a group
        let mut pipe = redis::pipe();
        for id in ids {
            pipe.del(document_key(collection, id));
        }
        pipe.publish(changes_channel(collection), "*");
        let replies: Vec<i64> = pipe.query_async(&mut conn).await?;

        let deleted: i64 = replies.iter().take(ids.len()).sum();
        Ok(usize::try_from(deleted).unwrap_or_default())
    }

    async fn watch(&self, collection: &str) -> StorageResult<ChangeFeed> {
        let mut pubsub = timeout(self.connect_timeout, self.client.get_async_pubsub())
            .await
            .map_err(|_| StorageError::Connection("timed out subscribing to Redis".to_string()))??;
        pubsub.subscribe(changes_channel(collection)).await?;

        Ok(Box::pin(pubsub.into_on_message().map(|_| ())))
    }

    async fn health_check(&self) -> StorageResult<()> {
        let mut conn = self.connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(StorageError::Unavailable)
        }
    }

    fn driver_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_keys() {
        assert_eq!(document_key("rifa", "05"), "rifa:05");
        assert_eq!(changes_channel("rifa"), "rifa:changes");
    }

    #[test]
    fn test_parse_document() {
        let parsed = parse_document(
            "rifa:05",
            &fields(&[("name", "Ana"), ("time", "2024-03-01T10:00:00.250Z")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(parsed.name, "Ana");
        assert_eq!(parsed.time.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_absent_documents() {
        assert!(parse_document("k", &HashMap::new()).unwrap().is_none());
        assert!(
            parse_document("k", &fields(&[("name", " "), ("time", "x")]))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_parse_bad_time() {
        let err = parse_document("k", &fields(&[("name", "Ana"), ("time", "yesterday")]));
        assert!(matches!(err, Err(StorageError::Serialization(_))));

        let err = parse_document("k", &fields(&[("name", "Ana")]));
        assert!(matches!(err, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_new_rejects_bad_url() {
        let config = RedisStorageConfig {
            url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(RedisDocumentStore::new(&config).is_err());
    }
}
