use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::TagSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Candidate identifiers for a search against one catalog version
    CandidateSearch {
        catalog_version: i64,
        body_type: String,
        lifestyle: Vec<String>,
        limit: usize,
    },
}

impl CacheKey {
    /// Builds a search key; lifestyle tokens are sorted so tag order never splits entries
    pub fn candidate_search(
        catalog_version: i64,
        body_type: &str,
        lifestyle: &TagSet,
        limit: usize,
    ) -> Self {
        let mut lifestyle: Vec<String> = lifestyle.keys().map(str::to_string).collect();
        lifestyle.sort_unstable();
        CacheKey::CandidateSearch {
            catalog_version,
            body_type: crate::models::tag_key(body_type),
            lifestyle,
            limit,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::CandidateSearch {
                catalog_version,
                body_type,
                lifestyle,
                limit,
            } => write!(
                f,
                "candidates:v{}:{}:{}:{}",
                catalog_version,
                body_type,
                lifestyle.join("|"),
                limit
            ),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Pending write for the background writer
struct CacheWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed cache with fire-and-forget writes
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
    write_tx: mpsc::UnboundedSender<CacheWrite>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer to flush pending writes and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Connects to Redis and spawns the background writer task
    pub async fn new(redis_client: Client) -> AppResult<(Self, CacheWriterHandle)> {
        let connection = ConnectionManager::new(redis_client).await?;
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let writer_connection = connection.clone();
        tokio::spawn(async move {
            Self::writer_task(writer_connection, write_rx, shutdown_rx).await;
        });

        Ok((
            Self {
                connection,
                write_tx,
            },
            CacheWriterHandle { shutdown_tx },
        ))
    }

    /// Applies queued writes until shutdown, then drains what is left
    async fn writer_task(
        mut connection: ConnectionManager,
        mut write_rx: mpsc::UnboundedReceiver<CacheWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    if let Err(e) = Self::apply(&mut connection, write).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut flushed = 0usize;
                    while let Some(write) = write_rx.recv().await {
                        match Self::apply(&mut connection, write).await {
                            Ok(()) => flushed += 1,
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                            }
                        }
                    }
                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn apply(connection: &mut ConnectionManager, write: CacheWrite) -> AppResult<()> {
        let _: () = connection.set_ex(write.key, write.value, write.ttl).await?;
        Ok(())
    }

    /// Reads and deserializes a cached value, `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut connection = self.connection.clone();
        let cached: Option<String> = connection.get(key.to_string()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })
            })
            .transpose()
    }

    /// Queues a write without waiting for Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let write = CacheWrite {
            key: key.to_string(),
            value,
            ttl,
        };

        if let Err(e) = self.write_tx.send(write) {
            tracing::error!(error = %e, "Failed to queue cache write");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[test]
    fn test_candidate_search_key_display() {
        let key = CacheKey::candidate_search(4, "Pear", &TagSet::parse("Social,Business Casual"), 500);
        assert_eq!(
            key.to_string(),
            "candidates:v4:pear:business casual|social:500"
        );
    }

    #[test]
    fn test_candidate_search_key_ignores_tag_order_and_case() {
        let a = CacheKey::candidate_search(1, "pear", &TagSet::parse("Lounge,Social"), 500);
        let b = CacheKey::candidate_search(1, "PEAR", &TagSet::parse("social, lounge"), 500);
        assert_eq!(a, b);
    }

    #[test]
    fn test_candidate_search_key_changes_with_catalog_version() {
        let tags = TagSet::parse("Social");
        let a = CacheKey::candidate_search(1, "Pear", &tags, 500);
        let b = CacheKey::candidate_search(2, "Pear", &tags, 500);
        assert_ne!(a.to_string(), b.to_string());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_set_in_background_then_read() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, handle) = Cache::new(client.clone()).await.unwrap();

        let key = CacheKey::candidate_search(999, "test-body", &TagSet::parse("test"), 1);
        let value = vec!["A1".to_string()];
        cache.set_in_background(&key, &value, 60);
        handle.shutdown().await;
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key.to_string()).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_cache_miss() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, _handle) = Cache::new(client).await.unwrap();

        let key = CacheKey::candidate_search(998, "nonexistent", &TagSet::default(), 1);
        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, None);
    }
}
