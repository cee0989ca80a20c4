use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::error::{CatalogError, CatalogResult};

/// String cache used for search result pages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    async fn get(&self, key: &str) -> CatalogResult<Option<String>>;

    /// Store `value` under `key` with a TTL. Returns whether the value was
    /// stored.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> CatalogResult<bool>;

    /// Remove `key`. Returns whether a value was present.
    async fn del(&self, key: &str) -> CatalogResult<bool>;
}

/// Redis-backed cache. Every operation is bounded by a short timeout so a
/// slow Redis never stalls a search request.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
    op_timeout: Duration,
}

impl RedisCache {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            manager,
            op_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_timeout(manager: ConnectionManager, op_timeout: Duration) -> Self {
        Self {
            manager,
            op_timeout,
        }
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> CatalogResult<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = timeout(self.op_timeout, conn.get(key))
            .await
            .map_err(|_| CatalogError::Timeout(format!("redis GET {key}")))??;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> CatalogResult<bool> {
        let mut conn = self.manager.clone();
        timeout(self.op_timeout, conn.set_ex::<_, _, ()>(key, value, ttl_seconds))
            .await
            .map_err(|_| CatalogError::Timeout(format!("redis SETEX {key}")))??;
        Ok(true)
    }

    async fn del(&self, key: &str) -> CatalogResult<bool> {
        let mut conn = self.manager.clone();
        let removed: i64 = timeout(self.op_timeout, conn.del(key))
            .await
            .map_err(|_| CatalogError::Timeout(format!("redis DEL {key}")))??;
        Ok(removed > 0)
    }
}

/// In-memory cache for tests. TTLs are accepted but not enforced.
#[derive(Default, Clone)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheService for InMemoryCache {
    async fn get(&self, key: &str) -> CatalogResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl_seconds: u64) -> CatalogResult<bool> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn del(&self, key: &str) -> CatalogResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}
