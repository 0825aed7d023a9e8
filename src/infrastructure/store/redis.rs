//! Redis key/value store implementation

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::store::{KeyValueStore, StoreOp};
use crate::domain::DomainError;

/// Configuration for the Redis store
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisStoreConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Redis-backed store
///
/// Features:
/// - Atomic HINCRBY for counters
/// - MULTI/EXEC pipelines for transactions
/// - Connection reuse via ConnectionManager
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    config: RedisStoreConfig,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisStore {
    /// Opens a Redis connection
    pub async fn new(config: RedisStoreConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::store(format!("Failed to create Redis client: {}", e)))?;

        let connection = tokio::time::timeout(
            config.connection_timeout,
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| {
            DomainError::store(format!(
                "Timed out connecting to Redis after {:?}",
                config.connection_timeout
            ))
        })?
        .map_err(|e| DomainError::store(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let exists: bool = conn.exists(self.prefix_key(key)).await.map_err(|e| {
            DomainError::store(format!("Failed to check existence of key '{}': {}", key, e))
        })?;

        Ok(exists)
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let deleted: i32 = conn.del(self.prefix_key(key)).await.map_err(|e| {
            DomainError::store(format!("Failed to delete key '{}': {}", key, e))
        })?;

        Ok(deleted > 0)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();
        let ttl_secs = ttl.as_secs().max(1) as i64;

        let updated: bool = conn
            .expire(self.prefix_key(key), ttl_secs)
            .await
            .map_err(|e| {
                DomainError::store(format!("Failed to update TTL for key '{}': {}", key, e))
            })?;

        Ok(updated)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let added: i32 = conn.sadd(self.prefix_key(key), member).await.map_err(|e| {
            DomainError::store(format!("Failed to add to set '{}': {}", key, e))
        })?;

        Ok(added > 0)
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let removed: i32 = conn.srem(self.prefix_key(key), member).await.map_err(|e| {
            DomainError::store(format!("Failed to remove from set '{}': {}", key, e))
        })?;

        Ok(removed > 0)
    }

    async fn set_members(&self, key: &str) -> Result<HashSet<String>, DomainError> {
        let mut conn = self.connection.clone();

        let members: HashSet<String> = conn.smembers(self.prefix_key(key)).await.map_err(|e| {
            DomainError::store(format!("Failed to read set '{}': {}", key, e))
        })?;

        Ok(members)
    }

    async fn set_cardinality(&self, key: &str) -> Result<usize, DomainError> {
        let mut conn = self.connection.clone();

        let count: usize = conn.scard(self.prefix_key(key)).await.map_err(|e| {
            DomainError::store(format!("Failed to count set '{}': {}", key, e))
        })?;

        Ok(count)
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.connection.clone();

        let value: Option<String> = conn.hget(self.prefix_key(key), field).await.map_err(|e| {
            DomainError::store(format!("Failed to get field '{}' of '{}': {}", field, key, e))
        })?;

        Ok(value)
    }

    async fn hash_get_many(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<Vec<Option<String>>, DomainError> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.connection.clone();

        let values: Vec<Option<String>> = redis::cmd("HMGET")
            .arg(self.prefix_key(key))
            .arg(fields)
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::store(format!("Failed to get fields of '{}': {}", key, e)))?;

        Ok(values)
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: () = conn
            .hset(self.prefix_key(key), field, value)
            .await
            .map_err(|e| {
                DomainError::store(format!("Failed to set field '{}' of '{}': {}", field, key, e))
            })?;

        Ok(())
    }

    async fn hash_increment_by(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, DomainError> {
        let mut conn = self.connection.clone();

        let new_value: i64 = conn
            .hincr(self.prefix_key(key), field, delta)
            .await
            .map_err(|e| {
                DomainError::store(format!(
                    "Failed to increment field '{}' of '{}': {}",
                    field, key, e
                ))
            })?;

        Ok(new_value)
    }

    async fn hash_delete(&self, key: &str, field: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let deleted: i32 = conn.hdel(self.prefix_key(key), field).await.map_err(|e| {
            DomainError::store(format!(
                "Failed to delete field '{}' of '{}': {}",
                field, key, e
            ))
        })?;

        Ok(deleted > 0)
    }

    async fn transaction(&self, ops: Vec<StoreOp>) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();

        for op in &ops {
            match op {
                StoreOp::SetAdd { key, member } => {
                    pipe.sadd(self.prefix_key(key), member).ignore();
                }
                StoreOp::SetRemove { key, member } => {
                    pipe.srem(self.prefix_key(key), member).ignore();
                }
                StoreOp::HashSet { key, field, value } => {
                    pipe.hset(self.prefix_key(key), field, value).ignore();
                }
                StoreOp::HashDelete { key, field } => {
                    pipe.hdel(self.prefix_key(key), field).ignore();
                }
            }
        }

        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(|e| DomainError::store(format!("Failed to execute transaction: {}", e)))?;

        Ok(())
    }
}
