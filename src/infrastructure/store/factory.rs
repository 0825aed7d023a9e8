//! Store factory for runtime backend selection

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::StoreSettings;
use crate::domain::store::KeyValueStore;
use crate::domain::DomainError;

use super::in_memory::InMemoryStore;
use super::redis::{RedisStore, RedisStoreConfig};

/// Supported store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreType {
    /// Process-local store, useful for tests and dry runs
    InMemory,
    /// Shared Redis instance
    #[default]
    Redis,
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::InMemory => write!(f, "in_memory"),
            StoreType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for StoreType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(StoreType::InMemory),
            "redis" => Ok(StoreType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown store type: {}. Valid types: in_memory, redis",
                s
            ))),
        }
    }
}

/// Factory for creating key/value stores from configuration
#[derive(Debug)]
pub struct StoreFactory;

impl StoreFactory {
    /// Creates the store selected by the settings
    pub async fn create(settings: &StoreSettings) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        let store_type: StoreType = settings.backend.parse()?;
        info!(backend = %store_type, "Creating key/value store");

        match store_type {
            StoreType::InMemory => Ok(Arc::new(InMemoryStore::new())),
            StoreType::Redis => {
                let mut config = RedisStoreConfig::new(&settings.url).with_connection_timeout(
                    Duration::from_secs(settings.connection_timeout_secs),
                );

                if let Some(prefix) = &settings.key_prefix {
                    config = config.with_key_prefix(prefix);
                }

                Ok(Arc::new(RedisStore::new(config).await?))
            }
        }
    }

    /// Creates a fresh in-memory store
    pub fn in_memory() -> Arc<dyn KeyValueStore> {
        Arc::new(InMemoryStore::new())
    }
}
