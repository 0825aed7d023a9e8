//! Session values stored as one hash per session

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::SessionSettings;
use crate::domain::session::{SessionId, SessionStore};
use crate::domain::store::KeyValueStore;
use crate::domain::DomainError;

/// Store key of a session hash: `session:<salted hash>:v4`
pub fn session_key(session_id: &SessionId, salt: &str) -> String {
    format!("session:{}:v4", session_id.hashed(salt))
}

/// `SessionStore` bound to one session, persisted in the key/value store
///
/// The raw session ID never reaches the store; only its salted hash does.
/// When a TTL is configured, every read and write pushes the expiry forward.
#[derive(Debug, Clone)]
pub struct KvSessionStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    ttl: Option<Duration>,
}

impl KvSessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, session_id: &SessionId, salt: &str) -> Self {
        Self {
            store,
            key: session_key(session_id, salt),
            ttl: None,
        }
    }

    /// Build a store from session settings
    pub fn from_settings(
        store: Arc<dyn KeyValueStore>,
        session_id: &SessionId,
        settings: &SessionSettings,
    ) -> Self {
        Self::new(store, session_id, &settings.salt).with_ttl(settings.ttl())
    }

    /// Set the inactivity expiry
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Hash key holding this session's values
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Drop the whole session
    pub async fn clear_all(&self) -> Result<(), DomainError> {
        self.store.delete(&self.key).await?;
        debug!(session = %self.key, "Session cleared");
        Ok(())
    }

    async fn touch(&self) -> Result<(), DomainError> {
        if let Some(ttl) = self.ttl {
            self.store.expire(&self.key, ttl).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl SessionStore for KvSessionStore {
    async fn get_value(&self, key: &str) -> Result<Option<String>, DomainError> {
        let value = self.store.hash_get(&self.key, key).await?;
        self.touch().await?;
        Ok(value)
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.store.hash_set(&self.key, key, value).await?;
        self.touch().await
    }

    async fn clear_value(&self, key: &str) -> Result<(), DomainError> {
        self.store.hash_delete(&self.key, key).await?;
        self.touch().await
    }
}
