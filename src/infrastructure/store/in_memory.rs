//! In-memory key/value store implementation

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockWriteGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::domain::store::{KeyValueStore, StoreOp};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
enum Entry {
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    expirations: HashMap<String, Instant>,
}

impl State {
    fn purge_if_expired(&mut self, key: &str) {
        let expired = self
            .expirations
            .get(key)
            .is_some_and(|deadline| Instant::now() >= *deadline);

        if expired {
            self.entries.remove(key);
            self.expirations.remove(key);
        }
    }

    fn get(&mut self, key: &str) -> Option<&Entry> {
        self.purge_if_expired(key);
        self.entries.get(key)
    }

    fn remove(&mut self, key: &str) -> bool {
        self.purge_if_expired(key);
        self.expirations.remove(key);
        self.entries.remove(key).is_some()
    }

    fn hash(&mut self, key: &str) -> Result<Option<&HashMap<String, String>>, DomainError> {
        match self.get(key) {
            Some(Entry::Hash(hash)) => Ok(Some(hash)),
            Some(Entry::Set(_)) => Err(wrong_type(key)),
            None => Ok(None),
        }
    }

    fn hash_mut(&mut self, key: &str) -> Result<&mut HashMap<String, String>, DomainError> {
        self.purge_if_expired(key);

        match self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(HashMap::new()))
        {
            Entry::Hash(hash) => Ok(hash),
            Entry::Set(_) => Err(wrong_type(key)),
        }
    }

    fn set(&mut self, key: &str) -> Result<Option<&HashSet<String>>, DomainError> {
        match self.get(key) {
            Some(Entry::Set(set)) => Ok(Some(set)),
            Some(Entry::Hash(_)) => Err(wrong_type(key)),
            None => Ok(None),
        }
    }

    fn set_mut(&mut self, key: &str) -> Result<&mut HashSet<String>, DomainError> {
        self.purge_if_expired(key);

        match self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(HashSet::new()))
        {
            Entry::Set(set) => Ok(set),
            Entry::Hash(_) => Err(wrong_type(key)),
        }
    }

    /// Empty hashes and sets do not exist, as in Redis
    fn drop_if_empty(&mut self, key: &str) {
        let empty = match self.entries.get(key) {
            Some(Entry::Hash(hash)) => hash.is_empty(),
            Some(Entry::Set(set)) => set.is_empty(),
            None => false,
        };

        if empty {
            self.entries.remove(key);
            self.expirations.remove(key);
        }
    }

    fn set_add(&mut self, key: &str, member: &str) -> Result<bool, DomainError> {
        Ok(self.set_mut(key)?.insert(member.to_string()))
    }

    fn set_remove(&mut self, key: &str, member: &str) -> Result<bool, DomainError> {
        let removed = if self.set(key)?.is_some() {
            self.set_mut(key)?.remove(member)
        } else {
            false
        };
        self.drop_if_empty(key);
        Ok(removed)
    }

    fn hash_set(&mut self, key: &str, field: &str, value: &str) -> Result<(), DomainError> {
        self.hash_mut(key)?
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn hash_delete(&mut self, key: &str, field: &str) -> Result<bool, DomainError> {
        let removed = if self.hash(key)?.is_some() {
            self.hash_mut(key)?.remove(field).is_some()
        } else {
            false
        };
        self.drop_if_empty(key);
        Ok(removed)
    }

    fn apply(&mut self, op: &StoreOp) -> Result<(), DomainError> {
        match op {
            StoreOp::SetAdd { key, member } => self.set_add(key, member).map(|_| ()),
            StoreOp::SetRemove { key, member } => self.set_remove(key, member).map(|_| ()),
            StoreOp::HashSet { key, field, value } => self.hash_set(key, field, value),
            StoreOp::HashDelete { key, field } => self.hash_delete(key, field).map(|_| ()),
        }
    }

    /// Whether `op` would fail against the current state
    fn check(&mut self, op: &StoreOp) -> Result<(), DomainError> {
        match op {
            StoreOp::SetAdd { key, .. } | StoreOp::SetRemove { key, .. } => {
                self.set(key).map(|_| ())
            }
            StoreOp::HashSet { key, .. } | StoreOp::HashDelete { key, .. } => {
                self.hash(key).map(|_| ())
            }
        }
    }
}

fn wrong_type(key: &str) -> DomainError {
    DomainError::store(format!(
        "WRONGTYPE Operation against key '{}' holding the wrong kind of value",
        key
    ))
}

/// Process-local store with Redis-like hash and set semantics
///
/// A single lock guards all keys, so increments and transactions are atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, DomainError> {
        self.state
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))
    }

    /// Number of live keys
    pub fn len(&self) -> Result<usize, DomainError> {
        let mut state = self.write()?;
        let keys: Vec<String> = state.entries.keys().cloned().collect();

        for key in &keys {
            state.purge_if_expired(key);
        }

        Ok(state.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.write()?.get(key).is_some())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.write()?.remove(key))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError> {
        let mut state = self.write()?;

        if state.get(key).is_none() {
            return Ok(false);
        }

        state
            .expirations
            .insert(key.to_string(), Instant::now() + ttl);
        Ok(true)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, DomainError> {
        self.write()?.set_add(key, member)
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, DomainError> {
        self.write()?.set_remove(key, member)
    }

    async fn set_members(&self, key: &str) -> Result<HashSet<String>, DomainError> {
        Ok(self.write()?.set(key)?.cloned().unwrap_or_default())
    }

    async fn set_cardinality(&self, key: &str) -> Result<usize, DomainError> {
        Ok(self.write()?.set(key)?.map_or(0, HashSet::len))
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, DomainError> {
        Ok(self
            .write()?
            .hash(key)?
            .and_then(|hash| hash.get(field).cloned()))
    }

    async fn hash_get_many(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<Vec<Option<String>>, DomainError> {
        let mut state = self.write()?;
        let hash = state.hash(key)?;

        Ok(fields
            .iter()
            .map(|field| hash.and_then(|h| h.get(field).cloned()))
            .collect())
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), DomainError> {
        self.write()?.hash_set(key, field, value)
    }

    async fn hash_increment_by(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, DomainError> {
        let mut state = self.write()?;
        let hash = state.hash_mut(key)?;

        let current = match hash.get(field) {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                DomainError::store(format!(
                    "Hash field '{}' of '{}' is not an integer",
                    field, key
                ))
            })?,
            None => 0,
        };

        let updated = current
            .checked_add(delta)
            .ok_or_else(|| DomainError::store("Increment or decrement would overflow"))?;
        hash.insert(field.to_string(), updated.to_string());

        Ok(updated)
    }

    async fn hash_delete(&self, key: &str, field: &str) -> Result<bool, DomainError> {
        self.write()?.hash_delete(key, field)
    }

    async fn transaction(&self, ops: Vec<StoreOp>) -> Result<(), DomainError> {
        let mut state = self.write()?;

        // Validate everything before touching state so a failed batch leaves no trace
        for op in &ops {
            state.check(op)?;
        }

        for op in &ops {
            state.apply(op)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sets() {
        let store = InMemoryStore::new();

        assert!(store.set_add("s", "a").await.unwrap());
        assert!(!store.set_add("s", "a").await.unwrap());
        assert!(store.set_add("s", "b").await.unwrap());
        assert_eq!(store.set_cardinality("s").await.unwrap(), 2);

        assert!(store.set_remove("s", "a").await.unwrap());
        assert!(!store.set_remove("s", "missing").await.unwrap());
        assert_eq!(
            store.set_members("s").await.unwrap(),
            HashSet::from(["b".to_string()])
        );
    }

    #[tokio::test]
    async fn test_missing_keys_read_as_empty() {
        let store = InMemoryStore::new();

        assert!(!store.exists("nothing").await.unwrap());
        assert!(store.set_members("nothing").await.unwrap().is_empty());
        assert_eq!(store.set_cardinality("nothing").await.unwrap(), 0);
        assert_eq!(store.hash_get("nothing", "f").await.unwrap(), None);
        assert!(!store.delete("nothing").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_collections_do_not_exist() {
        let store = InMemoryStore::new();

        store.set_add("s", "a").await.unwrap();
        store.set_remove("s", "a").await.unwrap();
        assert!(!store.exists("s").await.unwrap());

        store.hash_set("h", "f", "v").await.unwrap();
        assert!(store.exists("h").await.unwrap());
        assert!(store.hash_delete("h", "f").await.unwrap());
        assert!(!store.exists("h").await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_increment() {
        let store = InMemoryStore::new();

        assert_eq!(store.hash_increment_by("h", "n", 5).await.unwrap(), 5);
        assert_eq!(store.hash_increment_by("h", "n", 3).await.unwrap(), 8);
        assert_eq!(store.hash_get("h", "n").await.unwrap(), Some("8".to_string()));

        store.hash_set("h", "text", "abc").await.unwrap();
        assert!(store.hash_increment_by("h", "text", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();

        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    store.hash_increment_by("h", "arm:plays", 1).await.unwrap();
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(
            store.hash_get("h", "arm:plays").await.unwrap(),
            Some("800".to_string())
        );
    }

    #[tokio::test]
    async fn test_hash_get_many() {
        let store = InMemoryStore::new();
        store.hash_set("h", "a", "1").await.unwrap();

        let values = store
            .hash_get_many("h", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(values, vec![Some("1".to_string()), None]);
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let store = InMemoryStore::new();
        store.set_add("s", "a").await.unwrap();

        let err = store.hash_get("s", "f").await.unwrap_err();
        assert!(err.to_string().contains("WRONGTYPE"));
    }

    #[tokio::test]
    async fn test_transaction_applies_all() {
        let store = InMemoryStore::new();
        store.set_add("active", "ex").await.unwrap();

        store
            .transaction(vec![
                StoreOp::set_remove("active", "ex"),
                StoreOp::set_add("archived", "ex"),
                StoreOp::hash_set("meta", "k", "v"),
            ])
            .await
            .unwrap();

        assert_eq!(store.set_cardinality("active").await.unwrap(), 0);
        assert_eq!(store.set_cardinality("archived").await.unwrap(), 1);
        assert_eq!(store.hash_get("meta", "k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_failed_transaction_leaves_no_trace() {
        let store = InMemoryStore::new();
        store.hash_set("h", "f", "v").await.unwrap();

        let result = store
            .transaction(vec![
                StoreOp::set_add("active", "ex"),
                StoreOp::set_add("h", "oops"),
            ])
            .await;

        assert!(result.is_err());
        assert!(!store.exists("active").await.unwrap());
    }

    #[tokio::test]
    async fn test_expire() {
        let store = InMemoryStore::new();
        assert!(!store.expire("missing", Duration::from_secs(1)).await.unwrap());

        store.hash_set("session", "k", "v").await.unwrap();
        assert!(store.expire("session", Duration::ZERO).await.unwrap());
        assert!(!store.exists("session").await.unwrap());
        assert!(store.is_empty().unwrap());
    }
}
