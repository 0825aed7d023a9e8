//! Key/value store capability trait

use std::collections::HashSet;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// A single write queued inside a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    SetAdd { key: String, member: String },
    SetRemove { key: String, member: String },
    HashSet { key: String, field: String, value: String },
    HashDelete { key: String, field: String },
}

impl StoreOp {
    pub fn set_add(key: impl Into<String>, member: impl Into<String>) -> Self {
        Self::SetAdd {
            key: key.into(),
            member: member.into(),
        }
    }

    pub fn set_remove(key: impl Into<String>, member: impl Into<String>) -> Self {
        Self::SetRemove {
            key: key.into(),
            member: member.into(),
        }
    }

    pub fn hash_set(
        key: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::HashSet {
            key: key.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn hash_delete(key: impl Into<String>, field: impl Into<String>) -> Self {
        Self::HashDelete {
            key: key.into(),
            field: field.into(),
        }
    }
}

/// Shared key/value store with hashes, sets and atomic transactions
///
/// This is the system of record for experiments and sessions. Every
/// implementation must apply `hash_increment_by` atomically and must apply a
/// `transaction` batch as a single unit.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Checks whether a key exists
    async fn exists(&self, key: &str) -> Result<bool, DomainError>;

    /// Deletes a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Sets a key to expire after the given duration
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError>;

    /// Adds a member to a set, returning whether it was newly added
    async fn set_add(&self, key: &str, member: &str) -> Result<bool, DomainError>;

    /// Removes a member from a set, returning whether it was present
    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, DomainError>;

    /// Returns all members of a set (empty if the key is unset)
    async fn set_members(&self, key: &str) -> Result<HashSet<String>, DomainError>;

    /// Returns the number of members in a set
    async fn set_cardinality(&self, key: &str) -> Result<usize, DomainError>;

    /// Gets a hash field
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, DomainError>;

    /// Gets several hash fields in one round trip
    async fn hash_get_many(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<Vec<Option<String>>, DomainError> {
        let mut values = Vec::with_capacity(fields.len());

        for field in fields {
            values.push(self.hash_get(key, field).await?);
        }

        Ok(values)
    }

    /// Sets a hash field
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), DomainError>;

    /// Atomically increments an integer hash field, returning the new value
    async fn hash_increment_by(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, DomainError>;

    /// Deletes a hash field, returning whether it existed
    async fn hash_delete(&self, key: &str, field: &str) -> Result<bool, DomainError>;

    /// Applies a batch of writes atomically
    async fn transaction(&self, ops: Vec<StoreOp>) -> Result<(), DomainError>;
}
