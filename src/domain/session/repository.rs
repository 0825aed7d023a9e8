//! Session store trait

use async_trait::async_trait;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Per-session value storage supplied by the session layer
///
/// An instance is bound to a single session; keys are scoped to it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Gets a session value
    async fn get_value(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a session value
    async fn set_value(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Removes a session value
    async fn clear_value(&self, key: &str) -> Result<(), DomainError>;
}
