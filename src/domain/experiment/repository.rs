//! Experiment store trait

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::Debug;

use super::entity::{ChoiceCounts, ExperimentMetadata, ExperimentName};
use crate::domain::DomainError;

/// Typed experiment operations over the shared key/value store
///
/// Implementations hold no experiment state of their own: every call reads
/// from or writes to the store.
#[async_trait]
pub trait ExperimentStore: Send + Sync + Debug {
    /// Check if an experiment exists (active or archived)
    async fn exists(&self, name: &ExperimentName) -> Result<bool, DomainError>;

    /// Create an experiment and add it to the active listing
    ///
    /// Fails with `AlreadyExists` if the experiment exists.
    async fn add(
        &self,
        name: &ExperimentName,
        metadata: &ExperimentMetadata,
    ) -> Result<(), DomainError>;

    /// Move an experiment from the active to the archived listing
    ///
    /// Fails with `DoesNotExist` if the experiment was never created.
    async fn archive(&self, name: &ExperimentName) -> Result<(), DomainError>;

    /// Move an experiment from the archived back to the active listing
    async fn unarchive(&self, name: &ExperimentName) -> Result<(), DomainError>;

    /// Get the creation metadata
    async fn get_metadata(
        &self,
        name: &ExperimentName,
    ) -> Result<Option<ExperimentMetadata>, DomainError>;

    /// Get the ordered choice list (empty if unset)
    async fn get_choices(&self, name: &ExperimentName) -> Result<Vec<String>, DomainError>;

    /// Append a choice
    ///
    /// Fails with `InvalidName` or `DuplicateChoice`.
    async fn add_choice(&self, name: &ExperimentName, choice: &str) -> Result<(), DomainError>;

    /// Remove a choice
    ///
    /// Fails with `InvalidName` or `ChoiceNotFound`. Counters are left in place.
    async fn remove_choice(&self, name: &ExperimentName, choice: &str)
    -> Result<(), DomainError>;

    /// Play count for a choice (0 if unset)
    async fn get_play_count(&self, name: &ExperimentName, choice: &str)
    -> Result<u64, DomainError>;

    /// Atomically add `by` plays, returning the new count
    async fn increment_play_count(
        &self,
        name: &ExperimentName,
        choice: &str,
        by: u64,
    ) -> Result<u64, DomainError>;

    /// Reward count for a choice (0 if unset)
    async fn get_reward_count(
        &self,
        name: &ExperimentName,
        choice: &str,
    ) -> Result<u64, DomainError>;

    /// Atomically add `by` rewards, returning the new count
    async fn increment_reward_count(
        &self,
        name: &ExperimentName,
        choice: &str,
        by: u64,
    ) -> Result<u64, DomainError>;

    /// Play and reward counts for several choices, in the given order
    async fn get_counts(
        &self,
        name: &ExperimentName,
        choices: &[String],
    ) -> Result<Vec<ChoiceCounts>, DomainError> {
        let mut counts = Vec::with_capacity(choices.len());

        for choice in choices {
            counts.push(ChoiceCounts::new(
                self.get_play_count(name, choice).await?,
                self.get_reward_count(name, choice).await?,
            ));
        }

        Ok(counts)
    }

    /// Get the persisted default choice
    async fn get_default_choice(
        &self,
        name: &ExperimentName,
    ) -> Result<Option<String>, DomainError>;

    /// Persist the default choice
    async fn set_default_choice(
        &self,
        name: &ExperimentName,
        choice: &str,
    ) -> Result<(), DomainError>;

    /// Names in the active (or archived) listing
    async fn list_experiments(&self, active: bool)
    -> Result<BTreeSet<ExperimentName>, DomainError>;
}
