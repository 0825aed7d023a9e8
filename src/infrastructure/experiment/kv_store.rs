//! Experiment store backed by the key/value capability

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::experiment::{
    plays_field, rewards_field, validate_choice_name, BanditKeys, ChoiceCounts,
    ExperimentMetadata, ExperimentName, ExperimentStore, CHOICES_FIELD, DEFAULT_CHOICE_FIELD,
    METADATA_FIELD,
};
use crate::domain::store::{KeyValueStore, StoreOp};
use crate::domain::{DomainError, ExperimentError};

/// `ExperimentStore` that maps every operation onto hash and set primitives
///
/// Layout per experiment: one hash at `bandit:experiment:<name>:<version>` with
/// fields `metadata`, `choices` (JSON array), `default-choice`,
/// `<choice>:plays` and `<choice>:rewards`. Listings are two sets.
#[derive(Debug, Clone)]
pub struct KvExperimentStore {
    store: Arc<dyn KeyValueStore>,
    keys: BanditKeys,
}

impl KvExperimentStore {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: BanditKeys) -> Self {
        Self { store, keys }
    }

    /// Store using the default key version
    pub fn with_default_keys(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, BanditKeys::default())
    }

    pub fn keys(&self) -> &BanditKeys {
        &self.keys
    }

    /// The underlying key/value store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Writes to a missing experiment would leave a hash outside both listings
    async fn ensure_exists(&self, name: &ExperimentName) -> Result<(), DomainError> {
        if self.exists(name).await? {
            Ok(())
        } else {
            Err(ExperimentError::does_not_exist(name.as_str()).into())
        }
    }

    async fn write_choices(
        &self,
        name: &ExperimentName,
        choices: &[String],
    ) -> Result<(), DomainError> {
        let encoded = serde_json::to_string(choices)?;
        self.store
            .hash_set(&self.keys.experiment(name), CHOICES_FIELD, &encoded)
            .await
    }

    async fn read_counter(&self, name: &ExperimentName, field: &str) -> Result<u64, DomainError> {
        let raw = self.store.hash_get(&self.keys.experiment(name), field).await?;
        parse_counter(name, field, raw.as_deref())
    }

    async fn increment_counter(
        &self,
        name: &ExperimentName,
        field: &str,
        by: u64,
    ) -> Result<u64, DomainError> {
        let delta = i64::try_from(by)
            .map_err(|_| DomainError::internal(format!("Increment {} is too large", by)))?;
        self.ensure_exists(name).await?;

        let updated = self
            .store
            .hash_increment_by(&self.keys.experiment(name), field, delta)
            .await?;

        Ok(updated.max(0) as u64)
    }
}

fn parse_counter(
    name: &ExperimentName,
    field: &str,
    raw: Option<&str>,
) -> Result<u64, DomainError> {
    match raw {
        None => Ok(0),
        Some(value) => value.parse::<u64>().map_err(|_| {
            DomainError::serialization(format!(
                "Counter '{}' of experiment '{}' is not a non-negative integer: {}",
                field, name, value
            ))
        }),
    }
}

#[async_trait]
impl ExperimentStore for KvExperimentStore {
    async fn exists(&self, name: &ExperimentName) -> Result<bool, DomainError> {
        self.store.exists(&self.keys.experiment(name)).await
    }

    async fn add(
        &self,
        name: &ExperimentName,
        metadata: &ExperimentMetadata,
    ) -> Result<(), DomainError> {
        if self.exists(name).await? {
            return Err(ExperimentError::already_exists(name.as_str()).into());
        }

        let encoded = serde_json::to_string(metadata)?;

        self.store
            .transaction(vec![
                StoreOp::set_add(self.keys.active_listing(), name.as_str()),
                StoreOp::hash_set(self.keys.experiment(name), METADATA_FIELD, encoded),
            ])
            .await?;

        info!(experiment = %name, "Experiment created");
        Ok(())
    }

    async fn archive(&self, name: &ExperimentName) -> Result<(), DomainError> {
        if !self.exists(name).await? {
            return Err(ExperimentError::does_not_exist(name.as_str()).into());
        }

        self.store
            .transaction(vec![
                StoreOp::set_remove(self.keys.active_listing(), name.as_str()),
                StoreOp::set_add(self.keys.archived_listing(), name.as_str()),
            ])
            .await?;

        info!(experiment = %name, "Experiment archived");
        Ok(())
    }

    async fn unarchive(&self, name: &ExperimentName) -> Result<(), DomainError> {
        self.store
            .transaction(vec![
                StoreOp::set_add(self.keys.active_listing(), name.as_str()),
                StoreOp::set_remove(self.keys.archived_listing(), name.as_str()),
            ])
            .await?;

        info!(experiment = %name, "Experiment de-archived");
        Ok(())
    }

    async fn get_metadata(
        &self,
        name: &ExperimentName,
    ) -> Result<Option<ExperimentMetadata>, DomainError> {
        let raw = self
            .store
            .hash_get(&self.keys.experiment(name), METADATA_FIELD)
            .await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn get_choices(&self, name: &ExperimentName) -> Result<Vec<String>, DomainError> {
        let raw = self
            .store
            .hash_get(&self.keys.experiment(name), CHOICES_FIELD)
            .await?;

        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn add_choice(&self, name: &ExperimentName, choice: &str) -> Result<(), DomainError> {
        validate_choice_name(name.as_str(), choice)?;
        self.ensure_exists(name).await?;

        let mut choices = self.get_choices(name).await?;

        if choices.iter().any(|c| c == choice) {
            return Err(ExperimentError::duplicate_choice(name.as_str(), choice).into());
        }

        choices.push(choice.to_string());
        self.write_choices(name, &choices).await?;

        info!(experiment = %name, choice = %choice, "Choice added");
        Ok(())
    }

    async fn remove_choice(
        &self,
        name: &ExperimentName,
        choice: &str,
    ) -> Result<(), DomainError> {
        validate_choice_name(name.as_str(), choice)?;
        self.ensure_exists(name).await?;

        let mut choices = self.get_choices(name).await?;
        let position = choices
            .iter()
            .position(|c| c == choice)
            .ok_or_else(|| ExperimentError::choice_not_found(name.as_str(), choice))?;

        choices.remove(position);
        self.write_choices(name, &choices).await?;

        info!(experiment = %name, choice = %choice, "Choice removed");
        Ok(())
    }

    async fn get_play_count(
        &self,
        name: &ExperimentName,
        choice: &str,
    ) -> Result<u64, DomainError> {
        self.read_counter(name, &plays_field(choice)).await
    }

    async fn increment_play_count(
        &self,
        name: &ExperimentName,
        choice: &str,
        by: u64,
    ) -> Result<u64, DomainError> {
        let plays = self.increment_counter(name, &plays_field(choice), by).await?;
        debug!(experiment = %name, choice = %choice, plays, "Play recorded");
        Ok(plays)
    }

    async fn get_reward_count(
        &self,
        name: &ExperimentName,
        choice: &str,
    ) -> Result<u64, DomainError> {
        self.read_counter(name, &rewards_field(choice)).await
    }

    async fn increment_reward_count(
        &self,
        name: &ExperimentName,
        choice: &str,
        by: u64,
    ) -> Result<u64, DomainError> {
        let rewards = self
            .increment_counter(name, &rewards_field(choice), by)
            .await?;
        debug!(experiment = %name, choice = %choice, rewards, "Reward recorded");
        Ok(rewards)
    }

    async fn get_counts(
        &self,
        name: &ExperimentName,
        choices: &[String],
    ) -> Result<Vec<ChoiceCounts>, DomainError> {
        let fields: Vec<String> = choices
            .iter()
            .flat_map(|choice| [plays_field(choice), rewards_field(choice)])
            .collect();

        let values = self
            .store
            .hash_get_many(&self.keys.experiment(name), &fields)
            .await?;

        if values.len() != fields.len() {
            return Err(DomainError::store(format!(
                "Expected {} counter values for experiment '{}', got {}",
                fields.len(),
                name,
                values.len()
            )));
        }

        fields
            .chunks(2)
            .zip(values.chunks(2))
            .map(|(names, raw)| {
                Ok(ChoiceCounts::new(
                    parse_counter(name, &names[0], raw[0].as_deref())?,
                    parse_counter(name, &names[1], raw[1].as_deref())?,
                ))
            })
            .collect()
    }

    async fn get_default_choice(
        &self,
        name: &ExperimentName,
    ) -> Result<Option<String>, DomainError> {
        self.store
            .hash_get(&self.keys.experiment(name), DEFAULT_CHOICE_FIELD)
            .await
    }

    async fn set_default_choice(
        &self,
        name: &ExperimentName,
        choice: &str,
    ) -> Result<(), DomainError> {
        self.ensure_exists(name).await?;
        self.store
            .hash_set(&self.keys.experiment(name), DEFAULT_CHOICE_FIELD, choice)
            .await
    }

    async fn list_experiments(
        &self,
        active: bool,
    ) -> Result<BTreeSet<ExperimentName>, DomainError> {
        let members = self.store.set_members(&self.keys.listing(active)).await?;
        let mut names = BTreeSet::new();

        for member in members {
            match ExperimentName::new(member.as_str()) {
                Ok(name) => {
                    names.insert(name);
                }
                Err(e) => warn!(member = %member, error = %e, "Skipping malformed listing entry"),
            }
        }

        Ok(names)
    }
}
