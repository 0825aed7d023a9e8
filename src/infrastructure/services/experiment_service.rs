//! Experiment service for bandit A/B testing
//!
//! Provides administrative operations over experiments and the ranked
//! results report.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::experiment::{
    ChoiceResult, ExperimentMetadata, ExperimentName, ExperimentResults, ExperimentStore,
};
use crate::domain::{DomainError, ExperimentError};
use crate::infrastructure::experiment::{chi_squared, is_confident, MAX_CONFIDENCE_CHOICES};

/// Service for managing bandit experiments
#[derive(Debug)]
pub struct ExperimentService<E: ExperimentStore> {
    store: Arc<E>,
    persist_default: bool,
}

impl<E: ExperimentStore> Clone for ExperimentService<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            persist_default: self.persist_default,
        }
    }
}

impl<E: ExperimentStore> ExperimentService<E> {
    /// Create a new experiment service
    pub fn new(store: Arc<E>) -> Self {
        Self {
            store,
            persist_default: true,
        }
    }

    /// Whether `results` writes the top-ranked choice back as default
    pub fn with_persist_default(mut self, persist_default: bool) -> Self {
        self.persist_default = persist_default;
        self
    }

    pub fn store(&self) -> &Arc<E> {
        &self.store
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Create an experiment with fresh metadata
    pub async fn add_experiment(&self, name: &str) -> Result<ExperimentName, DomainError> {
        let name = parse_name(name)?;
        self.store.add(&name, &ExperimentMetadata::now()).await?;
        Ok(name)
    }

    /// Archive an experiment, keeping its counters
    pub async fn archive_experiment(&self, name: &str) -> Result<(), DomainError> {
        let name = parse_name(name)?;
        self.store.archive(&name).await
    }

    pub async fn add_choice(&self, name: &str, choice: &str) -> Result<(), DomainError> {
        let name = parse_name(name)?;
        self.store.add_choice(&name, choice).await
    }

    pub async fn remove_choice(&self, name: &str, choice: &str) -> Result<(), DomainError> {
        let name = parse_name(name)?;
        self.store.remove_choice(&name, choice).await
    }

    pub async fn exists(&self, name: &str) -> Result<bool, DomainError> {
        let name = parse_name(name)?;
        self.store.exists(&name).await
    }

    /// Active or archived experiment names, sorted
    pub async fn list(&self, active: bool) -> Result<BTreeSet<ExperimentName>, DomainError> {
        self.store.list_experiments(active).await
    }

    pub async fn choices(&self, name: &str) -> Result<Vec<String>, DomainError> {
        let name = parse_name(name)?;
        self.store.get_choices(&name).await
    }

    // ========================================================================
    // Counters
    // ========================================================================

    pub async fn plays(&self, name: &str, choice: &str) -> Result<u64, DomainError> {
        let name = parse_name(name)?;
        self.store.get_play_count(&name, choice).await
    }

    pub async fn rewards(&self, name: &str, choice: &str) -> Result<u64, DomainError> {
        let name = parse_name(name)?;
        self.store.get_reward_count(&name, choice).await
    }

    /// Record one play of a choice
    pub async fn add_play(&self, name: &str, choice: &str) -> Result<u64, DomainError> {
        let name = parse_name(name)?;
        self.store.increment_play_count(&name, choice, 1).await
    }

    /// Record one reward of a choice
    pub async fn add_reward(&self, name: &str, choice: &str) -> Result<u64, DomainError> {
        let name = parse_name(name)?;
        self.store.increment_reward_count(&name, choice, 1).await
    }

    pub async fn default_choice(&self, name: &str) -> Result<Option<String>, DomainError> {
        let name = parse_name(name)?;
        self.store.get_default_choice(&name).await
    }

    pub async fn set_default_choice(&self, name: &str, choice: &str) -> Result<(), DomainError> {
        let name = parse_name(name)?;
        self.store.set_default_choice(&name, choice).await
    }

    // ========================================================================
    // Results
    // ========================================================================

    /// Rank an experiment's choices and test the spread for significance
    ///
    /// With persistence enabled, the top-ranked choice becomes the default.
    pub async fn results(&self, name: &str) -> Result<ExperimentResults, DomainError> {
        let name = parse_name(name)?;
        self.results_for(&name).await
    }

    /// Results for every active experiment, ordered by name
    pub async fn results_for_active(&self) -> Result<Vec<ExperimentResults>, DomainError> {
        let names = self.store.list_experiments(true).await?;
        let mut results = Vec::with_capacity(names.len());

        for name in &names {
            results.push(self.results_for(name).await?);
        }

        Ok(results)
    }

    async fn results_for(&self, name: &ExperimentName) -> Result<ExperimentResults, DomainError> {
        if !self.store.exists(name).await? {
            return Err(ExperimentError::does_not_exist(name.as_str()).into());
        }

        let metadata = self.store.get_metadata(name).await?;
        let choice_names = self.store.get_choices(name).await?;
        let counts = self.store.get_counts(name, &choice_names).await?;

        let mut choices: Vec<ChoiceResult> = choice_names
            .into_iter()
            .zip(counts)
            .map(|(choice, counts)| ChoiceResult::new(choice, counts))
            .collect();

        // Stable: ties keep choice-list order
        choices.sort_by(|a, b| b.performance.total_cmp(&a.performance));

        let default = choices.first().map(|c| c.name.clone());

        if let Some(best) = &default {
            if self.persist_default {
                self.store.set_default_choice(name, best).await?;
            }
        }

        let (chi_squared, confident) = significance(&choices);

        debug!(
            experiment = %name,
            choices = choices.len(),
            ?chi_squared,
            ?confident,
            "Computed experiment results"
        );

        Ok(ExperimentResults {
            name: name.to_string(),
            metadata,
            default,
            chi_squared,
            confident,
            choices,
        })
    }
}

fn significance(choices: &[ChoiceResult]) -> (Option<f64>, Option<bool>) {
    if choices.len() < 2 {
        return (None, Some(false));
    }

    let counts: Vec<_> = choices.iter().map(ChoiceResult::counts).collect();
    let csq = chi_squared(&counts);

    let confident = if choices.len() > MAX_CONFIDENCE_CHOICES {
        info!(choices = choices.len(), "Too many choices to report confidence");
        None
    } else {
        is_confident(csq, choices.len())
    };

    (Some(csq), confident)
}

fn parse_name(name: &str) -> Result<ExperimentName, DomainError> {
    Ok(ExperimentName::new(name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExperimentErrorKind;
    use crate::infrastructure::experiment::KvExperimentStore;
    use crate::infrastructure::store::InMemoryStore;

    fn create_service() -> ExperimentService<KvExperimentStore> {
        let store = KvExperimentStore::with_default_keys(Arc::new(InMemoryStore::new()));
        ExperimentService::new(Arc::new(store))
    }

    fn round3(x: f64) -> f64 {
        (x * 1000.0).round() / 1000.0
    }

    async fn seed(
        service: &ExperimentService<KvExperimentStore>,
        name: &str,
        arms: &[(&str, u64, u64)],
    ) {
        service.add_experiment(name).await.unwrap();

        for (arm, plays, rewards) in arms {
            service.add_choice(name, arm).await.unwrap();
            let experiment = ExperimentName::new(name).unwrap();
            service
                .store()
                .increment_play_count(&experiment, arm, *plays)
                .await
                .unwrap();
            service
                .store()
                .increment_reward_count(&experiment, arm, *rewards)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_add_experiment() {
        let service = create_service();

        service.add_experiment("ex-data").await.unwrap();
        assert!(service.exists("ex-data").await.unwrap());

        let err = service.add_experiment("ex-data").await.unwrap_err();
        assert_eq!(err.experiment_kind(), Some(ExperimentErrorKind::AlreadyExists));
    }

    #[tokio::test]
    async fn test_illegal_names() {
        let service = create_service();

        let err = service.add_experiment("has space").await.unwrap_err();
        assert_eq!(err.experiment_kind(), Some(ExperimentErrorKind::InvalidName));

        service.add_experiment("ok").await.unwrap();
        let err = service.add_choice("ok", "bad/choice").await.unwrap_err();
        assert_eq!(err.experiment_kind(), Some(ExperimentErrorKind::InvalidName));
    }

    #[tokio::test]
    async fn test_choices_round_trip() {
        let service = create_service();
        service.add_experiment("ex").await.unwrap();

        service.add_choice("ex", "A").await.unwrap();
        service.add_choice("ex", "B").await.unwrap();
        assert_eq!(service.choices("ex").await.unwrap(), vec!["A", "B"]);

        service.remove_choice("ex", "B").await.unwrap();
        assert_eq!(service.choices("ex").await.unwrap(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_edits_require_existing_experiment() {
        let service = create_service();

        let err = service.add_choice("typo", "A").await.unwrap_err();
        assert_eq!(err.experiment_kind(), Some(ExperimentErrorKind::DoesNotExist));
        let err = service.remove_choice("typo", "A").await.unwrap_err();
        assert_eq!(err.experiment_kind(), Some(ExperimentErrorKind::DoesNotExist));
        let err = service.add_reward("typo", "A").await.unwrap_err();
        assert_eq!(err.experiment_kind(), Some(ExperimentErrorKind::DoesNotExist));

        assert!(!service.exists("typo").await.unwrap());
        service.add_experiment("typo").await.unwrap();
        let active = service.list(true).await.unwrap();
        assert!(active.contains(&ExperimentName::new("typo").unwrap()));
    }

    #[tokio::test]
    async fn test_counters() {
        let service = create_service();
        service.add_experiment("ex").await.unwrap();

        assert_eq!(service.plays("ex", "foo").await.unwrap(), 0);
        assert_eq!(service.rewards("ex", "foo").await.unwrap(), 0);

        service.add_play("ex", "foo").await.unwrap();
        service.add_reward("ex", "foo").await.unwrap();

        assert_eq!(service.plays("ex", "foo").await.unwrap(), 1);
        assert_eq!(service.rewards("ex", "foo").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_results() {
        let service = create_service();
        seed(&service, "ex-results", &[("arm1", 17, 3), ("arm2", 19, 2)]).await;

        let results = service.results("ex-results").await.unwrap();

        assert_eq!(results.name, "ex-results");
        assert!(results.metadata.is_some());
        assert_eq!(results.default.as_deref(), Some("arm1"));
        assert_eq!(round3(results.chi_squared.unwrap()), 0.380);
        assert_eq!(results.confident, Some(false));
        assert_eq!(results.choices[0].name, "arm1");
        assert_eq!(round3(results.choices[0].performance), 0.176);
        assert_eq!(results.choices[1].name, "arm2");
        assert_eq!(round3(results.choices[1].performance), 0.105);

        assert_eq!(
            service.default_choice("ex-results").await.unwrap(),
            Some("arm1".to_string())
        );
    }

    #[tokio::test]
    async fn test_results_sorted_by_performance() {
        let service = create_service();
        seed(
            &service,
            "ex-sorted",
            &[("low", 10, 1), ("high", 10, 5), ("mid", 10, 3)],
        )
        .await;

        let results = service.results("ex-sorted").await.unwrap();
        let order: Vec<&str> = results.choices.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn test_results_ties_keep_choice_order() {
        let service = create_service();
        seed(&service, "ex-ties", &[("b", 0, 0), ("a", 0, 0), ("c", 0, 0)]).await;

        let results = service.results("ex-ties").await.unwrap();
        let order: Vec<&str> = results.choices.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(results.default.as_deref(), Some("b"));
        assert_eq!(results.chi_squared, Some(0.0));
    }

    #[tokio::test]
    async fn test_results_single_choice() {
        let service = create_service();
        seed(&service, "ex-single", &[("only", 5, 1)]).await;

        let results = service.results("ex-single").await.unwrap();
        assert_eq!(results.default.as_deref(), Some("only"));
        assert_eq!(results.chi_squared, None);
        assert_eq!(results.confident, Some(false));
    }

    #[tokio::test]
    async fn test_results_no_choices() {
        let service = create_service();
        service.add_experiment("ex-empty").await.unwrap();

        let results = service.results("ex-empty").await.unwrap();
        assert_eq!(results.default, None);
        assert!(results.choices.is_empty());
        assert_eq!(results.chi_squared, None);
        assert_eq!(results.confident, Some(false));
        assert_eq!(service.default_choice("ex-empty").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_results_too_many_choices() {
        let service = create_service();
        let arms: Vec<String> = (0..12).map(|i| format!("arm{}", i)).collect();
        let seeded: Vec<(&str, u64, u64)> = arms.iter().map(|a| (a.as_str(), 10, 1)).collect();
        seed(&service, "ex-wide", &seeded).await;

        let results = service.results("ex-wide").await.unwrap();
        assert_eq!(results.choices.len(), 12);
        assert!(results.chi_squared.is_some());
        assert_eq!(results.confident, None);
    }

    #[tokio::test]
    async fn test_results_missing_experiment() {
        let service = create_service();
        let err = service.results("ghost").await.unwrap_err();
        assert_eq!(err.experiment_kind(), Some(ExperimentErrorKind::DoesNotExist));
    }

    #[tokio::test]
    async fn test_results_without_persisting_default() {
        let store = KvExperimentStore::with_default_keys(Arc::new(InMemoryStore::new()));
        let service = ExperimentService::new(Arc::new(store)).with_persist_default(false);
        seed(&service, "ex-readonly", &[("a", 10, 1), ("b", 10, 2)]).await;

        let results = service.results("ex-readonly").await.unwrap();
        assert_eq!(results.default.as_deref(), Some("b"));
        assert_eq!(service.default_choice("ex-readonly").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_results_for_active() {
        let service = create_service();
        seed(&service, "zeta", &[("a", 1, 0)]).await;
        seed(&service, "alpha", &[("a", 1, 1)]).await;
        seed(&service, "gone", &[("a", 1, 1)]).await;
        service.archive_experiment("gone").await.unwrap();

        let results = service.results_for_active().await.unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_list() {
        let service = create_service();
        service.add_experiment("a").await.unwrap();
        service.add_experiment("b").await.unwrap();
        service.archive_experiment("a").await.unwrap();

        let active = service.list(true).await.unwrap();
        let archived = service.list(false).await.unwrap();
        assert_eq!(active.len(), 1);
        assert!(active.contains(&ExperimentName::new("b").unwrap()));
        assert_eq!(archived.len(), 1);
        assert!(archived.contains(&ExperimentName::new("a").unwrap()));
    }
}
