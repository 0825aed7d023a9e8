//! Bandit Engine
//!
//! Multi-armed bandit A/B testing over a shared key/value store:
//! - Experiment administration with play and reward counters
//! - Ranked results with chi-squared significance
//! - Reconciliation of live experiments against a declarative spec
//! - Epsilon-greedy variant selection for sessions

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::experiment::BanditKeys;
use domain::session::SessionId;
use domain::store::KeyValueStore;
use infrastructure::{
    experiment::KvExperimentStore,
    services::{BanditSelector, ExperimentService, SyncService},
    session::KvSessionStore,
    store::StoreFactory,
};
use tracing::info;

/// Services wired to one key/value store
#[derive(Debug, Clone)]
pub struct BanditEngine {
    pub store: Arc<dyn KeyValueStore>,
    pub experiments: Arc<KvExperimentStore>,
    pub experiment_service: Arc<ExperimentService<KvExperimentStore>>,
    pub sync_service: Arc<SyncService<KvExperimentStore>>,
    pub selector: Arc<BanditSelector<KvExperimentStore>>,
    config: Arc<AppConfig>,
}

impl BanditEngine {
    /// Wire all services onto an existing store
    pub fn new(store: Arc<dyn KeyValueStore>, config: &AppConfig) -> Self {
        let keys = BanditKeys::new(&config.bandit.key_version);
        let experiments = Arc::new(KvExperimentStore::new(store.clone(), keys));

        let experiment_service = ExperimentService::new(experiments.clone())
            .with_persist_default(config.bandit.persist_default_on_results);
        let selector = BanditSelector::new(experiments.clone())
            .with_exploit_probability(config.bandit.exploit_probability);

        Self {
            store,
            sync_service: Arc::new(SyncService::new(experiments.clone())),
            experiment_service: Arc::new(experiment_service),
            selector: Arc::new(selector),
            experiments,
            config: Arc::new(config.clone()),
        }
    }

    /// Session store for one session, salted and expired per configuration
    pub fn session(&self, session_id: &SessionId) -> KvSessionStore {
        KvSessionStore::from_settings(self.store.clone(), session_id, &self.config.session)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Create the engine, connecting to the configured store
pub async fn create_engine_with_config(config: &AppConfig) -> anyhow::Result<BanditEngine> {
    let store = StoreFactory::create(&config.store).await?;
    info!(
        backend = %config.store.backend,
        key_version = %config.bandit.key_version,
        "Bandit engine ready"
    );

    Ok(BanditEngine::new(store, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::SessionStore;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.store.backend = "memory".to_string();
        config.bandit.exploit_probability = 1.0;
        config
    }

    #[tokio::test]
    async fn test_engine_end_to_end() {
        let engine = create_engine_with_config(&memory_config()).await.unwrap();

        engine.experiment_service.add_experiment("signup").await.unwrap();
        engine.experiment_service.add_choice("signup", "red").await.unwrap();
        engine.experiment_service.add_choice("signup", "blue").await.unwrap();
        engine
            .experiment_service
            .set_default_choice("signup", "blue")
            .await
            .unwrap();

        let session = engine.session(&SessionId::new("visitor"));
        let choice = engine.selector.choose(&session, "signup").await.unwrap();
        assert_eq!(choice.as_deref(), Some("blue"));

        engine.selector.mark_success(&session, "signup").await.unwrap();

        let results = engine.experiment_service.results("signup").await.unwrap();
        assert_eq!(results.default.as_deref(), Some("blue"));
        assert_eq!(results.choices[0].plays, 1);
        assert_eq!(results.choices[0].rewards, 1);
    }

    #[tokio::test]
    async fn test_engine_uses_configured_key_version() {
        let mut config = memory_config();
        config.bandit.key_version = "v9".to_string();
        let engine = create_engine_with_config(&config).await.unwrap();

        engine.experiment_service.add_experiment("ex").await.unwrap();
        assert!(engine.store.exists("bandit:experiment:ex:v9").await.unwrap());
        assert!(!engine.store.exists("bandit:experiment:ex:v2").await.unwrap());
    }

    #[tokio::test]
    async fn test_engine_session_uses_salt() {
        let mut config = memory_config();
        config.session.salt = "foo".to_string();
        let engine = create_engine_with_config(&config).await.unwrap();

        let session = engine.session(&SessionId::new("bar"));
        session.set_value("k", "v").await.unwrap();
        assert!(engine
            .store
            .exists("session:sha256!c3ab8ff13720e8ad9047dd39466b3c8974e592c2fa383d4a3960714caef0c4f2:v4")
            .await
            .unwrap());
    }
}
