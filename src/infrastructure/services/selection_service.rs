//! Variant selection for sessions
//!
//! Assigns each session one choice per experiment: mostly the current default
//! (exploit), otherwise a uniformly random choice (explore). The assignment is
//! kept in the session and reused until it stops being a valid choice.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::domain::experiment::{ExperimentName, ExperimentStore};
use crate::domain::session::SessionStore;
use crate::domain::{DomainError, ExperimentError};

/// Default chance of assigning the default choice to an unassigned session
pub const DEFAULT_EXPLOIT_PROBABILITY: f64 = 0.9;

/// Session field holding the assigned choice for an experiment
pub fn session_field(experiment: &ExperimentName) -> String {
    format!("bandit:{}:v1", experiment)
}

/// Epsilon-greedy selector over an `ExperimentStore`
#[derive(Debug)]
pub struct BanditSelector<E: ExperimentStore> {
    store: Arc<E>,
    exploit_probability: f64,
    rng: Mutex<StdRng>,
}

impl<E: ExperimentStore> BanditSelector<E> {
    pub fn new(store: Arc<E>) -> Self {
        Self {
            store,
            exploit_probability: DEFAULT_EXPLOIT_PROBABILITY,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Probability in `[0, 1]`; out-of-range values are clamped, NaN keeps the default
    pub fn with_exploit_probability(mut self, probability: f64) -> Self {
        if !probability.is_nan() {
            self.exploit_probability = probability.clamp(0.0, 1.0);
        }
        self
    }

    /// Use a deterministic random source
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn exploit_probability(&self) -> f64 {
        self.exploit_probability
    }

    /// Resolve the session's choice for an experiment and record a play
    ///
    /// Returns `None` when the experiment has no choices.
    pub async fn choose<S>(
        &self,
        session: &S,
        experiment: &str,
    ) -> Result<Option<String>, DomainError>
    where
        S: SessionStore + ?Sized,
    {
        let name = self.existing(experiment).await?;
        let field = session_field(&name);
        let choices = self.store.get_choices(&name).await?;

        let assigned = session
            .get_value(&field)
            .await?
            .filter(|choice| choices.contains(choice));

        let choice = match assigned {
            Some(choice) => Some(choice),
            None => {
                let selected = self.select(&name, &choices).await?;

                if let Some(choice) = &selected {
                    session.set_value(&field, choice).await?;
                    debug!(experiment = %name, choice = %choice, "Session assigned to choice");
                }

                selected
            }
        };

        if let Some(choice) = &choice {
            self.store.increment_play_count(&name, choice, 1).await?;
        }

        Ok(choice)
    }

    /// Credit a reward to the session's current choice
    ///
    /// Returns the rewarded choice, or `None` if the session is unassigned.
    pub async fn mark_success<S>(
        &self,
        session: &S,
        experiment: &str,
    ) -> Result<Option<String>, DomainError>
    where
        S: SessionStore + ?Sized,
    {
        let name = self.existing(experiment).await?;
        let choice = session.get_value(&session_field(&name)).await?;

        if let Some(choice) = &choice {
            self.store.increment_reward_count(&name, choice, 1).await?;
            debug!(experiment = %name, choice = %choice, "Reward recorded for session");
        }

        Ok(choice)
    }

    /// Opt the session into a specific choice
    pub async fn join<S>(
        &self,
        session: &S,
        experiment: &str,
        choice: &str,
    ) -> Result<(), DomainError>
    where
        S: SessionStore + ?Sized,
    {
        let name = ExperimentName::new(experiment)?;
        session.set_value(&session_field(&name), choice).await
    }

    /// Drop the session's assignment; counters are untouched
    pub async fn leave<S>(&self, session: &S, experiment: &str) -> Result<(), DomainError>
    where
        S: SessionStore + ?Sized,
    {
        let name = ExperimentName::new(experiment)?;
        session.clear_value(&session_field(&name)).await
    }

    /// The session's stored choice, which may no longer be valid
    pub async fn current_choice<S>(
        &self,
        session: &S,
        experiment: &str,
    ) -> Result<Option<String>, DomainError>
    where
        S: SessionStore + ?Sized,
    {
        let name = ExperimentName::new(experiment)?;
        session.get_value(&session_field(&name)).await
    }

    async fn existing(&self, experiment: &str) -> Result<ExperimentName, DomainError> {
        let name = ExperimentName::new(experiment)?;

        if !self.store.exists(&name).await? {
            return Err(ExperimentError::does_not_exist(name.as_str()).into());
        }

        Ok(name)
    }

    async fn select(
        &self,
        name: &ExperimentName,
        choices: &[String],
    ) -> Result<Option<String>, DomainError> {
        if choices.is_empty() {
            return Ok(None);
        }

        if self.roll_exploit()? {
            let default = self
                .store
                .get_default_choice(name)
                .await?
                .filter(|choice| choices.contains(choice));

            if default.is_some() {
                return Ok(default);
            }
        }

        self.pick_random(choices)
    }

    fn roll_exploit(&self) -> Result<bool, DomainError> {
        let mut rng = self.lock_rng()?;
        Ok(rng.gen_bool(self.exploit_probability))
    }

    fn pick_random(&self, choices: &[String]) -> Result<Option<String>, DomainError> {
        let mut rng = self.lock_rng()?;
        Ok(choices.choose(&mut *rng).cloned())
    }

    fn lock_rng(&self) -> Result<std::sync::MutexGuard<'_, StdRng>, DomainError> {
        self.rng
            .lock()
            .map_err(|e| DomainError::internal(format!("Failed to acquire rng lock: {}", e)))
    }
}
