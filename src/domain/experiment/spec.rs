//! Declarative experiment specification used by reconciliation

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::entity::ExperimentName;
use super::validation::validate_choice_name;
use crate::domain::error::ExperimentError;
use crate::domain::DomainError;

/// Desired set of active experiments and their ordered choices
///
/// Parsed from JSON shaped as `{"experiment": ["choice", ...]}`. All names are
/// validated and choice lists are checked for duplicates up front, so a sync
/// never starts on a spec it could not finish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSpec {
    experiments: BTreeMap<ExperimentName, Vec<String>>,
}

impl SyncSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an experiment with its choices, validating every name
    pub fn with_experiment<I, S>(mut self, name: &str, choices: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, choices.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    fn insert(&mut self, name: &str, choices: Vec<String>) -> Result<(), DomainError> {
        let experiment = ExperimentName::new(name)?;
        let mut seen = HashSet::new();

        for choice in &choices {
            validate_choice_name(name, choice)?;

            if !seen.insert(choice.as_str()) {
                return Err(ExperimentError::duplicate_choice(name, choice).into());
            }
        }

        self.experiments.insert(experiment, choices);
        Ok(())
    }

    /// Parse a spec from JSON text
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let parsed: BTreeMap<String, Vec<String>> = serde_json::from_str(raw)?;
        let mut spec = Self::new();

        for (name, choices) in parsed {
            spec.insert(&name, choices)?;
        }

        Ok(spec)
    }

    /// Read and parse a spec file
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read spec file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&raw)
    }

    pub fn contains(&self, name: &ExperimentName) -> bool {
        self.experiments.contains_key(name)
    }

    pub fn choices(&self, name: &ExperimentName) -> Option<&[String]> {
        self.experiments.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &ExperimentName> {
        self.experiments.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ExperimentName, &[String])> {
        self.experiments.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }
}
