use std::fmt;

use thiserror::Error;

/// Category of an experiment-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentErrorKind {
    /// Experiment or choice name fails the allowed-character pattern
    InvalidName,
    /// `add` on a name that already exists
    AlreadyExists,
    /// Operation requiring an existing experiment on an absent one
    DoesNotExist,
    /// `add_choice` with a name already in the choice list
    DuplicateChoice,
    /// `remove_choice` with a name absent from the choice list
    ChoiceNotFound,
}

impl fmt::Display for ExperimentErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidName => "invalid_name",
            Self::AlreadyExists => "already_exists",
            Self::DoesNotExist => "does_not_exist",
            Self::DuplicateChoice => "duplicate_choice",
            Self::ChoiceNotFound => "choice_not_found",
        };
        write!(f, "{}", s)
    }
}

/// An experiment error carrying the experiment name it relates to
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Experiment {experiment}: {message}")]
pub struct ExperimentError {
    pub kind: ExperimentErrorKind,
    pub experiment: String,
    pub message: String,
}

impl ExperimentError {
    pub fn new(
        kind: ExperimentErrorKind,
        experiment: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            experiment: experiment.into(),
            message: message.into(),
        }
    }

    pub fn invalid_name(experiment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ExperimentErrorKind::InvalidName, experiment, message)
    }

    pub fn already_exists(experiment: impl Into<String>) -> Self {
        Self::new(ExperimentErrorKind::AlreadyExists, experiment, "Already exists")
    }

    pub fn does_not_exist(experiment: impl Into<String>) -> Self {
        Self::new(ExperimentErrorKind::DoesNotExist, experiment, "Does not exist")
    }

    pub fn duplicate_choice(experiment: impl Into<String>, choice: &str) -> Self {
        Self::new(
            ExperimentErrorKind::DuplicateChoice,
            experiment,
            format!("Choice already exists: {}", choice),
        )
    }

    pub fn choice_not_found(experiment: impl Into<String>, choice: &str) -> Self {
        Self::new(
            ExperimentErrorKind::ChoiceNotFound,
            experiment,
            format!("Choice not found: {}", choice),
        )
    }
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Experiment(#[from] ExperimentError),

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the experiment error kind, if this is an experiment error
    pub fn experiment_kind(&self) -> Option<ExperimentErrorKind> {
        match self {
            Self::Experiment(e) => Some(e.kind),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_error_display() {
        let error = ExperimentError::already_exists("homepage");
        assert_eq!(error.to_string(), "Experiment homepage: Already exists");
        assert_eq!(error.kind, ExperimentErrorKind::AlreadyExists);
    }

    #[test]
    fn test_domain_error_wraps_experiment_error() {
        let error: DomainError = ExperimentError::duplicate_choice("signup", "A").into();
        assert_eq!(error.to_string(), "Experiment signup: Choice already exists: A");
        assert_eq!(
            error.experiment_kind(),
            Some(ExperimentErrorKind::DuplicateChoice)
        );
    }

    #[test]
    fn test_store_error() {
        let error = DomainError::store("connection refused");
        assert_eq!(error.to_string(), "Store error: connection refused");
        assert_eq!(error.experiment_kind(), None);
    }
}
