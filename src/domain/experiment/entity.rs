//! Experiment domain entities

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::validation::validate_experiment_name;
use crate::domain::error::ExperimentError;

// ============================================================================
// ExperimentName
// ============================================================================

/// Validated experiment name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Create a new experiment name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, ExperimentError> {
        let name = name.into();
        validate_experiment_name(&name)?;
        Ok(Self(name))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExperimentName {
    type Error = ExperimentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ExperimentName {
    type Error = ExperimentError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExperimentName> for String {
    fn from(name: ExperimentName) -> Self {
        name.0
    }
}

impl fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ExperimentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// ExperimentMetadata
// ============================================================================

/// Immutable metadata written once when an experiment is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    /// Creation timestamp, formatted `YYYY-MM-DD HH:MM:SS.ffffff`
    pub creation_date: String,
    /// Any additional properties present in stored metadata
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExperimentMetadata {
    /// Metadata stamped with the current time
    pub fn now() -> Self {
        Self {
            creation_date: Utc::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            extra: serde_json::Map::new(),
        }
    }
}

// ============================================================================
// ChoiceCounts
// ============================================================================

/// Play and reward counters for one choice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceCounts {
    pub plays: u64,
    pub rewards: u64,
}

impl ChoiceCounts {
    pub fn new(plays: u64, rewards: u64) -> Self {
        Self { plays, rewards }
    }

    /// Reward rate, `rewards / max(plays, 1)`
    pub fn performance(&self) -> f64 {
        self.rewards as f64 / self.plays.max(1) as f64
    }
}
