//! Store key scheme for experiments
//!
//! These keys are shared with live data and must stay stable across releases.

use super::entity::ExperimentName;

/// Default key version suffix
pub const DEFAULT_KEY_VERSION: &str = "v2";

pub const METADATA_FIELD: &str = "metadata";
pub const CHOICES_FIELD: &str = "choices";
pub const DEFAULT_CHOICE_FIELD: &str = "default-choice";

/// Builds versioned store keys for the bandit listings and experiment hashes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanditKeys {
    version: String,
}

impl Default for BanditKeys {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_VERSION)
    }
}

impl BanditKeys {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Set of active experiment names
    pub fn active_listing(&self) -> String {
        format!("bandit:listing:active:{}", self.version)
    }

    /// Set of archived experiment names
    pub fn archived_listing(&self) -> String {
        format!("bandit:listing:archived:{}", self.version)
    }

    pub fn listing(&self, active: bool) -> String {
        if active {
            self.active_listing()
        } else {
            self.archived_listing()
        }
    }

    /// Hash holding an experiment's metadata, choices and counters
    pub fn experiment(&self, name: &ExperimentName) -> String {
        format!("bandit:experiment:{}:{}", name, self.version)
    }
}

pub fn plays_field(choice: &str) -> String {
    format!("{}:plays", choice)
}

pub fn rewards_field(choice: &str) -> String {
    format!("{}:rewards", choice)
}
