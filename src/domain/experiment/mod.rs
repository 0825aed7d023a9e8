//! Experiment domain module for bandit A/B testing
//!
//! Experiments are named sets of competing choices whose play and reward
//! counters live in the shared key/value store.

mod entity;
mod keys;
mod repository;
mod result;
mod spec;
mod validation;

pub use entity::{ChoiceCounts, ExperimentMetadata, ExperimentName};
pub use keys::{
    plays_field, rewards_field, BanditKeys, CHOICES_FIELD, DEFAULT_CHOICE_FIELD,
    DEFAULT_KEY_VERSION, METADATA_FIELD,
};
pub use repository::ExperimentStore;
pub use result::{ChoiceResult, ExperimentResults};
pub use spec::SyncSpec;
pub use validation::{is_valid_name, validate_choice_name, validate_experiment_name};
