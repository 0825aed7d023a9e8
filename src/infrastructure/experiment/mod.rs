//! Infrastructure layer for bandit experiments
//!
//! Provides the store-backed experiment implementation and significance math.

mod kv_store;
mod statistical;

pub use kv_store::KvExperimentStore;
pub use statistical::{chi_squared, is_confident, CHI_SQUARE_DISTRIBUTION, MAX_CONFIDENCE_CHOICES};
