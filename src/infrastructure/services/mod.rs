//! Infrastructure services

mod experiment_service;
mod selection_service;
mod sync_service;

pub use experiment_service::ExperimentService;
pub use selection_service::{session_field, BanditSelector, DEFAULT_EXPLOIT_PROBABILITY};
pub use sync_service::{ChoiceChanges, SyncReport, SyncService};
