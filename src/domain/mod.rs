//! Domain layer - Core business logic and entities

pub mod error;
pub mod experiment;
pub mod session;
pub mod store;

pub use error::{DomainError, ExperimentError, ExperimentErrorKind};
pub use experiment::{
    ChoiceCounts, ChoiceResult, ExperimentMetadata, ExperimentName, ExperimentResults,
    ExperimentStore, SyncSpec,
};
pub use session::{SessionId, SessionStore};
pub use store::{KeyValueStore, StoreOp};
