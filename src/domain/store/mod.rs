//! Store domain - key/value capability consumed by the bandit engine

mod repository;

pub use repository::{KeyValueStore, StoreOp};
