//! Key/value store backends

mod factory;
mod in_memory;
mod redis;

pub use factory::{StoreFactory, StoreType};
pub use in_memory::InMemoryStore;
pub use redis::{RedisStore, RedisStoreConfig};
