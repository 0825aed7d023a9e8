//! Session storage implementations

mod kv_session;

pub use kv_session::{session_key, KvSessionStore};
