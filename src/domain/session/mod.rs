//! Session domain - per-user value storage consumed by variant selection

mod id;
mod repository;

pub use id::{random_hex, session_hash, SessionId, SESSION_ID_LENGTH};
pub use repository::SessionStore;

#[cfg(test)]
pub use repository::MockSessionStore;
