//! Session identifiers and their store-side hashes

use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters in a generated session ID
pub const SESSION_ID_LENGTH: usize = 20;

/// Opaque session identifier handed out by the cookie layer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a random session ID
    pub fn generate() -> Self {
        Self(random_hex(SESSION_ID_LENGTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Salted hash used to derive the session's store key
    pub fn hashed(&self, salt: &str) -> String {
        session_hash(&self.0, salt)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Random lowercase hex string of exactly `length` characters
pub fn random_hex(length: usize) -> String {
    let mut bytes = vec![0u8; length.div_ceil(2)];
    rand::thread_rng().fill_bytes(&mut bytes);

    let mut encoded = hex::encode(bytes);
    encoded.truncate(length);
    encoded
}

/// `sha256!<hex(sha256(salt + session_id))>`
pub fn session_hash(session_id: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(session_id.as_bytes());
    format!("sha256!{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_hash_known_value() {
        assert_eq!(
            session_hash("bar", "foo"),
            "sha256!c3ab8ff13720e8ad9047dd39466b3c8974e592c2fa383d4a3960714caef0c4f2"
        );
    }

    #[test]
    fn test_random_hex() {
        for length in [1, 10, 20, 33] {
            let s = random_hex(length);
            assert_eq!(s.len(), length);
            assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }

        assert_ne!(random_hex(20), random_hex(20));
    }

    #[test]
    fn test_generate_session_id() {
        let id = SessionId::generate();
        assert_eq!(id.as_str().len(), SESSION_ID_LENGTH);
        assert_eq!(id.hashed("salt"), session_hash(id.as_str(), "salt"));
    }
}
