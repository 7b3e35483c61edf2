//! One-way password hashing.
//!
//! Output is a PHC string (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so the
//! algorithm, work factor and salt travel with the hash and verification needs
//! nothing else.

use argon2::password_hash::{self, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, Version};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("hashing failed: {0}")]
    Hashing(String),
    #[error("password does not match")]
    Mismatch,
    #[error("stored hash is malformed: {0}")]
    MalformedHash(String),
}

/// Salted, adaptive one-way hash. Implementations must be safe to call from a
/// blocking worker thread.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError>;

    /// `Ok(())` iff `plaintext` produced `hash`.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<(), PasswordError>;

    /// Tag stored alongside credentials.
    fn algorithm(&self) -> &'static str;
}

/// Argon2id with a configurable work factor.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    argon: Argon2<'static>,
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self { argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()) }
    }
}

impl Argon2PasswordHasher {
    /// `memory_kib`, `iterations` and `parallelism` are the Argon2 m/t/p costs.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| PasswordError::Hashing(format!("invalid argon2 params: {e}")))?;
        Ok(Self { argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) })
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<(), PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        // Params come from the parsed hash; the digest comparison is constant-time.
        match self.argon.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(()),
            Err(password_hash::Error::Password) => Err(PasswordError::Mismatch),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        }
    }

    fn algorithm(&self) -> &'static str {
        "argon2id"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new(8, 1, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let h = fast();
        let hash = h.hash("Abcdef1!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(h.verify("Abcdef1!", &hash).is_ok());
    }

    #[test]
    fn near_misses_fail() {
        let h = fast();
        let hash = h.hash("Abcdef1!").unwrap();
        for wrong in ["", "abcdef1!", "Abcdef1", "Abcdef1!!", " Abcdef1!", "Abcdef1?"] {
            assert!(matches!(h.verify(wrong, &hash), Err(PasswordError::Mismatch)), "{wrong:?} verified");
        }
    }

    #[test]
    fn salts_differ_per_call() {
        let h = fast();
        let a = h.hash("Abcdef1!").unwrap();
        let b = h.hash("Abcdef1!").unwrap();
        assert_ne!(a, b);
        assert!(h.verify("Abcdef1!", &b).is_ok());
    }

    #[test]
    fn verify_uses_params_embedded_in_hash() {
        let stronger = Argon2PasswordHasher::new(16, 2, 1).unwrap();
        let hash = stronger.hash("Abcdef1!").unwrap();
        assert!(hash.contains("m=16,t=2,p=1"));
        assert!(fast().verify("Abcdef1!", &hash).is_ok());
    }

    #[test]
    fn malformed_hash_is_reported() {
        assert!(matches!(fast().verify("Abcdef1!", "not-a-hash"), Err(PasswordError::MalformedHash(_))));
    }

    #[test]
    fn rejects_invalid_work_factor() {
        assert!(Argon2PasswordHasher::new(8, 0, 1).is_err());
    }
}
