//! Password hashing.
//!
//! Argon2id with a fresh random salt per call. The cost parameters are
//! configurable so tests and constrained hosts can lower them.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use thiserror::Error;

/// Failure while hashing or reading a stored hash.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashingError {
    /// The stored value is not a PHC-formatted hash.
    #[error("stored credential hash is malformed")]
    Malformed,

    /// The hashing backend rejected the parameters or input.
    #[error("credential hashing failed: {0}")]
    Backend(String),
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// One-way credential hasher.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Creates a hasher with the given cost.
    ///
    /// # Errors
    /// Returns `HashingError::Backend` if Argon2 rejects the parameters
    /// (e.g. memory below `8 * parallelism` KiB).
    pub fn new(cost: HashCost) -> Result<Self, HashingError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| HashingError::Backend(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes `secret` into a PHC string (`$argon2id$v=19$...`).
    pub fn hash(&self, secret: &str) -> Result<String, HashingError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashingError::Backend(e.to_string()))
    }

    /// Checks `candidate` against a stored hash.
    ///
    /// A mismatch is `Ok(false)`. Only an unreadable stored hash or a backend
    /// failure is an error. Verification uses the parameters recorded in the
    /// stored hash, so hashes made under an older cost still verify.
    pub fn verify(&self, hashed: &str, candidate: &str) -> Result<bool, HashingError> {
        let parsed = PasswordHash::new(hashed).map_err(|_| HashingError::Malformed)?;
        match self.argon2().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashingError::Backend(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> CredentialHasher {
        CredentialHasher::new(HashCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_verify_accepts_original_secret() {
        let hasher = cheap();
        let hashed = hasher.hash("correct horse").unwrap();
        assert!(hasher.verify(&hashed, "correct horse").unwrap());
    }

    #[test]
    fn test_verify_rejects_altered_secret() {
        let hasher = cheap();
        let hashed = hasher.hash("correct horse").unwrap();
        assert!(!hasher.verify(&hashed, "correct horsex").unwrap());
        assert!(!hasher.verify(&hashed, "").unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = cheap();
        let first = hasher.hash("same input").unwrap();
        let second = hasher.hash("same input").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let hasher = cheap();
        assert_eq!(
            hasher.verify("not-a-hash", "whatever"),
            Err(HashingError::Malformed)
        );
    }

    #[test]
    fn test_hash_made_with_other_cost_still_verifies() {
        let hashed = cheap().hash("pw").unwrap();
        let stronger = CredentialHasher::new(HashCost {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(stronger.verify(&hashed, "pw").unwrap());
    }

    #[test]
    fn test_invalid_cost_is_rejected() {
        let err = CredentialHasher::new(HashCost {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap_err();
        assert!(matches!(err, HashingError::Backend(_)));
    }
}
