//! Credential hashing.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sweater_common::{AppError, AppResult};

/// One-way transformation of raw passwords into stored credentials.
pub trait CredentialHasher: Send + Sync {
    /// Hash a raw password.
    fn hash(&self, plaintext: &str) -> AppResult<String>;

    /// Check a raw password against a stored credential.
    fn verify(&self, plaintext: &str, credential: &str) -> AppResult<bool>;
}

/// Shared credential hasher.
pub type CredentialHasherService = Arc<dyn CredentialHasher>;

/// Argon2id hasher with default parameters.
#[derive(Clone, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
    }

    fn verify(&self, plaintext: &str, credential: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(credential)
            .map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2() {
        let hash = Argon2Hasher.hash("secret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert_ne!(hash, "secret");
    }

    #[test]
    fn test_verify() {
        let hasher = Argon2Hasher;
        let hash = hasher.hash("secret").unwrap();

        assert!(hasher.verify("secret", &hash).unwrap());
        assert!(!hasher.verify("Secret", &hash).unwrap());
    }

    #[test]
    fn test_salted() {
        let hasher = Argon2Hasher;
        assert_ne!(hasher.hash("secret").unwrap(), hasher.hash("secret").unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        assert!(Argon2Hasher.verify("secret", "plain-text").is_err());
    }
}
