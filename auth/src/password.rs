//! Password credentials using Argon2id.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use fest_core::{CredentialHasher, PasswordCredential};

use crate::error::AuthError;

/// Argon2id hasher producing PHC-format credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    /// Creates a hasher with the default Argon2id parameters.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Hash `password` with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Crypto`] if hashing fails.
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Crypto(format!("hash error: {e}")))
    }

    /// Verify `password` against a PHC-format hash.
    ///
    /// Returns `Ok(true)` on match, `Ok(false)` on mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Crypto`] if the stored hash is malformed.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
        }
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> fest_core::Result<PasswordCredential> {
        Ok(PasswordCredential::new(self.hash_password(password)?))
    }

    fn verify(&self, password: &str, credential: &PasswordCredential) -> bool {
        match self.verify_password(password, credential.expose()) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!(error = %e, "Stored credential could not be checked");
                false
            }
        }
    }
}
