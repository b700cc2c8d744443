//! Authenticator capability.
//!
//! Credential issuance and verification are external to the core. The core
//! consumes them through two object-safe traits:
//!
//! - [`CredentialHasher`]: turns a password into an opaque
//!   [`PasswordCredential`] and checks candidates against it.
//! - [`Authenticator`]: issues a signed bearer credential for an
//!   [`Identity`] and verifies one back into the identity triple.

use crate::error::Result;
use crate::scope::Identity;
use crate::types::PasswordCredential;
use chrono::{DateTime, Utc};

/// One-way password credential hashing.
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Fatal`] if hashing fails.
    fn hash(&self, password: &str) -> Result<PasswordCredential>;

    /// Check a plaintext password against a stored credential.
    ///
    /// A malformed stored credential counts as a mismatch.
    fn verify(&self, password: &str, credential: &PasswordCredential) -> bool;
}

/// A signed bearer credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken {
    /// Opaque bearer token
    pub token: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Bearer credential issuance and verification.
pub trait Authenticator: Send + Sync {
    /// Sign a bearer credential encoding the identity triple.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Fatal`] if signing fails.
    fn issue(&self, identity: &Identity) -> Result<IssuedToken>;

    /// Verify a bearer credential and return the identity it encodes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unauthenticated`] for missing, malformed,
    /// tampered or expired credentials.
    fn authenticate(&self, bearer: &str) -> Result<Identity>;
}
