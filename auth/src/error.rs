//! Error types for credential hashing and token operations.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure modes of the credential capabilities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Token Errors
    // ═══════════════════════════════════════════════════════════

    /// Token signature is valid but the token has expired.
    #[error("Token has expired")]
    TokenExpired,

    /// Token is malformed, tampered with, or carries unusable claims.
    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Signing secret is too short.
    #[error("JWT secret must be at least {min} bytes")]
    WeakSecret {
        /// Minimum length in bytes
        min: usize,
    },

    /// Hashing or signing failed.
    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl AuthError {
    /// Returns `true` if the error was caused by the presented credential.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fest_auth::AuthError;
    /// assert!(AuthError::TokenExpired.is_user_error());
    /// assert!(!AuthError::Crypto("rng".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::TokenExpired | Self::TokenInvalid(_))
    }
}

impl From<AuthError> for fest_core::Error {
    fn from(err: AuthError) -> Self {
        if err.is_user_error() {
            tracing::debug!(error = %err, "Bearer credential rejected");
            Self::Unauthenticated
        } else {
            tracing::error!(error = %err, "Credential operation failed");
            Self::Fatal
        }
    }
}
