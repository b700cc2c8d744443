//! Authentication configuration.
//!
//! Values are provided by the application, not hardcoded.

use chrono::Duration;

/// Minimum accepted length of the token signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Bearer token configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret.
    pub jwt_secret: String,

    /// How long an issued token stays valid.
    ///
    /// Default: 72 hours
    pub token_ttl: Duration,

    /// `iss` claim written into and required from every token.
    ///
    /// Default: `"fest"`
    pub issuer: String,
}

impl AuthConfig {
    /// Create new configuration with default lifetime and issuer.
    #[must_use]
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::hours(72),
            issuer: "fest".to_string(),
        }
    }

    /// Set token lifetime.
    #[must_use]
    pub const fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set token issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("issuer", &self.issuer)
            .finish()
    }
}
