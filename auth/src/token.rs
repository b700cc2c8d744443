//! HS256 bearer token issuance and verification.

use chrono::Duration;
use fest_core::{Authenticator, Clock, Identity, IssuedToken, OrganizationId, Role, SystemClock, UserId};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{AuthConfig, MIN_SECRET_LEN};
use crate::error::AuthError;

/// JWT claims embedded in every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID (UUID string).
    pub sub: String,
    /// Organization ID (UUID string).
    pub org_id: String,
    /// Role within the organization.
    pub role: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    fn into_identity(self) -> Result<Identity, AuthError> {
        let user_id = Uuid::parse_str(&self.sub)
            .map_err(|_| AuthError::TokenInvalid("sub is not a UUID".into()))?;
        let organization_id = Uuid::parse_str(&self.org_id)
            .map_err(|_| AuthError::TokenInvalid("org_id is not a UUID".into()))?;
        let role = Role::parse(&self.role)
            .ok_or_else(|| AuthError::TokenInvalid(format!("unknown role {}", self.role)))?;

        Ok(Identity::new(
            UserId::from_uuid(user_id),
            OrganizationId::from_uuid(organization_id),
            role,
        ))
    }
}

/// Issues and verifies HS256 tokens for the identity triple.
pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    token_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtAuthenticator {
    /// Create an authenticator using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WeakSecret`] if the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes.
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an authenticator that stamps `iat`/`exp` from `clock`.
    ///
    /// Expiry is still checked against the system time.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WeakSecret`] if the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes.
    pub fn with_clock(config: AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        if config.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::WeakSecret { min: MIN_SECRET_LEN });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            issuer: config.issuer,
            token_ttl: config.token_ttl,
            clock,
        })
    }

    /// Sign a token for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Crypto`] if encoding fails.
    pub fn encode(&self, identity: &Identity) -> Result<IssuedToken, AuthError> {
        let now = self.clock.now();
        let expires_at = now + self.token_ttl;
        let claims = Claims {
            sub: identity.user_id.to_string(),
            org_id: identity.organization_id.to_string(),
            role: identity.role.as_str().to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature, expiry and issuer, then decode the identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenExpired`] or [`AuthError::TokenInvalid`].
    pub fn decode(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })?;
        claims.into_identity()
    }
}

impl Authenticator for JwtAuthenticator {
    fn issue(&self, identity: &Identity) -> fest_core::Result<IssuedToken> {
        Ok(self.encode(identity)?)
    }

    fn authenticate(&self, bearer: &str) -> fest_core::Result<Identity> {
        Ok(self.decode(bearer)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fest_core::Utc;
    use fest_testing::FixedClock;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn identity() -> Identity {
        Identity::new(UserId::new(), OrganizationId::new(), Role::Admin)
    }

    #[test]
    fn token_roundtrip() {
        let authenticator = JwtAuthenticator::new(AuthConfig::new(SECRET)).unwrap();
        let who = identity();

        let issued = authenticator.issue(&who).unwrap();
        assert_eq!(authenticator.authenticate(&issued.token).unwrap(), who);
    }

    #[test]
    fn tokens_last_seventy_two_hours() {
        let now = Utc::now();
        let authenticator =
            JwtAuthenticator::with_clock(AuthConfig::new(SECRET), Arc::new(FixedClock::new(now)))
                .unwrap();

        let issued = authenticator.issue(&identity()).unwrap();
        assert_eq!(issued.expires_at, now + Duration::hours(72));
    }

    #[test]
    fn expired_token_is_unauthenticated() {
        let issued_at = Utc::now() - Duration::hours(100);
        let authenticator = JwtAuthenticator::with_clock(
            AuthConfig::new(SECRET),
            Arc::new(FixedClock::new(issued_at)),
        )
        .unwrap();

        let issued = authenticator.encode(&identity()).unwrap();
        assert_eq!(authenticator.decode(&issued.token), Err(AuthError::TokenExpired));
        assert_eq!(
            authenticator.authenticate(&issued.token),
            Err(fest_core::Error::Unauthenticated)
        );
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = JwtAuthenticator::new(AuthConfig::new(SECRET)).unwrap();
        let theirs =
            JwtAuthenticator::new(AuthConfig::new("ffffffffffffffffffffffffffffffff")).unwrap();

        let issued = theirs.issue(&identity()).unwrap();
        assert_eq!(
            ours.authenticate(&issued.token),
            Err(fest_core::Error::Unauthenticated)
        );
    }

    #[test]
    fn issuer_must_match() {
        let ours = JwtAuthenticator::new(AuthConfig::new(SECRET)).unwrap();
        let other =
            JwtAuthenticator::new(AuthConfig::new(SECRET).with_issuer("someone-else")).unwrap();

        let issued = other.issue(&identity()).unwrap();
        assert!(matches!(ours.decode(&issued.token), Err(AuthError::TokenInvalid(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        let authenticator = JwtAuthenticator::new(AuthConfig::new(SECRET)).unwrap();
        assert!(authenticator.authenticate("not.a.token").is_err());
        assert!(authenticator.authenticate("").is_err());
    }

    #[test]
    fn short_secrets_are_refused() {
        assert_eq!(
            JwtAuthenticator::new(AuthConfig::new("short")).err(),
            Some(AuthError::WeakSecret { min: MIN_SECRET_LEN })
        );
    }
}
