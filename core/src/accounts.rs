//! Account service: tenant registration, login and membership.
//!
//! Wraps the [`TenantDirectory`] and [`IdentityStore`] halves of the store
//! with validation, credential hashing and token issuance.

use crate::auth::{Authenticator, CredentialHasher};
use crate::environment::Clock;
use crate::error::{ConflictKind, Error, Result};
use crate::scope::Identity;
use crate::store::{constraints, IdentityStore, TenantDirectory};
use crate::types::{Organization, OrganizationId, PasswordCredential, Role, User, UserId};
use crate::validation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Input of [`AccountService::register`].
#[derive(Clone, Debug, Deserialize)]
pub struct RegisterOrganization {
    /// Organization display name
    pub org_name: String,
    /// Organization domain
    pub domain: String,
    /// Name of the first admin
    pub admin_name: String,
    /// Email of the first admin
    pub admin_email: String,
    /// Plaintext password of the first admin
    pub password: String,
}

/// Input of [`AccountService::add_member`].
#[derive(Clone, Debug, Deserialize)]
pub struct NewMember {
    /// Display name
    pub name: String,
    /// Email, unique within the caller's organization
    pub email: String,
    /// Plaintext password
    pub password: String,
}

/// Input of [`AccountService::login`].
#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    /// Email
    pub email: String,
    /// Plaintext password
    pub password: String,
    /// Organization domain, required when the email exists in several
    /// organizations
    #[serde(default)]
    pub domain: Option<String>,
}

/// A freshly registered tenant.
#[derive(Clone, Debug)]
pub struct Registration {
    /// The new organization
    pub organization: Organization,
    /// Its first admin
    pub admin: User,
}

/// An authenticated session.
#[derive(Clone, Debug, Serialize)]
pub struct Session {
    /// Bearer token
    pub token: String,
    /// When the token expires
    pub expires_at: DateTime<Utc>,
    /// Identity encoded in the token
    pub identity: Identity,
}

/// Registration, login and membership management.
pub struct AccountService<S> {
    store: S,
    hasher: Arc<dyn CredentialHasher>,
    authenticator: Arc<dyn Authenticator>,
    clock: Arc<dyn Clock>,
}

impl<S> AccountService<S>
where
    S: TenantDirectory + IdentityStore,
{
    /// Creates a new account service.
    #[must_use]
    pub fn new(
        store: S,
        hasher: Arc<dyn CredentialHasher>,
        authenticator: Arc<dyn Authenticator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            hasher,
            authenticator,
            clock,
        }
    }

    /// Create an organization together with its first admin.
    ///
    /// Both records persist or neither does.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for malformed input
    /// - [`Error::Conflict`] with [`ConflictKind::DomainTaken`] if another
    ///   organization owns the domain
    /// - [`Error::Transient`] or [`Error::Fatal`] on storage failure
    #[tracing::instrument(skip_all, fields(domain = %input.domain))]
    pub async fn register(&self, input: RegisterOrganization) -> Result<Registration> {
        let org_name = validation::non_blank("org_name", &input.org_name)?;
        let domain = validation::domain(&input.domain)?;
        let admin_name = validation::non_blank("admin_name", &input.admin_name)?;
        let admin_email = validation::email(&input.admin_email)?;
        validation::password(&input.password)?;

        if self.store.find_organization_by_domain(&domain).await?.is_some() {
            tracing::debug!("Domain already registered");
            return Err(Error::Conflict(ConflictKind::DomainTaken));
        }

        let password = self.hash(input.password).await?;
        let now = self.clock.now();
        let organization = Organization {
            id: OrganizationId::new(),
            name: org_name,
            domain,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let admin = User {
            id: UserId::new(),
            organization_id: organization.id,
            name: admin_name,
            email: admin_email,
            password,
            role: Role::Admin,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.store
            .register_organization(&organization, &admin)
            .await
            .map_err(|e| e.or_conflict(constraints::ORGANIZATION_DOMAIN, ConflictKind::DomainTaken))?;

        metrics::counter!("fest_registrations_total").increment(1);
        tracing::info!(
            organization_id = %organization.id,
            admin_id = %admin.id,
            "Organization registered"
        );

        Ok(Registration {
            organization,
            admin,
        })
    }

    /// Verify credentials and issue a bearer token.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthenticated`] if no user matches the email and password
    /// - [`Error::Validation`] if the email and password match users of
    ///   several organizations and no domain was given
    /// - [`Error::Transient`] or [`Error::Fatal`] on storage failure
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, credentials: Credentials) -> Result<Session> {
        let Ok(email) = validation::email(&credentials.email) else {
            return Err(Error::Unauthenticated);
        };
        let domain = credentials
            .domain
            .as_deref()
            .map(validation::domain)
            .transpose()?;

        let candidates = self
            .store
            .find_login_candidates(&email, domain.as_deref())
            .await?;

        let hasher = Arc::clone(&self.hasher);
        let password = credentials.password;
        let mut matches = tokio::task::spawn_blocking(move || {
            candidates
                .into_iter()
                .filter(|user| hasher.verify(&password, &user.password))
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password verification task failed");
            Error::Fatal
        })?;

        let user = match matches.len() {
            0 => {
                tracing::debug!("Login rejected");
                return Err(Error::Unauthenticated);
            }
            1 => matches.remove(0),
            n => {
                tracing::debug!(organizations = n, "Ambiguous login");
                return Err(Error::validation(
                    "email is registered with several organizations; specify the domain",
                ));
            }
        };

        let identity = Identity::of(&user);
        let issued = self.authenticator.issue(&identity)?;
        tracing::info!(
            user_id = %identity.user_id,
            organization_id = %identity.organization_id,
            "User logged in"
        );

        Ok(Session {
            token: issued.token,
            expires_at: issued.expires_at,
            identity,
        })
    }

    /// Add a member to the caller's organization.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] unless the caller is an admin
    /// - [`Error::Validation`] for malformed input
    /// - [`Error::Conflict`] with [`ConflictKind::EmailTaken`] for a
    ///   duplicate email in the organization
    #[tracing::instrument(skip_all, fields(organization_id = %identity.organization_id))]
    pub async fn add_member(&self, identity: &Identity, input: NewMember) -> Result<User> {
        identity.require_admin()?;
        let name = validation::non_blank("name", &input.name)?;
        let email = validation::email(&input.email)?;
        validation::password(&input.password)?;

        let password = self.hash(input.password).await?;
        let now = self.clock.now();
        let user = User {
            id: UserId::new(),
            organization_id: identity.organization_id,
            name,
            email,
            password,
            role: Role::Member,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.store
            .insert_user(&user)
            .await
            .map_err(|e| e.or_conflict(constraints::USER_EMAIL_PER_ORGANIZATION, ConflictKind::EmailTaken))?;

        tracing::info!(user_id = %user.id, "Member added");
        Ok(user)
    }

    /// The caller's own user record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user has been deleted since the
    /// token was issued.
    pub async fn current_user(&self, identity: &Identity) -> Result<User> {
        let scope = identity.scope();
        let found = self.store.find_user(&scope, identity.user_id).await?;
        scope.resolve("user", found)
    }

    async fn hash(&self, password: String) -> Result<PasswordCredential> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing task failed");
                Error::Fatal
            })?
    }
}
