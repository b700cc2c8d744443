//! Tenant-scope guard.
//!
//! Every read and write issued on behalf of a caller is parameterized by the
//! caller's organization. The organization comes only from the verified
//! [`Identity`] triple, never from request input, and the only way to obtain
//! a [`TenantScope`] is from an [`Identity`].
//!
//! Entities owned by another organization are indistinguishable from absent
//! ones: the guard turns both into [`Error::NotFound`].

use crate::error::{Error, Result};
use crate::types::{Event, OrganizationId, Role, User, UserId};
use serde::{Deserialize, Serialize};

/// The verified `(user_id, organization_id, role)` triple of a caller.
///
/// Produced by an [`crate::auth::Authenticator`]; the core trusts it
/// completely and passes it explicitly to every operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Authenticated user
    pub user_id: UserId,
    /// The user's organization
    pub organization_id: OrganizationId,
    /// The user's role within the organization
    pub role: Role,
}

impl Identity {
    /// Build an identity triple.
    #[must_use]
    pub const fn new(user_id: UserId, organization_id: OrganizationId, role: Role) -> Self {
        Self {
            user_id,
            organization_id,
            role,
        }
    }

    /// The identity of a freshly loaded user.
    #[must_use]
    pub const fn of(user: &User) -> Self {
        Self::new(user.id, user.organization_id, user.role)
    }

    /// The tenant scope every query issued for this caller must use.
    #[must_use]
    pub const fn scope(&self) -> TenantScope {
        TenantScope {
            organization_id: self.organization_id,
        }
    }

    /// Require the admin role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] for members.
    pub fn require_admin(&self) -> Result<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(Error::Unauthorized { required: "admin" })
        }
    }
}

/// Anything owned, directly, by exactly one organization.
pub trait TenantOwned {
    /// The owning organization.
    fn owner(&self) -> OrganizationId;
}

impl TenantOwned for Event {
    fn owner(&self) -> OrganizationId {
        self.organization_id
    }
}

impl TenantOwned for User {
    fn owner(&self) -> OrganizationId {
        self.organization_id
    }
}

/// Predicate narrowing reads and writes to a single organization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TenantScope {
    organization_id: OrganizationId,
}

impl TenantScope {
    /// Organization every query must be filtered by.
    ///
    /// Stores bind this value into their `WHERE organization_id = ...` clauses.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Whether the entity belongs to this scope.
    #[must_use]
    pub fn admits<T: TenantOwned>(&self, entity: &T) -> bool {
        entity.owner() == self.organization_id
    }

    /// Keep only entities inside this scope.
    pub fn filter<T: TenantOwned>(&self, entities: impl IntoIterator<Item = T>) -> Vec<T> {
        entities.into_iter().filter(|e| self.admits(e)).collect()
    }

    /// Resolve a lookup result under this scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the entity is absent *or* owned by a
    /// different organization. The two cases are indistinguishable.
    pub fn resolve<T: TenantOwned>(&self, resource: &'static str, found: Option<T>) -> Result<T> {
        match found {
            Some(entity) if self.admits(&entity) => Ok(entity),
            Some(_) => {
                tracing::debug!(
                    resource,
                    organization_id = %self.organization_id,
                    "Cross-tenant lookup masked as not found"
                );
                Err(Error::NotFound { resource })
            }
            None => Err(Error::NotFound { resource }),
        }
    }
}
