//! Registration, login and membership endpoints.

use crate::extractors::{Admin, ApiJson, Caller};
use crate::state::AppState;
use crate::WebResult;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use fest_core::store::FestStore;
use fest_core::{
    Credentials, NewMember, Organization, OrganizationId, RegisterOrganization, Registration,
    Role, Session, User, UserId,
};
use serde::Serialize;

/// Public view of a user. The password credential never leaves the service.
#[derive(Debug, Serialize)]
pub struct UserView {
    /// User ID
    pub id: UserId,
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
    /// Role
    pub role: Role,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            organization_id: user.organization_id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Response of [`register`].
#[derive(Debug, Serialize)]
pub struct RegistrationView {
    /// The new organization
    pub organization: Organization,
    /// Its first admin
    pub admin: UserView,
}

/// Register an organization and its first admin.
///
/// ```text
/// POST /api/auth/register
/// ```
pub async fn register<S: FestStore>(
    State(state): State<AppState<S>>,
    ApiJson(input): ApiJson<RegisterOrganization>,
) -> WebResult<(StatusCode, Json<RegistrationView>)> {
    let Registration {
        organization,
        admin,
    } = state.accounts.register(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationView {
            organization,
            admin: admin.into(),
        }),
    ))
}

/// Exchange email and password for a bearer token.
///
/// ```text
/// POST /api/auth/login
/// ```
pub async fn login<S: FestStore>(
    State(state): State<AppState<S>>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> WebResult<Json<Session>> {
    Ok(Json(state.accounts.login(credentials).await?))
}

/// The caller's own user record.
///
/// ```text
/// GET /api/auth/me
/// ```
pub async fn me<S: FestStore>(
    State(state): State<AppState<S>>,
    Caller(identity): Caller,
) -> WebResult<Json<UserView>> {
    Ok(Json(state.accounts.current_user(&identity).await?.into()))
}

/// Add a member to the admin's organization.
///
/// ```text
/// POST /api/users
/// ```
pub async fn add_member<S: FestStore>(
    State(state): State<AppState<S>>,
    Admin(identity): Admin,
    ApiJson(input): ApiJson<NewMember>,
) -> WebResult<(StatusCode, Json<UserView>)> {
    let user = state.accounts.add_member(&identity, input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}
