//! Custom Axum extractors.
//!
//! This module contains custom extractors for the Fest HTTP surface:
//! - `CorrelationId`: Extract or generate request correlation IDs
//! - `BearerToken`: The raw credential from the `Authorization` header
//! - `Caller`: The verified identity triple behind the bearer token
//! - `Admin`: A caller whose role is admin
//! - `ApiJson`: JSON bodies whose rejections use the [`AppError`] format
//! - `ApiPath`: path parameters whose rejections use the [`AppError`] format
//!
//! The identity triple is only ever taken from a verified bearer token. No
//! extractor reads an organization or role from the request body or path.
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     State(state): State<AppState<S>>,
//!     correlation_id: CorrelationId,
//!     Caller(identity): Caller,
//! ) -> Result<Json<Vec<Event>>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, "Listing events");
//!     Ok(Json(state.catalog.list_events(&identity).await?))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::{header, request::Parts, StatusCode},
};
use fest_core::{Error, Identity};
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Reads the ID stored by [`crate::middleware::correlation_id_layer`], falls
/// back to the `X-Correlation-ID` header, and generates a new UUID v4 if
/// neither is present.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Bearer credential from `Authorization: Bearer <token>`.
///
/// Rejects with 401 when the header is missing or uses another scheme.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_bearer)
            .map(|token| Self(token.to_string()))
            .ok_or_else(|| AppError::from(Error::Unauthenticated))
    }
}

/// Token part of a `Bearer` authorization value. The scheme is
/// case-insensitive.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// The verified identity of the caller.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Identity);

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let identity = state.authenticator.authenticate(&token)?;
        tracing::Span::current().record("user_id", tracing::field::display(identity.user_id));
        Ok(Self(identity))
    }
}

/// A caller holding the admin role. Members are rejected with 403.
#[derive(Debug, Clone, Copy)]
pub struct Admin(pub Identity);

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for Admin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let Caller(identity) = Caller::from_request_parts(parts, state).await?;
        identity.require_admin()?;
        Ok(Self(identity))
    }
}

/// `Json` with rejections rendered as [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::UNPROCESSABLE_ENTITY {
            Self::validation(rejection.body_text())
        } else {
            Self::bad_request(rejection.body_text())
        }
    }
}

/// `Path` with rejections rendered as [`AppError`]. A malformed id is a 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let req = Request::builder()
            .header(CORRELATION_ID_HEADER, uuid.to_string())
            .body(())
            .expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, uuid);
    }

    #[tokio::test]
    async fn test_correlation_id_generates_new() {
        let req = Request::builder().body(()).expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_ne!(correlation_id.0, Uuid::nil());
    }

    #[tokio::test]
    async fn test_bearer_token_extracted() {
        let req = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc.def.ghi")
            .body(())
            .expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let token = BearerToken::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(token.0, "abc.def.ghi");
    }

    #[tokio::test]
    async fn test_missing_or_foreign_scheme_is_unauthenticated() {
        for value in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer "), Some("Bearer")] {
            let mut builder = Request::builder();
            if let Some(value) = value {
                builder = builder.header(header::AUTHORIZATION, value);
            }
            let (mut parts, ()) = builder.body(()).expect("Valid request").into_parts();

            let err = BearerToken::from_request_parts(&mut parts, &())
                .await
                .expect_err("Should reject");
            assert_eq!(err.code(), "UNAUTHENTICATED");
        }
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(parse_bearer("bearer token"), Some("token"));
        assert_eq!(parse_bearer("BEARER  token "), Some("token"));
        assert_eq!(parse_bearer("Token token"), None);
    }
}
