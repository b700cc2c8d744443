//! Axum HTTP surface for Fest.
//!
//! This crate is the imperative shell around the booking core: it parses
//! requests, resolves the caller's identity from the bearer token, calls the
//! `fest-core` services and maps their results to HTTP responses.
//!
//! # Request Flow
//!
//! 1. **Correlate**: the middleware assigns an `X-Correlation-ID` and opens a span
//! 2. **Authenticate**: [`extractors::Caller`] verifies the bearer token into an
//!    [`fest_core::Identity`]
//! 3. **Call** the account, catalog or booking service with that identity
//! 4. **Map** the result (or [`fest_core::Error`]) to a response via [`AppError`]
//!
//! # Example
//!
//! ```ignore
//! use fest_web::{router, AppState};
//!
//! let state = AppState::new(store, hasher, authenticator, clock);
//! let app = router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{Admin, ApiJson, ApiPath, BearerToken, Caller, CorrelationId};
pub use middleware::{correlation_id_layer, CORRELATION_ID_HEADER};
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use fest_core::store::FestStore;
use handlers::{accounts, events, health};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

/// Build the application router.
///
/// Includes the correlation-id layer; the binary adds transport layers such
/// as `TraceLayer` on top.
pub fn router<S: FestStore>(state: AppState<S>) -> Router {
    let api = Router::new()
        .route("/auth/register", post(accounts::register::<S>))
        .route("/auth/login", post(accounts::login::<S>))
        .route("/auth/me", get(accounts::me::<S>))
        .route("/users", post(accounts::add_member::<S>))
        .route(
            "/events",
            get(events::list_events::<S>).post(events::create_event::<S>),
        )
        .route("/events/:id", get(events::get_event::<S>))
        .route("/events/:id/book", post(events::book::<S>))
        .route(
            "/events/:id/sub-events",
            get(events::list_sub_events::<S>).post(events::add_sub_event::<S>),
        )
        .route("/tickets", get(events::list_tickets::<S>));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness::<S>))
        .nest("/api", api)
        .fallback(|| async { AppError::not_found("route") })
        .layer(correlation_id_layer())
        .with_state(state)
}
