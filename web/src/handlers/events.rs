//! Event catalog and booking endpoints.

use crate::extractors::{Admin, ApiJson, ApiPath, Caller};
use crate::state::AppState;
use crate::WebResult;
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use fest_core::store::FestStore;
use fest_core::{Event, EventDraft, EventId, SubEvent, SubEventDraft, Ticket};

/// Create an event in the admin's organization.
///
/// ```text
/// POST /api/events
/// ```
pub async fn create_event<S: FestStore>(
    State(state): State<AppState<S>>,
    Admin(identity): Admin,
    ApiJson(draft): ApiJson<EventDraft>,
) -> WebResult<(StatusCode, Json<Event>)> {
    let event = state.catalog.create_event(&identity, draft).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Events of the caller's organization.
///
/// ```text
/// GET /api/events
/// ```
pub async fn list_events<S: FestStore>(
    State(state): State<AppState<S>>,
    Caller(identity): Caller,
) -> WebResult<Json<Vec<Event>>> {
    Ok(Json(state.catalog.list_events(&identity).await?))
}

/// One event of the caller's organization.
///
/// ```text
/// GET /api/events/:id
/// ```
pub async fn get_event<S: FestStore>(
    State(state): State<AppState<S>>,
    Caller(identity): Caller,
    ApiPath(event_id): ApiPath<EventId>,
) -> WebResult<Json<Event>> {
    Ok(Json(state.catalog.get_event(&identity, event_id).await?))
}

/// Book one ticket for the caller.
///
/// 201 with the ticket on success; 404, 409 (`SOLD_OUT` or
/// `ALREADY_BOOKED`), 503 or 500 otherwise.
///
/// ```text
/// POST /api/events/:id/book
/// ```
pub async fn book<S: FestStore>(
    State(state): State<AppState<S>>,
    Caller(identity): Caller,
    ApiPath(event_id): ApiPath<EventId>,
) -> WebResult<(StatusCode, Json<Ticket>)> {
    let ticket = state.booking.book(&identity, event_id).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Add a scheduled slot to a fest.
///
/// ```text
/// POST /api/events/:id/sub-events
/// ```
pub async fn add_sub_event<S: FestStore>(
    State(state): State<AppState<S>>,
    Admin(identity): Admin,
    ApiPath(event_id): ApiPath<EventId>,
    ApiJson(draft): ApiJson<SubEventDraft>,
) -> WebResult<(StatusCode, Json<SubEvent>)> {
    let sub_event = state
        .catalog
        .add_sub_event(&identity, event_id, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(sub_event)))
}

/// Slots of a fest ordered by start time.
///
/// ```text
/// GET /api/events/:id/sub-events
/// ```
pub async fn list_sub_events<S: FestStore>(
    State(state): State<AppState<S>>,
    Caller(identity): Caller,
    ApiPath(event_id): ApiPath<EventId>,
) -> WebResult<Json<Vec<SubEvent>>> {
    Ok(Json(
        state.catalog.list_sub_events(&identity, event_id).await?,
    ))
}

/// The caller's tickets.
///
/// ```text
/// GET /api/tickets
/// ```
pub async fn list_tickets<S: FestStore>(
    State(state): State<AppState<S>>,
    Caller(identity): Caller,
) -> WebResult<Json<Vec<Ticket>>> {
    Ok(Json(state.booking.tickets_for(&identity).await?))
}
