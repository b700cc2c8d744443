//! Event catalog.
//!
//! Events are created by admins and are otherwise read-only here: the only
//! mutation an event ever sees after creation is the `tickets_sold`
//! increment performed by [`crate::booking::BookingEngine`].

use crate::environment::Clock;
use crate::error::{Error, Result};
use crate::scope::Identity;
use crate::store::CatalogStore;
use crate::types::{Event, EventId, SubEvent, SubEventId};
use crate::validation;
use serde::Deserialize;
use std::sync::Arc;

/// Input of [`EventCatalog::create_event`].
#[derive(Clone, Debug, Deserialize)]
pub struct EventDraft {
    /// Title
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Location
    #[serde(default)]
    pub location: String,
    /// RFC 3339 timestamp
    pub date: String,
    /// Capacity; must be positive
    pub max_capacity: i64,
    /// Container event that may hold sub-events
    #[serde(default)]
    pub is_fest: bool,
}

/// Input of [`EventCatalog::add_sub_event`].
#[derive(Clone, Debug, Deserialize)]
pub struct SubEventDraft {
    /// Title
    pub title: String,
    /// RFC 3339 start timestamp
    pub start_time: String,
    /// RFC 3339 end timestamp, after `start_time`
    pub end_time: String,
}

/// Tenant-scoped access to events and sub-events.
pub struct EventCatalog<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: CatalogStore> EventCatalog<S> {
    /// Creates a new catalog over `store`.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create an event owned by the caller's organization.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] unless the caller is an admin
    /// - [`Error::Validation`] for a blank title, non-positive capacity or
    ///   unparsable date
    /// - [`Error::Transient`] or [`Error::Fatal`] on storage failure
    #[tracing::instrument(skip_all, fields(organization_id = %identity.organization_id))]
    pub async fn create_event(&self, identity: &Identity, draft: EventDraft) -> Result<Event> {
        identity.require_admin()?;
        let title = validation::non_blank("title", &draft.title)?;
        let max_capacity = validation::capacity(draft.max_capacity)?;
        let date = validation::timestamp("date", &draft.date)?;

        let now = self.clock.now();
        let event = Event {
            id: EventId::new(),
            organization_id: identity.organization_id,
            title,
            description: draft.description.trim().to_string(),
            location: draft.location.trim().to_string(),
            date,
            max_capacity,
            tickets_sold: 0,
            is_fest: draft.is_fest,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.store.insert_event(&event).await?;

        metrics::counter!("fest_events_created_total").increment(1);
        tracing::info!(event_id = %event.id, max_capacity, "Event created");
        Ok(event)
    }

    /// Events of the caller's organization, in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transient`] or [`Error::Fatal`] on storage failure.
    pub async fn list_events(&self, identity: &Identity) -> Result<Vec<Event>> {
        let scope = identity.scope();
        let events = self.store.list_events(&scope).await?;
        Ok(scope.filter(events))
    }

    /// A single event of the caller's organization.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the event is absent or owned by
    /// another organization.
    pub async fn get_event(&self, identity: &Identity, event_id: EventId) -> Result<Event> {
        let scope = identity.scope();
        let found = self.store.find_event(&scope, event_id).await?;
        scope.resolve("event", found)
    }

    /// Schedule a sub-event inside a fest.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] unless the caller is an admin
    /// - [`Error::NotFound`] if the parent is not visible to the caller
    /// - [`Error::Validation`] if the parent is not a fest, the title is
    ///   blank or the time range is empty
    #[tracing::instrument(skip_all, fields(%event_id))]
    pub async fn add_sub_event(
        &self,
        identity: &Identity,
        event_id: EventId,
        draft: SubEventDraft,
    ) -> Result<SubEvent> {
        identity.require_admin()?;
        let parent = self.get_event(identity, event_id).await?;
        if !parent.is_fest {
            return Err(Error::validation("sub-events can only be added to a fest"));
        }

        let title = validation::non_blank("title", &draft.title)?;
        let start_time = validation::timestamp("start_time", &draft.start_time)?;
        let end_time = validation::timestamp("end_time", &draft.end_time)?;
        if end_time <= start_time {
            return Err(Error::validation("end_time must be after start_time"));
        }

        let now = self.clock.now();
        let sub_event = SubEvent {
            id: SubEventId::new(),
            event_id: parent.id,
            title,
            start_time,
            end_time,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.store.insert_sub_event(&sub_event).await?;

        tracing::info!(sub_event_id = %sub_event.id, "Sub-event added");
        Ok(sub_event)
    }

    /// Sub-events of a visible event, ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the event is not visible to the caller.
    pub async fn list_sub_events(
        &self,
        identity: &Identity,
        event_id: EventId,
    ) -> Result<Vec<SubEvent>> {
        let parent = self.get_event(identity, event_id).await?;
        let mut sub_events = self
            .store
            .list_sub_events(&identity.scope(), parent.id)
            .await?;
        sub_events.sort_by_key(|s| s.start_time);
        Ok(sub_events)
    }
}
