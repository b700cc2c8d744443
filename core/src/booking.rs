//! Booking engine.
//!
//! A booking attempt for `(event, user)` moves from pending to exactly one
//! terminal state:
//!
//! ```text
//!             ┌──────────► Booked
//!             ├──────────► SoldOut
//!   Pending ──┼──────────► AlreadyBooked
//!             ├──────────► NotFound
//!             └──────────► Transient / Fatal
//! ```
//!
//! The whole attempt runs in one store transaction. The event's row lock is
//! taken *before* `tickets_sold` is read and is held until commit or abort,
//! so attempts on the same event are linearized while attempts on other
//! events never wait on each other. The duplicate check, the capacity check
//! and both writes all happen inside that exclusive section.
//!
//! Dropping the future returned by [`BookingEngine::book`] before it
//! completes drops the transaction, which aborts it.

use crate::environment::Clock;
use crate::error::{BookingError, Result, StoreError};
use crate::scope::Identity;
use crate::store::{constraints, BookingStore, BookingTransaction};
use crate::types::{EventId, Ticket};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Issues tickets under the per-event locking protocol.
pub struct BookingEngine<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: BookingStore> BookingEngine<S> {
    /// Creates a new booking engine over `store`.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Book one ticket of `event_id` for the caller.
    ///
    /// No retries are attempted; callers may retry
    /// [`BookingError::Transient`] from scratch.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the event is absent or owned by
    ///   another organization
    /// - [`BookingError::AlreadyBooked`] if the caller already holds a
    ///   booked ticket for the event
    /// - [`BookingError::SoldOut`] if no capacity remains
    /// - [`BookingError::Transient`] on lock timeout, serialization failure
    ///   or a failed commit
    /// - [`BookingError::Fatal`] if the store is unreachable
    pub async fn book(
        &self,
        identity: &Identity,
        event_id: EventId,
    ) -> std::result::Result<Ticket, BookingError> {
        let span = tracing::info_span!(
            "book",
            %event_id,
            user_id = %identity.user_id,
            organization_id = %identity.organization_id,
        );

        async move {
            let started = Instant::now();
            let result = self.attempt(identity, event_id).await;

            let outcome = match &result {
                Ok(_) => "booked",
                Err(err) => err.outcome(),
            };
            metrics::counter!("fest_bookings_total", "outcome" => outcome).increment(1);
            metrics::histogram!("fest_booking_duration_seconds")
                .record(started.elapsed().as_secs_f64());

            result
        }
        .instrument(span)
        .await
    }

    async fn attempt(
        &self,
        identity: &Identity,
        event_id: EventId,
    ) -> std::result::Result<Ticket, BookingError> {
        let scope = identity.scope();
        let mut tx = self.store.begin().await.map_err(classify)?;

        let Some(event) = tx.lock_event(&scope, event_id).await.map_err(classify)? else {
            tracing::debug!("Event not visible to caller");
            return Err(abort(tx, BookingError::NotFound).await);
        };
        if !scope.admits(&event) {
            tracing::debug!("Store returned an event outside the caller's scope");
            return Err(abort(tx, BookingError::NotFound).await);
        }

        if tx
            .find_booked_ticket(event.id, identity.user_id)
            .await
            .map_err(classify)?
            .is_some()
        {
            tracing::debug!("Caller already holds a ticket");
            return Err(abort(tx, BookingError::AlreadyBooked).await);
        }

        if event.is_sold_out() {
            tracing::debug!(
                tickets_sold = event.tickets_sold,
                max_capacity = event.max_capacity,
                "Event sold out"
            );
            return Err(abort(tx, BookingError::SoldOut).await);
        }

        let now = self.clock.now();
        let ticket = Ticket::booked(event.id, identity.user_id, now);
        tx.insert_ticket(&ticket).await.map_err(classify)?;
        let tickets_sold = tx
            .increment_tickets_sold(event.id, now)
            .await
            .map_err(classify)?;

        tx.commit().await.map_err(|err| {
            tracing::warn!(error = %err, "Booking commit failed");
            BookingError::Transient
        })?;

        tracing::info!(
            ticket_id = %ticket.id,
            ticket_code = %ticket.ticket_code,
            tickets_sold,
            "Ticket booked"
        );
        Ok(ticket)
    }

    /// The caller's tickets within their organization, in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Transient`] or [`crate::Error::Fatal`] on
    /// storage failure.
    pub async fn tickets_for(&self, identity: &Identity) -> Result<Vec<Ticket>> {
        let tickets = self
            .store
            .tickets_for_user(&identity.scope(), identity.user_id)
            .await?;
        Ok(tickets)
    }
}

/// Roll back a transaction and return the rejection that caused it.
async fn abort<T: BookingTransaction>(tx: T, reason: BookingError) -> BookingError {
    if let Err(err) = tx.rollback().await {
        tracing::warn!(error = %err, "Rollback failed; transaction discarded with its connection");
    }
    reason
}

/// Fold a store failure inside the booking transaction into the closed
/// rejection set. The transaction is dropped, and so aborted, by the caller.
fn classify(err: StoreError) -> BookingError {
    match &err {
        StoreError::LockTimeout | StoreError::SerializationFailure(_) => {
            tracing::warn!(error = %err, "Booking contention");
            BookingError::Transient
        }
        StoreError::UniqueViolation { constraint }
            if constraint == constraints::ONE_BOOKED_TICKET_PER_USER =>
        {
            BookingError::AlreadyBooked
        }
        StoreError::CheckViolation { constraint } if constraint == constraints::EVENT_CAPACITY => {
            BookingError::SoldOut
        }
        // Ticket code collision; a retry draws a fresh code.
        StoreError::UniqueViolation { constraint } if constraint == constraints::TICKET_CODE => {
            tracing::warn!(error = %err, "Ticket code collision");
            BookingError::Transient
        }
        StoreError::UniqueViolation { .. }
        | StoreError::CheckViolation { .. }
        | StoreError::Unavailable(_)
        | StoreError::Database(_) => {
            tracing::error!(error = %err, "Booking failed");
            BookingError::Fatal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contention_is_transient() {
        assert_eq!(classify(StoreError::LockTimeout), BookingError::Transient);
        assert_eq!(
            classify(StoreError::SerializationFailure("deadlock detected".into())),
            BookingError::Transient
        );
    }

    #[test]
    fn constraint_backstops_map_to_rejections() {
        assert_eq!(
            classify(StoreError::UniqueViolation {
                constraint: constraints::ONE_BOOKED_TICKET_PER_USER.into()
            }),
            BookingError::AlreadyBooked
        );
        assert_eq!(
            classify(StoreError::CheckViolation {
                constraint: constraints::EVENT_CAPACITY.into()
            }),
            BookingError::SoldOut
        );
        assert_eq!(
            classify(StoreError::UniqueViolation {
                constraint: constraints::TICKET_CODE.into()
            }),
            BookingError::Transient
        );
    }

    #[test]
    fn unreachable_store_is_fatal() {
        assert_eq!(
            classify(StoreError::Unavailable("connection refused".into())),
            BookingError::Fatal
        );
        assert_eq!(
            classify(StoreError::CheckViolation {
                constraint: "users_role_check".into()
            }),
            BookingError::Fatal
        );
    }
}
