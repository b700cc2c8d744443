//! Booking transaction over a pooled connection.

use crate::error::store_error;
use crate::rows::{EventRow, TicketRow, EVENT_COLUMNS, TICKET_COLUMNS};
use chrono::{DateTime, Utc};
use fest_core::store::{BookingTransaction, StoreResult};
use fest_core::{Event, EventId, TenantScope, Ticket, UserId};
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;

/// One booking unit of work.
///
/// Dropping it without committing returns the connection to the pool, which
/// rolls the transaction back and releases its row locks.
pub struct PgBookingTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgBookingTransaction {
    pub(crate) async fn begin(pool: &PgPool, lock_timeout: Duration) -> StoreResult<Self> {
        let mut tx = pool.begin().await.map_err(store_error)?;

        // SET LOCAL does not take bind parameters; set_config(.., true) is its
        // transaction-scoped equivalent.
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        Ok(Self { tx })
    }
}

impl BookingTransaction for PgBookingTransaction {
    async fn lock_event(
        &mut self,
        scope: &TenantScope,
        event_id: EventId,
    ) -> StoreResult<Option<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL \
             FOR UPDATE"
        );
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(event_id.as_uuid())
            .bind(scope.organization_id().as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(store_error)?;
        Ok(row.map(Event::from))
    }

    async fn find_booked_ticket(
        &mut self,
        event_id: EventId,
        user_id: UserId,
    ) -> StoreResult<Option<Ticket>> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets t \
             WHERE t.event_id = $1 AND t.user_id = $2 \
               AND t.status = 'booked' AND t.deleted_at IS NULL"
        );
        let row: Option<TicketRow> = sqlx::query_as(&sql)
            .bind(event_id.as_uuid())
            .bind(user_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(store_error)?;
        row.map(Ticket::try_from).transpose()
    }

    async fn insert_ticket(&mut self, ticket: &Ticket) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO tickets (id, ticket_code, status, event_id, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(ticket.id.as_uuid())
        .bind(ticket.ticket_code.as_str())
        .bind(ticket.status.as_str())
        .bind(ticket.event_id.as_uuid())
        .bind(ticket.user_id.as_uuid())
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn increment_tickets_sold(
        &mut self,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> StoreResult<i32> {
        let (tickets_sold,): (i32,) = sqlx::query_as(
            r"
            UPDATE events
            SET tickets_sold = tickets_sold + 1, updated_at = $2
            WHERE id = $1
            RETURNING tickets_sold
            ",
        )
        .bind(event_id.as_uuid())
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(store_error)?;
        Ok(tickets_sold)
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(store_error)
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await.map_err(store_error)
    }
}
