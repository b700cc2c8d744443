//! `PostgreSQL` store implementation for Fest.
//!
//! This crate provides [`PostgresStore`], which implements every storage
//! trait from `fest-core` on top of a sqlx connection pool:
//!
//! - Per-event row locks via `SELECT ... FOR UPDATE`, bounded by a
//!   transaction-local `lock_timeout`
//! - Atomic multi-write transactions for registration and booking
//! - Uniqueness and capacity constraints as a storage-level backstop
//! - Embedded schema migrations
//!
//! # Example
//!
//! ```ignore
//! use fest_postgres::PostgresStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresStore::connect("postgres://localhost/fest").await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod booking;
mod error;
mod rows;

pub use booking::PgBookingTransaction;

use error::store_error;
use fest_core::store::{
    BookingStore, CatalogStore, HealthCheck, IdentityStore, StoreResult, TenantDirectory,
};
use fest_core::{Event, EventId, Organization, StoreError, SubEvent, TenantScope, Ticket, User, UserId};
use rows::{
    EventRow, OrganizationRow, SubEventRow, TicketRow, UserRow, EVENT_COLUMNS,
    ORGANIZATION_COLUMNS, SUB_EVENT_COLUMNS, TICKET_COLUMNS, USER_COLUMNS,
};
use sqlx::PgPool;
use std::time::Duration;

/// Default bounded wait for a per-event row lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// `PostgreSQL`-backed store.
///
/// Cheap to clone: clones share the connection pool.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresStore {
    /// Connect to `database_url` with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the database cannot be reached.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await.map_err(store_error)?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Set the bounded wait for per-event row locks.
    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

impl TenantDirectory for PostgresStore {
    async fn register_organization(
        &self,
        organization: &Organization,
        admin: &User,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        sqlx::query(
            r"
            INSERT INTO organizations (id, name, domain, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(organization.id.as_uuid())
        .bind(&organization.name)
        .bind(&organization.domain)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        insert_user(&mut tx, admin).await?;

        tx.commit().await.map_err(store_error)
    }

    async fn find_organization_by_domain(&self, domain: &str) -> StoreResult<Option<Organization>> {
        let sql = format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations \
             WHERE domain = $1 AND deleted_at IS NULL"
        );
        let row: Option<OrganizationRow> = sqlx::query_as(&sql)
            .bind(domain)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(Organization::from))
    }
}

async fn insert_user(conn: &mut sqlx::PgConnection, user: &User) -> StoreResult<()> {
    sqlx::query(
        r"
        INSERT INTO users (id, organization_id, name, email, password, role, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ",
    )
    .bind(user.id.as_uuid())
    .bind(user.organization_id.as_uuid())
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.password.expose())
    .bind(user.role.as_str())
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(conn)
    .await
    .map_err(store_error)?;
    Ok(())
}

impl IdentityStore for PostgresStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await.map_err(store_error)?;
        insert_user(&mut conn, user).await
    }

    async fn find_user(&self, scope: &TenantScope, user_id: UserId) -> StoreResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u \
             WHERE u.id = $1 AND u.organization_id = $2 AND u.deleted_at IS NULL"
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(user_id.as_uuid())
            .bind(scope.organization_id().as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        row.map(User::try_from).transpose()
    }

    async fn find_login_candidates(
        &self,
        email: &str,
        domain: Option<&str>,
    ) -> StoreResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u \
             JOIN organizations o ON o.id = u.organization_id \
             WHERE lower(u.email) = lower($1) \
               AND u.deleted_at IS NULL AND o.deleted_at IS NULL \
               AND ($2::TEXT IS NULL OR o.domain = $2)"
        );
        let rows: Vec<UserRow> = sqlx::query_as(&sql)
            .bind(email)
            .bind(domain)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        rows.into_iter().map(User::try_from).collect()
    }
}

impl CatalogStore for PostgresStore {
    async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO events (
                id, organization_id, title, description, location, date,
                max_capacity, tickets_sold, is_fest, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(event.id.as_uuid())
        .bind(event.organization_id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.date)
        .bind(event.max_capacity)
        .bind(event.tickets_sold)
        .bind(event.is_fest)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn list_events(&self, scope: &TenantScope) -> StoreResult<Vec<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE organization_id = $1 AND deleted_at IS NULL \
             ORDER BY seq"
        );
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .bind(scope.organization_id().as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn find_event(&self, scope: &TenantScope, event_id: EventId) -> StoreResult<Option<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE id = $1 AND organization_id = $2 AND deleted_at IS NULL"
        );
        let row: Option<EventRow> = sqlx::query_as(&sql)
            .bind(event_id.as_uuid())
            .bind(scope.organization_id().as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(Event::from))
    }

    async fn insert_sub_event(&self, sub_event: &SubEvent) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO sub_events (id, event_id, title, start_time, end_time, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(sub_event.id.as_uuid())
        .bind(sub_event.event_id.as_uuid())
        .bind(&sub_event.title)
        .bind(sub_event.start_time)
        .bind(sub_event.end_time)
        .bind(sub_event.created_at)
        .bind(sub_event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn list_sub_events(
        &self,
        scope: &TenantScope,
        event_id: EventId,
    ) -> StoreResult<Vec<SubEvent>> {
        let sql = format!(
            "SELECT {SUB_EVENT_COLUMNS} FROM sub_events s \
             JOIN events e ON e.id = s.event_id \
             WHERE s.event_id = $1 AND e.organization_id = $2 \
               AND s.deleted_at IS NULL AND e.deleted_at IS NULL \
             ORDER BY s.start_time"
        );
        let rows: Vec<SubEventRow> = sqlx::query_as(&sql)
            .bind(event_id.as_uuid())
            .bind(scope.organization_id().as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(SubEvent::from).collect())
    }
}

impl BookingStore for PostgresStore {
    type Transaction = PgBookingTransaction;

    async fn begin(&self) -> StoreResult<PgBookingTransaction> {
        PgBookingTransaction::begin(&self.pool, self.lock_timeout).await
    }

    async fn tickets_for_user(&self, scope: &TenantScope, user_id: UserId) -> StoreResult<Vec<Ticket>> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets t \
             JOIN events e ON e.id = t.event_id \
             WHERE t.user_id = $1 AND e.organization_id = $2 \
               AND t.deleted_at IS NULL AND e.deleted_at IS NULL \
             ORDER BY t.seq"
        );
        let rows: Vec<TicketRow> = sqlx::query_as(&sql)
            .bind(user_id.as_uuid())
            .bind(scope.organization_id().as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        rows.into_iter().map(Ticket::try_from).collect()
    }
}

impl HealthCheck for PostgresStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
