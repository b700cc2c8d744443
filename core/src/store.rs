//! Storage traits.
//!
//! The persistent store is an external collaborator. It must provide
//! row-level exclusive locks scoped to a single record, atomic multi-write
//! transactions with commit/abort, and uniqueness constraints as a backstop
//! for the invariants the services check.
//!
//! Every read that runs on behalf of a caller takes a [`TenantScope`]; the
//! single exception is [`IdentityStore::find_login_candidates`], which runs
//! before a caller has an identity.
//!
//! Traits use `impl Future + Send` returns so implementations can be written
//! with `async fn` and generic services stay usable from multi-threaded
//! runtimes.

use crate::error::StoreError;
use crate::scope::TenantScope;
use crate::types::{Event, EventId, Organization, SubEvent, Ticket, User, UserId};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Result type alias for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Constraint names shared by every backend.
///
/// Stores report violations using these names so services can map them to
/// conflicts without knowing the backend.
pub mod constraints {
    /// Unique organization domain.
    pub const ORGANIZATION_DOMAIN: &str = "organizations_domain_key";
    /// Unique email within an organization.
    pub const USER_EMAIL_PER_ORGANIZATION: &str = "users_organization_email_key";
    /// Unique ticket code.
    pub const TICKET_CODE: &str = "tickets_ticket_code_key";
    /// At most one booked ticket per (event, user).
    pub const ONE_BOOKED_TICKET_PER_USER: &str = "tickets_one_booked_per_user";
    /// `0 <= tickets_sold <= max_capacity`.
    pub const EVENT_CAPACITY: &str = "events_capacity_check";
}

/// Owns organization records.
pub trait TenantDirectory: Send + Sync {
    /// Persist a new organization together with its first admin.
    ///
    /// Both rows are written in one transaction: either both persist or
    /// neither does.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] naming
    /// [`constraints::ORGANIZATION_DOMAIN`] if the domain is taken.
    fn register_organization(
        &self,
        organization: &Organization,
        admin: &User,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Look up a live organization by its domain.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_organization_by_domain(
        &self,
        domain: &str,
    ) -> impl Future<Output = StoreResult<Option<Organization>>> + Send;
}

/// Owns user records scoped to a tenant.
pub trait IdentityStore: Send + Sync {
    /// Persist a user into its organization.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] naming
    /// [`constraints::USER_EMAIL_PER_ORGANIZATION`] for a duplicate email.
    fn insert_user(&self, user: &User) -> impl Future<Output = StoreResult<()>> + Send;

    /// Look up a live user inside the scope.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_user(
        &self,
        scope: &TenantScope,
        user_id: UserId,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    /// All live users registered with `email` (already normalized) in any
    /// live organization. Narrowed to the organization owning `domain` when
    /// one is given.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_login_candidates(
        &self,
        email: &str,
        domain: Option<&str>,
    ) -> impl Future<Output = StoreResult<Vec<User>>> + Send;
}

/// Owns event and sub-event records.
pub trait CatalogStore: Send + Sync {
    /// Persist a new event.
    ///
    /// # Errors
    ///
    /// Returns error if the write fails.
    fn insert_event(&self, event: &Event) -> impl Future<Output = StoreResult<()>> + Send;

    /// Live events of the scope, in creation order.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn list_events(
        &self,
        scope: &TenantScope,
    ) -> impl Future<Output = StoreResult<Vec<Event>>> + Send;

    /// A live event of the scope.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_event(
        &self,
        scope: &TenantScope,
        event_id: EventId,
    ) -> impl Future<Output = StoreResult<Option<Event>>> + Send;

    /// Persist a sub-event. The parent must already have been resolved in scope.
    ///
    /// # Errors
    ///
    /// Returns error if the write fails.
    fn insert_sub_event(&self, sub_event: &SubEvent)
    -> impl Future<Output = StoreResult<()>> + Send;

    /// Live sub-events of a live event of the scope, ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn list_sub_events(
        &self,
        scope: &TenantScope,
        event_id: EventId,
    ) -> impl Future<Output = StoreResult<Vec<SubEvent>>> + Send;
}

/// Entry point into the booking protocol.
pub trait BookingStore: Send + Sync {
    /// One atomic unit of work.
    type Transaction: BookingTransaction;

    /// Open a transaction.
    ///
    /// # Errors
    ///
    /// Returns error if no connection is available.
    fn begin(&self) -> impl Future<Output = StoreResult<Self::Transaction>> + Send;

    /// The user's tickets for events of the scope, in creation order.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn tickets_for_user(
        &self,
        scope: &TenantScope,
        user_id: UserId,
    ) -> impl Future<Output = StoreResult<Vec<Ticket>>> + Send;
}

/// A single booking unit of work.
///
/// Dropping a transaction without calling [`BookingTransaction::commit`]
/// aborts it: no staged write survives and every lock is released.
pub trait BookingTransaction: Send {
    /// Acquire the exclusive row lock of a live event of the scope and read
    /// its current state.
    ///
    /// Blocks while another transaction holds the same event's lock and
    /// never blocks on other events. Returns `None` if the event is absent
    /// or outside the scope.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockTimeout`] if the lock is not granted within
    /// the store's bounded wait.
    fn lock_event(
        &mut self,
        scope: &TenantScope,
        event_id: EventId,
    ) -> impl Future<Output = StoreResult<Option<Event>>> + Send;

    /// The booked ticket of `user_id` for `event_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn find_booked_ticket(
        &mut self,
        event_id: EventId,
        user_id: UserId,
    ) -> impl Future<Output = StoreResult<Option<Ticket>>> + Send;

    /// Stage a new ticket.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if a constraint backstop fires.
    fn insert_ticket(&mut self, ticket: &Ticket) -> impl Future<Output = StoreResult<()>> + Send;

    /// Stage `tickets_sold = tickets_sold + 1` and return the new count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CheckViolation`] naming
    /// [`constraints::EVENT_CAPACITY`] if the increment would oversell.
    fn increment_tickets_sold(
        &mut self,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<i32>> + Send;

    /// Apply every staged write atomically and release the lock.
    ///
    /// # Errors
    ///
    /// Returns error if the commit fails; nothing staged is applied.
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Discard every staged write and release the lock.
    ///
    /// # Errors
    ///
    /// Returns error if the rollback could not be sent; the store still
    /// discards the work when the connection is recycled.
    fn rollback(self) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Store connectivity probe.
pub trait HealthCheck: Send + Sync {
    /// Round-trip to the store.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn ping(&self) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Everything the services need from a single backend.
pub trait FestStore:
    TenantDirectory + IdentityStore + CatalogStore + BookingStore + HealthCheck + Clone + 'static
{
}

impl<T> FestStore for T where
    T: TenantDirectory + IdentityStore + CatalogStore + BookingStore + HealthCheck + Clone + 'static
{
}
