//! In-memory store.
//!
//! Implements every storage trait with the same guarantees the PostgreSQL
//! store gives:
//!
//! - one async mutex per event row, acquired with a bounded wait
//!   ([`StoreError::LockTimeout`] when it expires)
//! - transactions stage their writes and apply them atomically on commit;
//!   dropping a transaction discards them and releases its row locks
//! - uniqueness and capacity constraints re-checked on write as a backstop
//!
//! Failures can be injected per [`FaultPoint`] to exercise error paths.

use chrono::{DateTime, Utc};
use fest_core::store::{
    constraints, BookingStore, BookingTransaction, CatalogStore, HealthCheck, IdentityStore,
    StoreResult, TenantDirectory,
};
use fest_core::{
    Event, EventId, Organization, StoreError, SubEvent, TenantScope, Ticket, TicketStatus, User,
    UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

/// Default bounded wait for a row lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Where an injected failure fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// [`BookingStore::begin`]
    Begin,
    /// [`BookingTransaction::lock_event`], after the lock is granted
    LockEvent,
    /// [`BookingTransaction::commit`]
    Commit,
    /// [`HealthCheck::ping`]
    Ping,
}

#[derive(Default)]
struct Tables {
    organizations: Vec<Organization>,
    users: Vec<User>,
    events: Vec<Event>,
    sub_events: Vec<SubEvent>,
    tickets: Vec<Ticket>,
}

impl Tables {
    fn live_event(&self, event_id: EventId) -> Option<&Event> {
        self.events
            .iter()
            .find(|e| e.id == event_id && e.deleted_at.is_none())
    }

    fn has_booked_ticket(&self, event_id: EventId, user_id: UserId) -> bool {
        self.tickets.iter().any(|t| {
            t.event_id == event_id
                && t.user_id == user_id
                && t.status == TicketStatus::Booked
                && t.deleted_at.is_none()
        })
    }

    fn email_taken(&self, user: &User) -> bool {
        self.users.iter().any(|u| {
            u.organization_id == user.organization_id
                && u.email.eq_ignore_ascii_case(&user.email)
                && u.deleted_at.is_none()
        })
    }
}

struct Inner {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<EventId, Arc<tokio::sync::Mutex<()>>>>,
    faults: Mutex<HashMap<FaultPoint, StoreError>>,
    lock_timeout: Duration,
    commit_delay: Mutex<Option<Duration>>,
}

/// Shared in-memory store. Clones share state.
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryStore {
    /// Creates an empty store with [`DEFAULT_LOCK_TIMEOUT`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Creates an empty store with a custom row lock wait.
    #[must_use]
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
                faults: Mutex::new(HashMap::new()),
                lock_timeout,
                commit_delay: Mutex::new(None),
            }),
        }
    }

    /// Make the next call at `point` fail with `error`.
    pub fn fail_next(&self, point: FaultPoint, error: StoreError) {
        lock(&self.inner.faults).insert(point, error);
    }

    /// Sleep for `delay` inside every commit before applying writes.
    pub fn delay_commits(&self, delay: Option<Duration>) {
        *lock(&self.inner.commit_delay) = delay;
    }

    /// Seed an event directly, bypassing the catalog.
    pub fn seed_event(&self, event: Event) {
        lock(&self.inner.tables).events.push(event);
    }

    /// Current committed state of an event.
    #[must_use]
    pub fn event(&self, event_id: EventId) -> Option<Event> {
        lock(&self.inner.tables)
            .events
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
    }

    /// All committed tickets.
    #[must_use]
    pub fn tickets(&self) -> Vec<Ticket> {
        lock(&self.inner.tables).tickets.clone()
    }

    /// All committed organizations.
    #[must_use]
    pub fn organizations(&self) -> Vec<Organization> {
        lock(&self.inner.tables).organizations.clone()
    }

    /// All committed users.
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        lock(&self.inner.tables).users.clone()
    }

    fn take_fault(&self, point: FaultPoint) -> StoreResult<()> {
        match lock(&self.inner.faults).remove(&point) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn row_lock(&self, event_id: EventId) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(lock(&self.inner.row_locks).entry(event_id).or_default())
    }
}

impl TenantDirectory for InMemoryStore {
    async fn register_organization(
        &self,
        organization: &Organization,
        admin: &User,
    ) -> StoreResult<()> {
        let mut tables = lock(&self.inner.tables);
        if tables
            .organizations
            .iter()
            .any(|o| o.domain == organization.domain)
        {
            return Err(StoreError::UniqueViolation {
                constraint: constraints::ORGANIZATION_DOMAIN.to_string(),
            });
        }
        if tables.email_taken(admin) {
            return Err(StoreError::UniqueViolation {
                constraint: constraints::USER_EMAIL_PER_ORGANIZATION.to_string(),
            });
        }
        tables.organizations.push(organization.clone());
        tables.users.push(admin.clone());
        Ok(())
    }

    async fn find_organization_by_domain(&self, domain: &str) -> StoreResult<Option<Organization>> {
        Ok(lock(&self.inner.tables)
            .organizations
            .iter()
            .find(|o| o.domain == domain && o.deleted_at.is_none())
            .cloned())
    }
}

impl IdentityStore for InMemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = lock(&self.inner.tables);
        if tables.email_taken(user) {
            return Err(StoreError::UniqueViolation {
                constraint: constraints::USER_EMAIL_PER_ORGANIZATION.to_string(),
            });
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn find_user(&self, scope: &TenantScope, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(lock(&self.inner.tables)
            .users
            .iter()
            .find(|u| {
                u.id == user_id
                    && u.organization_id == scope.organization_id()
                    && u.deleted_at.is_none()
            })
            .cloned())
    }

    async fn find_login_candidates(
        &self,
        email: &str,
        domain: Option<&str>,
    ) -> StoreResult<Vec<User>> {
        let tables = lock(&self.inner.tables);
        let candidates = tables
            .users
            .iter()
            .filter(|u| u.deleted_at.is_none() && u.email.eq_ignore_ascii_case(email))
            .filter(|u| {
                tables.organizations.iter().any(|o| {
                    o.id == u.organization_id
                        && o.deleted_at.is_none()
                        && domain.is_none_or(|d| o.domain == d)
                })
            })
            .cloned()
            .collect();
        Ok(candidates)
    }
}

impl CatalogStore for InMemoryStore {
    async fn insert_event(&self, event: &Event) -> StoreResult<()> {
        lock(&self.inner.tables).events.push(event.clone());
        Ok(())
    }

    async fn list_events(&self, scope: &TenantScope) -> StoreResult<Vec<Event>> {
        Ok(lock(&self.inner.tables)
            .events
            .iter()
            .filter(|e| e.organization_id == scope.organization_id() && e.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn find_event(&self, scope: &TenantScope, event_id: EventId) -> StoreResult<Option<Event>> {
        Ok(lock(&self.inner.tables)
            .live_event(event_id)
            .filter(|e| e.organization_id == scope.organization_id())
            .cloned())
    }

    async fn insert_sub_event(&self, sub_event: &SubEvent) -> StoreResult<()> {
        lock(&self.inner.tables).sub_events.push(sub_event.clone());
        Ok(())
    }

    async fn list_sub_events(
        &self,
        scope: &TenantScope,
        event_id: EventId,
    ) -> StoreResult<Vec<SubEvent>> {
        let tables = lock(&self.inner.tables);
        if tables
            .live_event(event_id)
            .is_none_or(|e| e.organization_id != scope.organization_id())
        {
            return Ok(Vec::new());
        }
        let mut sub_events: Vec<SubEvent> = tables
            .sub_events
            .iter()
            .filter(|s| s.event_id == event_id && s.deleted_at.is_none())
            .cloned()
            .collect();
        sub_events.sort_by_key(|s| s.start_time);
        Ok(sub_events)
    }
}

impl BookingStore for InMemoryStore {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> StoreResult<MemoryTransaction> {
        self.take_fault(FaultPoint::Begin)?;
        Ok(MemoryTransaction {
            store: self.clone(),
            held: Vec::new(),
            staged_tickets: Vec::new(),
            staged_increments: Vec::new(),
        })
    }

    async fn tickets_for_user(&self, scope: &TenantScope, user_id: UserId) -> StoreResult<Vec<Ticket>> {
        let tables = lock(&self.inner.tables);
        Ok(tables
            .tickets
            .iter()
            .filter(|t| t.user_id == user_id && t.deleted_at.is_none())
            .filter(|t| {
                tables
                    .live_event(t.event_id)
                    .is_some_and(|e| e.organization_id == scope.organization_id())
            })
            .cloned()
            .collect())
    }
}

impl HealthCheck for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.take_fault(FaultPoint::Ping)
    }
}

/// Transaction over an [`InMemoryStore`].
///
/// Holds the row locks it acquired until it is committed, rolled back or
/// dropped.
pub struct MemoryTransaction {
    store: InMemoryStore,
    held: Vec<(EventId, OwnedMutexGuard<()>)>,
    staged_tickets: Vec<Ticket>,
    staged_increments: Vec<(EventId, DateTime<Utc>)>,
}

impl MemoryTransaction {
    fn staged_count(&self, event_id: EventId) -> i32 {
        let count = self
            .staged_increments
            .iter()
            .filter(|(id, _)| *id == event_id)
            .count();
        i32::try_from(count).unwrap_or(i32::MAX)
    }

    fn check_ticket(tables: &Tables, staged: &[Ticket], ticket: &Ticket) -> StoreResult<()> {
        let code_taken = tables
            .tickets
            .iter()
            .chain(staged)
            .any(|t| t.ticket_code == ticket.ticket_code);
        if code_taken {
            return Err(StoreError::UniqueViolation {
                constraint: constraints::TICKET_CODE.to_string(),
            });
        }
        let double_booked = ticket.status == TicketStatus::Booked
            && (tables.has_booked_ticket(ticket.event_id, ticket.user_id)
                || staged.iter().any(|t| {
                    t.event_id == ticket.event_id
                        && t.user_id == ticket.user_id
                        && t.status == TicketStatus::Booked
                }));
        if double_booked {
            return Err(StoreError::UniqueViolation {
                constraint: constraints::ONE_BOOKED_TICKET_PER_USER.to_string(),
            });
        }
        Ok(())
    }
}

impl BookingTransaction for MemoryTransaction {
    async fn lock_event(
        &mut self,
        scope: &TenantScope,
        event_id: EventId,
    ) -> StoreResult<Option<Event>> {
        let visible = lock(&self.store.inner.tables)
            .live_event(event_id)
            .is_some_and(|e| e.organization_id == scope.organization_id());
        if !visible {
            return Ok(None);
        }

        if !self.held.iter().any(|(id, _)| *id == event_id) {
            let row = self.store.row_lock(event_id);
            let guard = tokio::time::timeout(self.store.inner.lock_timeout, row.lock_owned())
                .await
                .map_err(|_| StoreError::LockTimeout)?;
            self.held.push((event_id, guard));
        }
        self.store.take_fault(FaultPoint::LockEvent)?;

        Ok(lock(&self.store.inner.tables)
            .live_event(event_id)
            .filter(|e| e.organization_id == scope.organization_id())
            .cloned())
    }

    async fn find_booked_ticket(
        &mut self,
        event_id: EventId,
        user_id: UserId,
    ) -> StoreResult<Option<Ticket>> {
        let staged = self
            .staged_tickets
            .iter()
            .find(|t| t.event_id == event_id && t.user_id == user_id)
            .cloned();
        if staged.is_some() {
            return Ok(staged);
        }
        Ok(lock(&self.store.inner.tables)
            .tickets
            .iter()
            .find(|t| {
                t.event_id == event_id
                    && t.user_id == user_id
                    && t.status == TicketStatus::Booked
                    && t.deleted_at.is_none()
            })
            .cloned())
    }

    async fn insert_ticket(&mut self, ticket: &Ticket) -> StoreResult<()> {
        {
            let tables = lock(&self.store.inner.tables);
            Self::check_ticket(&tables, &self.staged_tickets, ticket)?;
        }
        self.staged_tickets.push(ticket.clone());
        Ok(())
    }

    async fn increment_tickets_sold(
        &mut self,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> StoreResult<i32> {
        let (sold, capacity) = lock(&self.store.inner.tables)
            .live_event(event_id)
            .map(|e| (e.tickets_sold, e.max_capacity))
            .ok_or_else(|| StoreError::Database(format!("event {event_id} vanished")))?;

        let next = sold + self.staged_count(event_id) + 1;
        if next > capacity {
            return Err(StoreError::CheckViolation {
                constraint: constraints::EVENT_CAPACITY.to_string(),
            });
        }
        self.staged_increments.push((event_id, now));
        Ok(next)
    }

    async fn commit(self) -> StoreResult<()> {
        let delay = *lock(&self.store.inner.commit_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.store.take_fault(FaultPoint::Commit)?;

        let mut tables = lock(&self.store.inner.tables);
        for (i, ticket) in self.staged_tickets.iter().enumerate() {
            Self::check_ticket(&tables, &self.staged_tickets[..i], ticket)?;
        }
        for (event_id, _) in &self.staged_increments {
            let Some(event) = tables.live_event(*event_id) else {
                return Err(StoreError::Database(format!("event {event_id} vanished")));
            };
            if event.tickets_sold + self.staged_count(*event_id) > event.max_capacity {
                return Err(StoreError::CheckViolation {
                    constraint: constraints::EVENT_CAPACITY.to_string(),
                });
            }
        }

        for (event_id, now) in &self.staged_increments {
            if let Some(event) = tables.events.iter_mut().find(|e| e.id == *event_id) {
                event.tickets_sold += 1;
                event.updated_at = *now;
            }
        }
        tables.tickets.extend(self.staged_tickets.iter().cloned());
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}
