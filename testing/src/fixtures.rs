//! Test fixtures.
//!
//! [`Harness`] wires the three services over one [`InMemoryStore`] with
//! fast credential mocks, so tests can set up tenants in a couple of lines.

use crate::memory::InMemoryStore;
use crate::mocks::{test_clock, MockAuthenticator, PlainHasher};
use chrono::{Duration, Utc};
use fest_core::{
    AccountService, BookingEngine, Event, EventCatalog, EventDraft, EventId, Identity, NewMember,
    OrganizationId, RegisterOrganization, Registration,
};
use std::sync::Arc;

/// Default password used by fixtures.
pub const PASSWORD: &str = "correct-horse-battery";

/// An event owned by `organization_id`, not yet persisted.
#[must_use]
pub fn event_for(organization_id: OrganizationId, max_capacity: i32) -> Event {
    let now = Utc::now();
    Event {
        id: EventId::new(),
        organization_id,
        title: "Spring Fest".to_string(),
        description: "Annual spring festival".to_string(),
        location: "Main Hall".to_string(),
        date: now + Duration::days(30),
        max_capacity,
        tickets_sold: 0,
        is_fest: false,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

/// A valid event draft with the given capacity.
#[must_use]
pub fn draft(title: &str, max_capacity: i64) -> EventDraft {
    EventDraft {
        title: title.to_string(),
        description: String::new(),
        location: "Main Hall".to_string(),
        date: "2026-06-01T18:00:00Z".to_string(),
        max_capacity,
        is_fest: false,
    }
}

/// A valid registration for `domain`.
#[must_use]
pub fn registration(domain: &str) -> RegisterOrganization {
    RegisterOrganization {
        org_name: format!("Org {domain}"),
        domain: domain.to_string(),
        admin_name: "Admin".to_string(),
        admin_email: format!("admin@{domain}"),
        password: PASSWORD.to_string(),
    }
}

/// Services over a shared in-memory store.
pub struct Harness {
    /// Backing store
    pub store: InMemoryStore,
    /// Account service
    pub accounts: AccountService<InMemoryStore>,
    /// Event catalog
    pub catalog: EventCatalog<InMemoryStore>,
    /// Booking engine
    pub booking: Arc<BookingEngine<InMemoryStore>>,
    /// Token authenticator
    pub authenticator: Arc<MockAuthenticator>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// Harness over a fresh store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(InMemoryStore::new())
    }

    /// Harness over `store`.
    #[must_use]
    pub fn with_store(store: InMemoryStore) -> Self {
        let clock = Arc::new(test_clock());
        let authenticator = Arc::new(MockAuthenticator::new());
        Self {
            accounts: AccountService::new(
                store.clone(),
                Arc::new(PlainHasher),
                authenticator.clone(),
                clock.clone(),
            ),
            catalog: EventCatalog::new(store.clone(), clock.clone()),
            booking: Arc::new(BookingEngine::new(store.clone(), clock)),
            store,
            authenticator,
        }
    }

    /// Register an organization and return its admin's identity.
    ///
    /// # Panics
    ///
    /// Panics if registration fails.
    #[allow(clippy::expect_used)]
    pub async fn tenant(&self, domain: &str) -> Identity {
        let Registration { admin, .. } = self
            .accounts
            .register(registration(domain))
            .await
            .expect("registration should succeed");
        Identity::of(&admin)
    }

    /// Add a member to the admin's organization.
    ///
    /// # Panics
    ///
    /// Panics if the member cannot be created.
    #[allow(clippy::expect_used)]
    pub async fn member(&self, admin: &Identity, email: &str) -> Identity {
        let user = self
            .accounts
            .add_member(
                admin,
                NewMember {
                    name: email.to_string(),
                    email: email.to_string(),
                    password: PASSWORD.to_string(),
                },
            )
            .await
            .expect("member should be created");
        Identity::of(&user)
    }

    /// Create an event in the admin's organization.
    ///
    /// # Panics
    ///
    /// Panics if the event cannot be created.
    #[allow(clippy::expect_used)]
    pub async fn event(&self, admin: &Identity, max_capacity: i64) -> Event {
        self.catalog
            .create_event(admin, draft("Spring Fest", max_capacity))
            .await
            .expect("event should be created")
    }
}

/// Install a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
