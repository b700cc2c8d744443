//! Application state for Axum handlers.

use fest_core::store::FestStore;
use fest_core::{
    AccountService, Authenticator, BookingEngine, Clock, CredentialHasher, EventCatalog,
};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Generic over the store so the same router serves `PostgresStore` in
/// production and `InMemoryStore` in tests.
pub struct AppState<S> {
    /// Registration, login and membership
    pub accounts: Arc<AccountService<S>>,
    /// Events and sub-events
    pub catalog: Arc<EventCatalog<S>>,
    /// Booking state machine
    pub booking: Arc<BookingEngine<S>>,
    /// Bearer verification for the identity extractors
    pub authenticator: Arc<dyn Authenticator>,
    /// Backing store, used for readiness checks
    pub store: S,
}

impl<S: FestStore> AppState<S> {
    /// Wire the services over one store.
    #[must_use]
    pub fn new(
        store: S,
        hasher: Arc<dyn CredentialHasher>,
        authenticator: Arc<dyn Authenticator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(
                store.clone(),
                hasher,
                Arc::clone(&authenticator),
                Arc::clone(&clock),
            )),
            catalog: Arc::new(EventCatalog::new(store.clone(), Arc::clone(&clock))),
            booking: Arc::new(BookingEngine::new(store.clone(), clock)),
            authenticator,
            store,
        }
    }
}

// Manual impl: `S: Clone` only, not a derive's bound on every field type.
impl<S: Clone> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            catalog: Arc::clone(&self.catalog),
            booking: Arc::clone(&self.booking),
            authenticator: Arc::clone(&self.authenticator),
            store: self.store.clone(),
        }
    }
}
