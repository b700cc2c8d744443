//! # Fest Testing
//!
//! Testing utilities for Fest.
//!
//! This crate provides:
//! - Mock implementations of the clock and credential capabilities
//! - [`InMemoryStore`], a storage backend with real per-event row locks
//! - Fixtures wiring the services together
//!
//! ## Example
//!
//! ```ignore
//! use fest_testing::Harness;
//!
//! #[tokio::test]
//! async fn books_a_ticket() {
//!     let h = Harness::new();
//!     let admin = h.tenant("acme.test").await;
//!     let event = h.event(&admin, 10).await;
//!
//!     let ticket = h.booking.book(&admin, event.id).await.unwrap();
//!     assert_eq!(ticket.event_id, event.id);
//! }
//! ```

use chrono::{DateTime, Utc};
use fest_core::environment::Clock;

pub mod fixtures;
pub mod memory;

/// Mock implementations of environment and credential traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::Duration;
    use fest_core::{Authenticator, CredentialHasher, Error, Identity, IssuedToken, PasswordCredential};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use fest_testing::mocks::FixedClock;
    /// use fest_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Reversible stand-in for a password hasher.
    ///
    /// Never use outside tests: the credential is the password with a prefix.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PlainHasher;

    impl CredentialHasher for PlainHasher {
        fn hash(&self, password: &str) -> fest_core::Result<PasswordCredential> {
            Ok(PasswordCredential::new(format!("plain${password}")))
        }

        fn verify(&self, password: &str, credential: &PasswordCredential) -> bool {
            credential.expose().strip_prefix("plain$") == Some(password)
        }
    }

    /// Mock authenticator handing out opaque tokens from a map.
    #[derive(Debug, Clone, Default)]
    pub struct MockAuthenticator {
        tokens: Arc<Mutex<HashMap<String, Identity>>>,
    }

    impl MockAuthenticator {
        /// Create an authenticator with no issued tokens.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Issue a token for `identity` without going through login.
        pub fn token_for(&self, identity: &Identity) -> String {
            let token = format!("mock-{}", uuid::Uuid::new_v4());
            self.tokens
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(token.clone(), *identity);
            token
        }
    }

    impl Authenticator for MockAuthenticator {
        fn issue(&self, identity: &Identity) -> fest_core::Result<IssuedToken> {
            Ok(IssuedToken {
                token: self.token_for(identity),
                expires_at: Utc::now() + Duration::hours(72),
            })
        }

        fn authenticate(&self, bearer: &str) -> fest_core::Result<Identity> {
            self.tokens
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(bearer)
                .copied()
                .ok_or(Error::Unauthenticated)
        }
    }
}

// Re-export commonly used items
pub use fixtures::Harness;
pub use memory::{FaultPoint, InMemoryStore, MemoryTransaction};
pub use mocks::{test_clock, FixedClock, MockAuthenticator, PlainHasher};
