//! # Fest Core
//!
//! Tenant model, scope guard and booking engine for Fest, a multi-tenant
//! event ticketing service.
//!
//! ## Core Concepts
//!
//! - **Identity**: the verified `(user_id, organization_id, role)` triple of
//!   a caller, passed explicitly to every operation
//! - **Tenant scope**: the only way to read or write; entities of other
//!   organizations look absent
//! - **Stores**: storage traits implemented by `fest-postgres` and the
//!   in-memory store of `fest-testing`
//! - **Services**: [`AccountService`], [`EventCatalog`] and [`BookingEngine`]
//!
//! ## Booking
//!
//! ```ignore
//! use fest_core::{BookingEngine, BookingError};
//!
//! let engine = BookingEngine::new(store, clock);
//! match engine.book(&identity, event_id).await {
//!     Ok(ticket) => println!("booked {}", ticket.ticket_code),
//!     Err(BookingError::SoldOut) => println!("sold out"),
//!     Err(BookingError::Transient) => println!("try again"),
//!     Err(other) => println!("{other}"),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accounts;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod environment;
pub mod error;
pub mod scope;
pub mod store;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use accounts::{AccountService, Credentials, NewMember, RegisterOrganization, Registration, Session};
pub use auth::{Authenticator, CredentialHasher, IssuedToken};
pub use booking::BookingEngine;
pub use catalog::{EventCatalog, EventDraft, SubEventDraft};
pub use chrono::{DateTime, Utc};
pub use environment::{Clock, SystemClock};
pub use error::{BookingError, ConflictKind, Error, Result, StoreError};
pub use scope::{Identity, TenantOwned, TenantScope};
pub use types::{
    Event, EventId, Organization, OrganizationId, PasswordCredential, Role, SubEvent, SubEventId,
    Ticket, TicketCode, TicketId, TicketStatus, User, UserId,
};
