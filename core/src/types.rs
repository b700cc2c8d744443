//! Domain types for Fest.
//!
//! Identifiers, entities and value objects shared by every crate in the
//! workspace. Every entity carries its identifier, creation and update
//! timestamps and a soft-delete marker, and every entity below
//! [`Organization`] holds a non-nullable reference to its owning tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(
    /// Unique identifier for an organization (tenant)
    OrganizationId
);
define_id!(
    /// Unique identifier for a user
    UserId
);
define_id!(
    /// Unique identifier for an event
    EventId
);
define_id!(
    /// Unique identifier for a sub-event of a fest
    SubEventId
);
define_id!(
    /// Unique identifier for a ticket
    TicketId
);

// ============================================================================
// Value Objects
// ============================================================================

/// Role of a user inside its organization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages events and members of the organization.
    Admin,
    /// Regular member; may browse and book.
    Member,
}

impl Role {
    /// Convert role to its storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    /// Parse role from its storage representation.
    ///
    /// Returns `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            _ => None,
        }
    }

    /// Whether this role may manage the organization's catalog and members.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a ticket.
///
/// Only [`TicketStatus::Booked`] is produced by the booking engine; the other
/// states exist in storage for cancellation and check-in flows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    /// Ticket holds a seat.
    Booked,
    /// Ticket was cancelled.
    Cancelled,
    /// Ticket holder was admitted.
    CheckedIn,
}

impl TicketStatus {
    /// Convert status to its storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::Cancelled => "cancelled",
            Self::CheckedIn => "checked-in",
        }
    }

    /// Parse status from its storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booked" => Some(Self::Booked),
            "cancelled" => Some(Self::Cancelled),
            "checked-in" => Some(Self::CheckedIn),
            _ => None,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Globally unique, opaque ticket code handed to the ticket holder.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketCode(String);

impl TicketCode {
    /// Generate a fresh ticket code.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("TKT-{}", Uuid::new_v4().simple()).to_uppercase())
    }

    /// Wrap a code loaded from storage.
    #[must_use]
    pub const fn from_string(code: String) -> Self {
        Self(code)
    }

    /// Borrow the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque password credential produced by a [`crate::auth::CredentialHasher`].
///
/// `Debug` is redacted so credentials never reach logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordCredential(String);

impl PasswordCredential {
    /// Wrap an encoded credential.
    #[must_use]
    pub const fn new(encoded: String) -> Self {
        Self(encoded)
    }

    /// Borrow the encoded credential.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordCredential(<redacted>)")
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A tenant. Root of ownership for users and events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization ID
    pub id: OrganizationId,
    /// Display name
    pub name: String,
    /// Globally unique, immutable domain used for tenant resolution
    pub domain: String,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A user scoped to exactly one organization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Owning organization (immutable)
    pub organization_id: OrganizationId,
    /// Display name
    pub name: String,
    /// Email, unique within the owning organization
    pub email: String,
    /// Opaque password credential
    pub password: PasswordCredential,
    /// Role within the organization
    pub role: Role,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An event with a fixed ticket capacity.
///
/// `tickets_sold` is owned by the booking engine: it starts at zero and is
/// only ever incremented inside a booking transaction that holds the event's
/// row lock. `0 <= tickets_sold <= max_capacity` holds at all times.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Location
    pub location: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Capacity, fixed at creation
    pub max_capacity: i32,
    /// Tickets booked so far
    pub tickets_sold: i32,
    /// Marks a container event holding sub-events
    pub is_fest: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Seats still available.
    #[must_use]
    pub const fn remaining(&self) -> i32 {
        self.max_capacity.saturating_sub(self.tickets_sold)
    }

    /// Whether every seat has been booked.
    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        self.remaining() <= 0
    }
}

/// A scheduled slot inside a fest event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubEvent {
    /// Sub-event ID
    pub id: SubEventId,
    /// Parent event
    pub event_id: EventId,
    /// Title
    pub title: String,
    /// Start time
    pub start_time: DateTime<Utc>,
    /// End time (after `start_time`)
    pub end_time: DateTime<Utc>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A booked seat linking one user to one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket ID
    pub id: TicketId,
    /// Globally unique code
    pub ticket_code: TicketCode,
    /// Status
    pub status: TicketStatus,
    /// Event the ticket admits to
    pub event_id: EventId,
    /// Ticket holder
    pub user_id: UserId,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// A fresh booked ticket with a newly generated code.
    #[must_use]
    pub fn booked(event_id: EventId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: TicketId::new(),
            ticket_code: TicketCode::generate(),
            status: TicketStatus::Booked,
            event_id,
            user_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
