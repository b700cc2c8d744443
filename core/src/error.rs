//! Error taxonomy for Fest.
//!
//! Three layers, narrowing as they move outward:
//!
//! - [`StoreError`]: what a storage backend reports. Backends translate
//!   driver-specific failures into this closed set.
//! - [`BookingError`]: the rejection states of a booking attempt.
//! - [`Error`]: the component-boundary taxonomy returned by every service.
//!
//! Raw storage text is carried by [`StoreError`] for logging only; neither
//! [`BookingError`] nor [`Error`] exposes it through `Display`.

use thiserror::Error;

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by a storage backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Name of the violated constraint
        constraint: String,
    },

    /// A check constraint rejected the write.
    #[error("check constraint violated: {constraint}")]
    CheckViolation {
        /// Name of the violated constraint
        constraint: String,
    },

    /// A row lock could not be acquired within the configured bound.
    #[error("lock wait timed out")]
    LockTimeout,

    /// The transaction lost a serialization race or was picked as a deadlock victim.
    #[error("serialization failure: {0}")]
    SerializationFailure(String),

    /// The store cannot be reached (closed pool, I/O failure, pool exhaustion).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Whether the failure is expected to clear on retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::LockTimeout | Self::SerializationFailure(_))
    }

    /// Name of the violated constraint, if any.
    #[must_use]
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::UniqueViolation { constraint } | Self::CheckViolation { constraint } => {
                Some(constraint)
            }
            _ => None,
        }
    }

    /// Map a violation of `constraint` to `kind`; anything else goes through
    /// the generic [`Error`] conversion.
    #[must_use]
    pub fn or_conflict(self, constraint: &str, kind: ConflictKind) -> Error {
        if self.constraint() == Some(constraint) {
            Error::Conflict(kind)
        } else {
            Error::from(self)
        }
    }
}

/// Deterministic conflicts: blind retries will not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The event has no remaining capacity.
    SoldOut,
    /// The caller already holds a booked ticket for the event.
    AlreadyBooked,
    /// Another organization already owns the domain.
    DomainTaken,
    /// The email is already registered in the organization.
    EmailTaken,
}

impl ConflictKind {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SoldOut => "SOLD_OUT",
            Self::AlreadyBooked => "ALREADY_BOOKED",
            Self::DomainTaken => "DOMAIN_TAKEN",
            Self::EmailTaken => "EMAIL_TAKEN",
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::SoldOut => "event is sold out",
            Self::AlreadyBooked => "a ticket is already booked for this event",
            Self::DomainTaken => "domain is already registered",
            Self::EmailTaken => "email is already registered in this organization",
        }
    }
}

/// Component-boundary error taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════
    // Caller errors
    // ═══════════════════════════════════════════════════════════

    /// Malformed input. Do not retry without fixing the input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing or invalid identity.
    #[error("authentication required")]
    Unauthenticated,

    /// The verified identity lacks the required role.
    #[error("insufficient permissions: {required} role required")]
    Unauthorized {
        /// Role the operation requires
        required: &'static str,
    },

    /// Absent, soft-deleted or owned by another tenant.
    #[error("{resource} not found")]
    NotFound {
        /// Kind of resource that was looked up
        resource: &'static str,
    },

    /// Deterministic conflict with current state.
    #[error("conflict: {}", .0.message())]
    Conflict(ConflictKind),

    // ═══════════════════════════════════════════════════════════
    // Infrastructure errors
    // ═══════════════════════════════════════════════════════════

    /// Lock wait or serialization timeout. Safe to retry.
    #[error("temporarily unavailable, retry the request")]
    Transient,

    /// Unrecoverable infrastructure failure.
    #[error("internal error")]
    Fatal,
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        if err.is_transient() {
            tracing::warn!(error = %err, "Transient store failure");
            Self::Transient
        } else {
            tracing::error!(error = %err, "Store failure");
            Self::Fatal
        }
    }
}

/// Rejection states of a booking attempt.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BookingError {
    /// Event absent or owned by another tenant.
    #[error("event not found")]
    NotFound,
    /// No remaining capacity.
    #[error("event is sold out")]
    SoldOut,
    /// The user already holds a booked ticket for the event.
    #[error("ticket already booked")]
    AlreadyBooked,
    /// Lock timeout, serialization failure or failed commit. Retry from scratch.
    #[error("booking temporarily unavailable")]
    Transient,
    /// Store unreachable.
    #[error("booking failed")]
    Fatal,
}

impl BookingError {
    /// Outcome label used in logs and metrics.
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::NotFound => "rejected_not_found",
            Self::SoldOut => "rejected_sold_out",
            Self::AlreadyBooked => "rejected_duplicate",
            Self::Transient => "rejected_transient",
            Self::Fatal => "failed",
        }
    }
}

impl From<BookingError> for Error {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound => Self::NotFound { resource: "event" },
            BookingError::SoldOut => Self::Conflict(ConflictKind::SoldOut),
            BookingError::AlreadyBooked => Self::Conflict(ConflictKind::AlreadyBooked),
            BookingError::Transient => Self::Transient,
            BookingError::Fatal => Self::Fatal,
        }
    }
}
