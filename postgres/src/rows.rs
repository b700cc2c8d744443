//! Row types and their conversion into domain entities.

use chrono::{DateTime, Utc};
use fest_core::{
    Event, Organization, PasswordCredential, Role, StoreError, SubEvent, Ticket, TicketCode,
    TicketStatus, User,
};
use uuid::Uuid;

pub(crate) const ORGANIZATION_COLUMNS: &str =
    "id, name, domain, created_at, updated_at, deleted_at";

pub(crate) const USER_COLUMNS: &str =
    "u.id, u.organization_id, u.name, u.email, u.password, u.role, u.created_at, u.updated_at, u.deleted_at";

pub(crate) const EVENT_COLUMNS: &str = "id, organization_id, title, description, location, date, \
     max_capacity, tickets_sold, is_fest, created_at, updated_at, deleted_at";

pub(crate) const SUB_EVENT_COLUMNS: &str =
    "s.id, s.event_id, s.title, s.start_time, s.end_time, s.created_at, s.updated_at, s.deleted_at";

pub(crate) const TICKET_COLUMNS: &str = "t.id, t.ticket_code, t.status, t.event_id, t.user_id, \
     t.created_at, t.updated_at, t.deleted_at";

#[derive(sqlx::FromRow)]
pub(crate) struct OrganizationRow {
    id: Uuid,
    name: String,
    domain: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            domain: row.domain,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    organization_id: Uuid,
    name: String,
    email: String,
    password: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| StoreError::Database(format!("Invalid role: {}", row.role)))?;
        Ok(Self {
            id: row.id.into(),
            organization_id: row.organization_id.into(),
            name: row.name,
            email: row.email,
            password: PasswordCredential::new(row.password),
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct EventRow {
    id: Uuid,
    organization_id: Uuid,
    title: String,
    description: String,
    location: String,
    date: DateTime<Utc>,
    max_capacity: i32,
    tickets_sold: i32,
    is_fest: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id.into(),
            organization_id: row.organization_id.into(),
            title: row.title,
            description: row.description,
            location: row.location,
            date: row.date,
            max_capacity: row.max_capacity,
            tickets_sold: row.tickets_sold,
            is_fest: row.is_fest,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SubEventRow {
    id: Uuid,
    event_id: Uuid,
    title: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<SubEventRow> for SubEvent {
    fn from(row: SubEventRow) -> Self {
        Self {
            id: row.id.into(),
            event_id: row.event_id.into(),
            title: row.title,
            start_time: row.start_time,
            end_time: row.end_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TicketRow {
    id: Uuid,
    ticket_code: String,
    status: String,
    event_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status = TicketStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Database(format!("Invalid ticket status: {}", row.status)))?;
        Ok(Self {
            id: row.id.into(),
            ticket_code: TicketCode::from_string(row.ticket_code),
            status,
            event_id: row.event_id.into(),
            user_id: row.user_id.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}
