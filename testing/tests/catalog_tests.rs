//! Event catalog and tenant isolation.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use fest_core::{BookingError, Error, EventDraft, SubEventDraft};
use fest_testing::fixtures::draft;
use fest_testing::Harness;

fn fest_draft() -> EventDraft {
    EventDraft {
        is_fest: true,
        ..draft("Tech Fest", 500)
    }
}

fn slot(title: &str, start: &str, end: &str) -> SubEventDraft {
    SubEventDraft {
        title: title.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
    }
}

#[tokio::test]
async fn created_event_starts_empty_in_callers_organization() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;

    let event = h.catalog.create_event(&admin, draft("Hackathon", 50)).await.unwrap();

    assert_eq!(event.organization_id, admin.organization_id);
    assert_eq!(event.tickets_sold, 0);
    assert_eq!(event.max_capacity, 50);
    assert_eq!(event.date.to_rfc3339(), "2026-06-01T18:00:00+00:00");
}

#[tokio::test]
async fn invalid_drafts_are_rejected() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;

    let zero = draft("Hackathon", 0);
    let negative = draft("Hackathon", -3);
    let blank = draft("  ", 10);
    let bad_date = EventDraft {
        date: "tomorrow evening".to_string(),
        ..draft("Hackathon", 10)
    };

    for input in [zero, negative, blank, bad_date] {
        assert!(matches!(
            h.catalog.create_event(&admin, input).await,
            Err(Error::Validation(_))
        ));
    }
    assert!(h.catalog.list_events(&admin).await.unwrap().is_empty());
}

#[tokio::test]
async fn members_cannot_create_events() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let member = h.member(&admin, "alice@acme.test").await;

    assert_eq!(
        h.catalog.create_event(&member, draft("Party", 10)).await.unwrap_err(),
        Error::Unauthorized { required: "admin" }
    );
}

#[tokio::test]
async fn events_are_listed_in_creation_order() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    for title in ["First", "Second", "Third"] {
        h.catalog.create_event(&admin, draft(title, 10)).await.unwrap();
    }

    let titles: Vec<_> = h
        .catalog
        .list_events(&admin)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert_eq!(titles, ["First", "Second", "Third"]);
}

#[tokio::test]
async fn other_tenants_events_are_invisible() {
    let h = Harness::new();
    let acme = h.tenant("acme.test").await;
    let globex = h.tenant("globex.test").await;
    let intruder = h.member(&globex, "mallory@globex.test").await;
    let event = h.event(&acme, 10).await;
    h.event(&globex, 10).await;

    let visible = h.catalog.list_events(&intruder).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert!(visible.iter().all(|e| e.organization_id == globex.organization_id));

    assert_eq!(
        h.catalog.get_event(&intruder, event.id).await.unwrap_err(),
        Error::NotFound { resource: "event" }
    );
    assert_eq!(
        h.booking.book(&intruder, event.id).await,
        Err(BookingError::NotFound)
    );
    assert_eq!(h.store.event(event.id).unwrap().tickets_sold, 0);
    assert!(h.store.tickets().is_empty());
}

#[tokio::test]
async fn foreign_tickets_are_not_listed() {
    let h = Harness::new();
    let acme = h.tenant("acme.test").await;
    let globex = h.tenant("globex.test").await;
    let event = h.event(&acme, 10).await;
    h.booking.book(&acme, event.id).await.unwrap();

    assert!(h.booking.tickets_for(&globex).await.unwrap().is_empty());
    assert_eq!(h.booking.tickets_for(&acme).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sub_events_are_ordered_by_start() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let fest = h.catalog.create_event(&admin, fest_draft()).await.unwrap();

    h.catalog
        .add_sub_event(
            &admin,
            fest.id,
            slot("Closing", "2026-06-02T20:00:00Z", "2026-06-02T22:00:00Z"),
        )
        .await
        .unwrap();
    h.catalog
        .add_sub_event(
            &admin,
            fest.id,
            slot("Keynote", "2026-06-01T09:00:00Z", "2026-06-01T10:00:00Z"),
        )
        .await
        .unwrap();

    let titles: Vec<_> = h
        .catalog
        .list_sub_events(&admin, fest.id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.title)
        .collect();
    assert_eq!(titles, ["Keynote", "Closing"]);
}

#[tokio::test]
async fn sub_events_need_a_fest_and_a_time_range() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let plain = h.event(&admin, 10).await;
    let fest = h.catalog.create_event(&admin, fest_draft()).await.unwrap();
    let valid = slot("Talk", "2026-06-01T09:00:00Z", "2026-06-01T10:00:00Z");

    assert!(matches!(
        h.catalog.add_sub_event(&admin, plain.id, valid.clone()).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        h.catalog
            .add_sub_event(
                &admin,
                fest.id,
                slot("Backwards", "2026-06-01T10:00:00Z", "2026-06-01T09:00:00Z"),
            )
            .await,
        Err(Error::Validation(_))
    ));

    let member = h.member(&admin, "alice@acme.test").await;
    assert_eq!(
        h.catalog
            .add_sub_event(&member, fest.id, valid)
            .await
            .unwrap_err(),
        Error::Unauthorized { required: "admin" }
    );
}

#[tokio::test]
async fn sub_events_of_foreign_fest_are_not_found() {
    let h = Harness::new();
    let acme = h.tenant("acme.test").await;
    let globex = h.tenant("globex.test").await;
    let fest = h.catalog.create_event(&acme, fest_draft()).await.unwrap();

    assert_eq!(
        h.catalog.list_sub_events(&globex, fest.id).await.unwrap_err(),
        Error::NotFound { resource: "event" }
    );
    assert_eq!(
        h.catalog
            .add_sub_event(
                &globex,
                fest.id,
                slot("Hijack", "2026-06-01T09:00:00Z", "2026-06-01T10:00:00Z"),
            )
            .await
            .unwrap_err(),
        Error::NotFound { resource: "event" }
    );
}
