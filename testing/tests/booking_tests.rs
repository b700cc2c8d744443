//! Booking engine behavior under concurrency, faults and cancellation.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect
#![allow(clippy::panic)]

use fest_core::store::{BookingStore, BookingTransaction};
use fest_core::{BookingError, EventId, StoreError};
use fest_testing::fixtures::init_tracing;
use fest_testing::{FaultPoint, Harness, InMemoryStore};
use std::collections::HashSet;
use std::time::Duration;

async fn members(h: &Harness, admin: &fest_core::Identity, count: usize) -> Vec<fest_core::Identity> {
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        out.push(h.member(admin, &format!("user{i}@acme.test")).await);
    }
    out
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_never_oversell() {
    init_tracing();
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let event = h.event(&admin, 5).await;
    let event_id = event.id;
    let users = members(&h, &admin, 20).await;

    let handles: Vec<_> = users
        .into_iter()
        .map(|user| {
            let engine = h.booking.clone();
            tokio::spawn(async move { engine.book(&user, event_id).await })
        })
        .collect();

    let mut booked = Vec::new();
    let mut sold_out = 0;
    for result in futures::future::join_all(handles).await {
        match result.unwrap() {
            Ok(ticket) => booked.push(ticket),
            Err(BookingError::SoldOut) => sold_out += 1,
            Err(other) => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(booked.len(), 5);
    assert_eq!(sold_out, 15);
    assert_eq!(h.store.event(event.id).unwrap().tickets_sold, 5);
    assert_eq!(h.store.tickets().len(), 5);

    let codes: HashSet<_> = booked.iter().map(|t| t.ticket_code.clone()).collect();
    assert_eq!(codes.len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_users_race_for_the_last_seat() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let event = h.event(&admin, 1).await;
    let event_id = event.id;
    let alice = h.member(&admin, "alice@acme.test").await;
    let bob = h.member(&admin, "bob@acme.test").await;

    let (a, b) = tokio::join!(
        tokio::spawn({
            let engine = h.booking.clone();
            async move { engine.book(&alice, event_id).await }
        }),
        tokio::spawn({
            let engine = h.booking.clone();
            async move { engine.book(&bob, event_id).await }
        }),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, Err(BookingError::SoldOut)))
            .count(),
        1
    );
    assert_eq!(h.store.event(event.id).unwrap().tickets_sold, 1);
}

#[tokio::test]
async fn second_booking_is_a_duplicate() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let event = h.event(&admin, 10).await;
    let alice = h.member(&admin, "alice@acme.test").await;

    let ticket = h.booking.book(&alice, event.id).await.unwrap();
    assert_eq!(ticket.user_id, alice.user_id);
    assert_eq!(ticket.status, fest_core::TicketStatus::Booked);

    assert_eq!(
        h.booking.book(&alice, event.id).await,
        Err(BookingError::AlreadyBooked)
    );
    assert_eq!(h.store.event(event.id).unwrap().tickets_sold, 1);
    assert_eq!(h.store.tickets().len(), 1);
}

#[tokio::test]
async fn holder_of_last_seat_sees_duplicate_not_sold_out() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let event = h.event(&admin, 1).await;

    h.booking.book(&admin, event.id).await.unwrap();
    assert_eq!(
        h.booking.book(&admin, event.id).await,
        Err(BookingError::AlreadyBooked)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicates_yield_one_ticket() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let event = h.event(&admin, 10).await;
    let event_id = event.id;
    let alice = h.member(&admin, "alice@acme.test").await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = h.booking.clone();
            tokio::spawn(async move { engine.book(&alice, event_id).await })
        })
        .collect();
    let outcomes: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter(|o| o.is_err())
        .all(|o| *o == Err(BookingError::AlreadyBooked)));
    assert_eq!(h.store.event(event.id).unwrap().tickets_sold, 1);
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;

    assert_eq!(
        h.booking.book(&admin, EventId::new()).await,
        Err(BookingError::NotFound)
    );
}

#[tokio::test]
async fn failed_commit_leaves_no_partial_state() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let event = h.event(&admin, 3).await;

    h.store
        .fail_next(FaultPoint::Commit, StoreError::Database("disk full".into()));
    assert_eq!(
        h.booking.book(&admin, event.id).await,
        Err(BookingError::Transient)
    );
    assert!(h.store.tickets().is_empty());
    assert_eq!(h.store.event(event.id).unwrap().tickets_sold, 0);

    // Lock was released and the retry starts from scratch.
    h.booking.book(&admin, event.id).await.unwrap();
    assert_eq!(h.store.event(event.id).unwrap().tickets_sold, 1);
}

#[tokio::test]
async fn lock_wait_timeout_is_transient() {
    let h = Harness::with_store(InMemoryStore::with_lock_timeout(Duration::from_millis(50)));
    let admin = h.tenant("acme.test").await;
    let event = h.event(&admin, 3).await;

    let mut holder = h.store.begin().await.unwrap();
    holder.lock_event(&admin.scope(), event.id).await.unwrap();

    assert_eq!(
        h.booking.book(&admin, event.id).await,
        Err(BookingError::Transient)
    );

    holder.rollback().await.unwrap();
    h.booking.book(&admin, event.id).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn contention_is_per_event() {
    let h = Harness::with_store(InMemoryStore::with_lock_timeout(Duration::from_secs(30)));
    let admin = h.tenant("acme.test").await;
    let busy = h.event(&admin, 3).await;
    let idle = h.event(&admin, 3).await;

    let mut holder = h.store.begin().await.unwrap();
    holder.lock_event(&admin.scope(), busy.id).await.unwrap();

    let other = tokio::time::timeout(Duration::from_secs(1), h.booking.book(&admin, idle.id))
        .await
        .expect("booking another event must not wait on the held lock");
    assert!(other.is_ok());

    let blocked = tokio::time::timeout(Duration::from_millis(100), h.booking.book(&admin, busy.id)).await;
    assert!(blocked.is_err(), "booking the locked event should wait");

    drop(holder);
    h.booking.book(&admin, busy.id).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_booking_leaves_no_state() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let event = h.event(&admin, 3).await;
    let event_id = event.id;

    h.store.delay_commits(Some(Duration::from_secs(30)));
    let engine = h.booking.clone();
    let attempt = tokio::spawn(async move { engine.book(&admin, event_id).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    attempt.abort();
    assert!(attempt.await.unwrap_err().is_cancelled());

    h.store.delay_commits(None);
    assert!(h.store.tickets().is_empty());
    assert_eq!(h.store.event(event.id).unwrap().tickets_sold, 0);

    let ticket = tokio::time::timeout(Duration::from_secs(1), h.booking.book(&admin, event.id))
        .await
        .expect("row lock must be released by the cancelled attempt");
    assert!(ticket.is_ok());
}

#[tokio::test]
async fn unreachable_store_is_fatal() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let event = h.event(&admin, 3).await;

    h.store.fail_next(
        FaultPoint::Begin,
        StoreError::Unavailable("connection refused".into()),
    );
    assert_eq!(h.booking.book(&admin, event.id).await, Err(BookingError::Fatal));
}

#[tokio::test]
async fn serialization_failure_is_transient() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let event = h.event(&admin, 3).await;

    h.store.fail_next(
        FaultPoint::LockEvent,
        StoreError::SerializationFailure("deadlock detected".into()),
    );
    assert_eq!(
        h.booking.book(&admin, event.id).await,
        Err(BookingError::Transient)
    );
    assert_eq!(h.store.event(event.id).unwrap().tickets_sold, 0);
}

#[tokio::test]
async fn tickets_for_lists_only_own_tickets() {
    let h = Harness::new();
    let admin = h.tenant("acme.test").await;
    let alice = h.member(&admin, "alice@acme.test").await;
    let first = h.event(&admin, 3).await;
    let second = h.event(&admin, 3).await;

    h.booking.book(&alice, first.id).await.unwrap();
    h.booking.book(&alice, second.id).await.unwrap();
    h.booking.book(&admin, first.id).await.unwrap();

    let mine = h.booking.tickets_for(&alice).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|t| t.user_id == alice.user_id));
    assert_eq!(mine[0].event_id, first.id);
    assert_eq!(mine[1].event_id, second.id);
}
