//! Property tests: the booking engine against a sequential model.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use fest_core::BookingError;
use fest_testing::Harness;
use proptest::prelude::*;
use std::collections::HashSet;

const USERS: usize = 6;

/// Expected outcome of one attempt, given who already holds a ticket.
fn model(booked: &HashSet<usize>, capacity: usize, user: usize) -> Result<(), BookingError> {
    if booked.contains(&user) {
        Err(BookingError::AlreadyBooked)
    } else if booked.len() >= capacity {
        Err(BookingError::SoldOut)
    } else {
        Ok(())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn sequential_bookings_match_model(
        capacity in 1usize..5,
        attempts in prop::collection::vec(0..USERS, 1..20),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let h = Harness::new();
            let admin = h.tenant("acme.test").await;
            let event = h.event(&admin, i64::try_from(capacity).unwrap()).await;
            let mut users = Vec::with_capacity(USERS);
            for i in 0..USERS {
                users.push(h.member(&admin, &format!("user{i}@acme.test")).await);
            }

            let mut booked = HashSet::new();
            for user in attempts {
                let expected = model(&booked, capacity, user);
                let actual = h.booking.book(&users[user], event.id).await.map(|_| ());
                prop_assert_eq!(actual, expected);
                if expected.is_ok() {
                    booked.insert(user);
                }

                let stored = h.store.event(event.id).unwrap();
                prop_assert_eq!(usize::try_from(stored.tickets_sold).unwrap(), booked.len());
                prop_assert!(stored.tickets_sold <= stored.max_capacity);
            }
            prop_assert_eq!(h.store.tickets().len(), booked.len());
            Ok(())
        })?;
    }
}
