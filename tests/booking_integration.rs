//! Booking engine against a real PostgreSQL.
//!
//! Run with: `cargo test --test booking_integration -- --ignored`
//! (needs Docker for testcontainers).

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use cinema_booking::{
    error::AppError,
    models::ticket::{is_seat_conflict, Ticket},
    services::{
        availability::seat_availability,
        booking::{create_order, SeatRequest},
    },
};

use common::{count, seed_hall, seed_random_movie, seed_session, seed_user, show_time, start_postgres};

fn seat(movie_session: i64, row: i32, seat: i32) -> SeatRequest {
    SeatRequest {
        row,
        seat,
        movie_session,
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn books_free_seats_then_rejects_taken_one() {
    let test_db = start_postgres().await;
    let db = &test_db.db;
    let hall = seed_hall(db, 5, 8).await;
    let movie = seed_random_movie(db).await;
    let session = seed_session(db, movie, hall, show_time(1, 18)).await;
    let user = seed_user(db, "alice", "pw").await;

    let order = create_order(&db.pool, user, &[seat(session, 1, 1), seat(session, 1, 2)])
        .await
        .expect("booking should succeed");
    assert_eq!(order.tickets.len(), 2);
    assert_eq!(order.tickets[0].movie_session.id, session);
    assert_eq!(order.tickets[0].movie_session.cinema_hall_capacity, 40);
    assert_eq!(order.tickets[1].movie_session.tickets_available, 38);

    let availability = seat_availability(&db.pool, session).await.unwrap();
    assert_eq!(availability.taken, 2);
    assert_eq!(availability.available, 38);

    let err = create_order(&db.pool, user, &[seat(session, 1, 1)])
        .await
        .unwrap_err();
    match err {
        AppError::SeatTaken(s) => assert_eq!((s.row, s.seat, s.movie_session), (1, 1, session)),
        other => panic!("expected SeatTaken, got {other:?}"),
    }
    assert_eq!(count(db, "orders").await, 1);
    assert_eq!(count(db, "tickets").await, 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn out_of_bounds_and_duplicates_persist_nothing() {
    let test_db = start_postgres().await;
    let db = &test_db.db;
    let hall = seed_hall(db, 5, 8).await;
    let movie = seed_random_movie(db).await;
    let session = seed_session(db, movie, hall, show_time(1, 18)).await;
    let user = seed_user(db, "bob", "pw").await;

    let err = create_order(&db.pool, user, &[seat(session, 6, 1)]).await.unwrap_err();
    assert!(matches!(err, AppError::OutOfBounds { .. }), "{err:?}");

    let err = create_order(&db.pool, user, &[seat(session, 2, 0)]).await.unwrap_err();
    assert!(matches!(err, AppError::OutOfBounds { .. }), "{err:?}");

    let err = create_order(&db.pool, user, &[seat(session, 2, 2), seat(session, 2, 2)])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateInRequest(_)), "{err:?}");

    // the valid first seat must not survive a later failure
    let err = create_order(&db.pool, user, &[seat(session, 3, 3), seat(session, 9, 9)])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::OutOfBounds { .. }), "{err:?}");

    assert_eq!(count(db, "orders").await, 0);
    assert_eq!(count(db, "tickets").await, 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn unknown_session_is_not_found() {
    let test_db = start_postgres().await;
    let db = &test_db.db;
    let user = seed_user(db, "carol", "pw").await;

    let err = create_order(&db.pool, user, &[seat(12345, 1, 1)]).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
    assert_eq!(count(db, "orders").await, 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn concurrent_bookings_of_one_seat_have_a_single_winner() {
    let test_db = start_postgres().await;
    let db = &test_db.db;
    let hall = seed_hall(db, 5, 8).await;
    let movie = seed_random_movie(db).await;
    let session = seed_session(db, movie, hall, show_time(2, 20)).await;

    let mut users = Vec::new();
    for i in 0..8 {
        users.push(seed_user(db, &format!("racer{i}"), "pw").await);
    }

    let handles: Vec<_> = users
        .into_iter()
        .map(|user| {
            let pool = db.pool.clone();
            tokio::spawn(async move { create_order(&pool, user, &[seat(session, 4, 4)]).await })
        })
        .collect();

    let mut won = 0;
    for handle in futures::future::join_all(handles).await {
        match handle.expect("task panicked") {
            Ok(_) => won += 1,
            Err(AppError::SeatTaken(s)) => assert_eq!((s.row, s.seat), (4, 4)),
            Err(other) => panic!("expected SeatTaken, got {other:?}"),
        }
    }

    assert_eq!(won, 1);
    assert_eq!(count(db, "orders").await, 1);
    assert_eq!(count(db, "tickets").await, 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn storage_rejects_duplicate_seat_without_app_check() {
    let test_db = start_postgres().await;
    let db = &test_db.db;
    let hall = seed_hall(db, 2, 2).await;
    let movie = seed_random_movie(db).await;
    let session = seed_session(db, movie, hall, show_time(3, 12)).await;
    let user = seed_user(db, "dave", "pw").await;

    let order = create_order(&db.pool, user, &[seat(session, 1, 1)]).await.unwrap();

    let mut conn = db.pool.acquire().await.unwrap();
    let err = Ticket::insert(&mut conn, order.id, session, 1, 1).await.unwrap_err();
    assert!(is_seat_conflict(&err), "{err:?}");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn deleting_an_order_removes_its_tickets() {
    let test_db = start_postgres().await;
    let db = &test_db.db;
    let hall = seed_hall(db, 3, 3).await;
    let movie = seed_random_movie(db).await;
    let session = seed_session(db, movie, hall, show_time(4, 19)).await;
    let user = seed_user(db, "erin", "pw").await;

    let order = create_order(&db.pool, user, &[seat(session, 1, 1), seat(session, 3, 3)])
        .await
        .unwrap();
    assert_eq!(count(db, "tickets").await, 2);

    sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(order.id)
        .execute(&db.pool)
        .await
        .unwrap();

    assert_eq!(count(db, "tickets").await, 0);
    assert_eq!(seat_availability(&db.pool, session).await.unwrap().available, 9);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn availability_plus_taken_equals_capacity() {
    let test_db = start_postgres().await;
    let db = &test_db.db;
    let hall = seed_hall(db, 4, 6).await;
    let movie = seed_random_movie(db).await;
    let session = seed_session(db, movie, hall, show_time(5, 21)).await;
    let user = seed_user(db, "frank", "pw").await;

    let batches: [&[(i32, i32)]; 4] = [&[(1, 1)], &[(1, 2), (1, 3)], &[(1, 1)], &[(4, 6), (2, 2), (3, 3)]];
    for batch in batches {
        let requested: Vec<_> = batch.iter().map(|&(r, s)| seat(session, r, s)).collect();
        let _ = create_order(&db.pool, user, &requested).await;

        let availability = seat_availability(&db.pool, session).await.unwrap();
        assert_eq!(availability.taken + availability.available, 24);
        assert!(availability.available >= 0);
    }

    assert_eq!(seat_availability(&db.pool, session).await.unwrap().taken, 6);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn one_order_may_span_several_sessions() {
    let test_db = start_postgres().await;
    let db = &test_db.db;
    let hall = seed_hall(db, 2, 2).await;
    let movie = seed_random_movie(db).await;
    let evening = seed_session(db, movie, hall, show_time(6, 18)).await;
    let night = seed_session(db, movie, hall, show_time(6, 22)).await;
    let user = seed_user(db, "grace", "pw").await;

    let order = create_order(&db.pool, user, &[seat(evening, 1, 1), seat(night, 1, 1)])
        .await
        .unwrap();

    let sessions: Vec<i64> = order.tickets.iter().map(|t| t.movie_session.id).collect();
    assert_eq!(sessions, vec![evening, night]);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn overlapping_orders_in_opposite_seat_order_never_deadlock() {
    let test_db = start_postgres().await;
    let db = &test_db.db;
    let hall = seed_hall(db, 10, 10).await;
    let movie = seed_random_movie(db).await;
    let session = seed_session(db, movie, hall, show_time(7, 20)).await;
    let first = seed_user(db, "hank", "pw").await;
    let second = seed_user(db, "ivy", "pw").await;

    for row in 1..=10 {
        let forward = vec![seat(session, row, 1), seat(session, row, 2), seat(session, row, 3)];
        let backward = vec![seat(session, row, 3), seat(session, row, 2), seat(session, row, 1)];

        let pool = db.pool.clone();
        let a = tokio::spawn(async move { create_order(&pool, first, &forward).await });
        let pool = db.pool.clone();
        let b = tokio::spawn(async move { create_order(&pool, second, &backward).await });

        let mut won = 0;
        for result in [a.await.expect("task panicked"), b.await.expect("task panicked")] {
            match result {
                Ok(order) => {
                    assert_eq!(order.tickets.len(), 3);
                    won += 1;
                }
                Err(AppError::SeatTaken(s)) => assert_eq!(s.row, row),
                Err(other) => panic!("row {row}: expected SeatTaken, got {other:?}"),
            }
        }
        assert_eq!(won, 1, "row {row}");
    }

    assert_eq!(count(db, "orders").await, 10);
    assert_eq!(count(db, "tickets").await, 30);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn capacity_of_a_huge_hall_does_not_overflow() {
    let test_db = start_postgres().await;
    let db = &test_db.db;
    let hall = seed_hall(db, 50_000, 50_000).await;
    let movie = seed_random_movie(db).await;
    let session = seed_session(db, movie, hall, show_time(8, 20)).await;
    let user = seed_user(db, "jack", "pw").await;
    let capacity = 50_000_i64 * 50_000;

    let availability = seat_availability(&db.pool, session).await.unwrap();
    assert_eq!(availability.capacity, capacity);
    assert_eq!(availability.available, capacity);

    let order = create_order(&db.pool, user, &[seat(session, 50_000, 50_000)])
        .await
        .unwrap();
    let summary = &order.tickets[0].movie_session;
    assert_eq!(summary.cinema_hall_capacity, capacity);
    assert_eq!(summary.tickets_available, capacity - 1);
}
