//! Booking engine: seat validation and atomic order creation.
//!
//! All requested tickets are checked against the hall grid and the seats
//! already taken before anything is written, then the order and its tickets
//! are inserted in one transaction. The unique index on
//! (movie_session_id, row, seat) is the final arbiter: when a concurrent
//! booking commits the same seat first, the insert fails and the whole
//! transaction is rolled back.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult, SeatRef},
    models::{
        ticket::{is_lock_conflict, is_missing_reference, is_seat_conflict},
        MovieSession, Order, OrderDetail, SeatGrid, Ticket,
    },
};

/// One requested ticket: a seat triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatRequest {
    pub row: i32,
    pub seat: i32,
    pub movie_session: i64,
}

impl SeatRequest {
    pub fn key(&self) -> (i64, i32, i32) {
        (self.movie_session, self.row, self.seat)
    }

    fn at(&self, index: usize) -> SeatRef {
        SeatRef {
            index: Some(index),
            movie_session: self.movie_session,
            row: self.row,
            seat: self.seat,
        }
    }
}

/// Checks every requested seat, in request order, and reports the first violation.
///
/// For each seat: the session must exist (`NotFound`), the seat must lie inside
/// the hall (`OutOfBounds`), must not be booked already (`SeatTaken`) and must
/// not repeat an earlier seat of the same request (`DuplicateInRequest`).
pub fn validate_seats(
    grids: &HashMap<i64, SeatGrid>,
    taken: &HashSet<(i64, i32, i32)>,
    requested: &[SeatRequest],
) -> AppResult<()> {
    let mut seen = HashSet::with_capacity(requested.len());

    for (index, req) in requested.iter().enumerate() {
        let grid = grids
            .get(&req.movie_session)
            .ok_or_else(|| AppError::not_found("Movie session", req.movie_session))?;

        if !grid.contains(req.row, req.seat) {
            return Err(AppError::OutOfBounds {
                seat: req.at(index),
                rows: grid.rows,
                seats_in_row: grid.seats_in_row,
            });
        }
        if taken.contains(&req.key()) {
            return Err(AppError::SeatTaken(req.at(index)));
        }
        if !seen.insert(req.key()) {
            return Err(AppError::DuplicateInRequest(req.at(index)));
        }
    }

    Ok(())
}

/// Creates one order owned by `user_id` holding one ticket per requested seat.
///
/// Either every ticket is persisted or none is.
pub async fn create_order(
    pool: &PgPool,
    user_id: i64,
    requested: &[SeatRequest],
) -> AppResult<OrderDetail> {
    if requested.is_empty() {
        return Err(AppError::MalformedInput(
            "tickets: at least one ticket is required".to_string(),
        ));
    }

    let mut session_ids: Vec<i64> = requested.iter().map(|r| r.movie_session).collect();
    session_ids.sort_unstable();
    session_ids.dedup();

    // Dropping the transaction on any early return rolls it back
    let mut tx = pool.begin().await?;

    let grids: HashMap<i64, SeatGrid> = MovieSession::seat_grids(&mut *tx, &session_ids)
        .await?
        .into_iter()
        .collect();
    let taken = Ticket::taken_in_sessions(&mut *tx, &session_ids).await?;

    if let Err(e) = validate_seats(&grids, &taken, requested) {
        info!(user_id, error = %e, "booking rejected");
        return Err(e);
    }

    let order = Order::insert(&mut *tx, user_id).await?;
    for (index, req) in insertion_order(requested) {
        Ticket::insert(&mut *tx, order.id, req.movie_session, req.row, req.seat)
            .await
            .map_err(|e| ticket_insert_error(e, req.at(index)))?;
    }

    tx.commit().await?;
    info!(
        order_id = order.id,
        user_id,
        tickets = requested.len(),
        "order created"
    );

    Order::find_detail(pool, order.id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("order {} vanished after commit", order.id)))
}

/// Requested seats sorted by (session, row, seat), each with its request index.
///
/// Concurrent orders lock index entries in the same order, so overlapping
/// bookings queue on the first shared seat instead of deadlocking.
fn insertion_order(requested: &[SeatRequest]) -> Vec<(usize, &SeatRequest)> {
    let mut ordered: Vec<_> = requested.iter().enumerate().collect();
    ordered.sort_by_key(|(_, req)| req.key());
    ordered
}

fn ticket_insert_error(err: sqlx::Error, seat: SeatRef) -> AppError {
    if is_seat_conflict(&err) || is_lock_conflict(&err) {
        warn!(
            movie_session = seat.movie_session,
            row = seat.row,
            seat = seat.seat,
            "seat taken by a concurrent booking"
        );
        AppError::SeatTaken(seat)
    } else if is_missing_reference(&err) {
        AppError::not_found("Movie session", seat.movie_session)
    } else {
        AppError::Database(err)
    }
}
