use sqlx::{FromRow, PgConnection};
use std::collections::HashSet;

/// Name of the unique constraint guarding (movie_session_id, row, seat).
pub const SEAT_CONSTRAINT: &str = "tickets_session_row_seat_key";

const DEADLOCK_DETECTED: &str = "40P01";
const SERIALIZATION_FAILURE: &str = "40001";

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub movie_session_id: i64,
    pub order_id: i64,
}

impl Ticket {
    /// Every (session, row, seat) already booked for the given sessions.
    pub async fn taken_in_sessions(
        conn: &mut PgConnection,
        session_ids: &[i64],
    ) -> Result<HashSet<(i64, i32, i32)>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (i64, i32, i32)>(
            r#"SELECT movie_session_id, "row", seat FROM tickets WHERE movie_session_id = ANY($1)"#,
        )
        .bind(session_ids)
        .fetch_all(conn)
        .await?;

        Ok(rows.into_iter().collect())
    }

    pub async fn insert(
        conn: &mut PgConnection,
        order_id: i64,
        movie_session_id: i64,
        row: i32,
        seat: i32,
    ) -> Result<Ticket, sqlx::Error> {
        sqlx::query_as::<_, Ticket>(
            r#"INSERT INTO tickets ("row", seat, movie_session_id, order_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id, "row", seat, movie_session_id, order_id"#,
        )
        .bind(row)
        .bind(seat)
        .bind(movie_session_id)
        .bind(order_id)
        .fetch_one(conn)
        .await
    }
}

/// True when the error is the storage engine rejecting an already booked seat.
pub fn is_seat_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(SEAT_CONSTRAINT)
        }
        _ => false,
    }
}

/// True when PostgreSQL aborted the insert as a deadlock victim or a
/// serialization failure while another booking held the same seat.
pub fn is_lock_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some(DEADLOCK_DETECTED | SERIALIZATION_FAILURE))
        }
        _ => false,
    }
}

pub fn is_missing_reference(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}
