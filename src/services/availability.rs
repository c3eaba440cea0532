use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};

/// Booked and free seat counts of one session.
///
/// Read in a single statement so `taken + available == capacity` holds for
/// the snapshot it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize)]
pub struct SeatAvailability {
    pub movie_session: i64,
    pub capacity: i64,
    pub taken: i64,
    pub available: i64,
}

pub async fn seat_availability(pool: &PgPool, movie_session: i64) -> AppResult<SeatAvailability> {
    let availability = sqlx::query_as::<_, SeatAvailability>(
        "SELECT ms.id AS movie_session,
                ch.rows::BIGINT * ch.seats_in_row AS capacity,
                counts.taken,
                ch.rows::BIGINT * ch.seats_in_row - counts.taken AS available
         FROM movie_sessions ms
         JOIN cinema_halls ch ON ch.id = ms.cinema_hall_id
         CROSS JOIN LATERAL (
             SELECT COUNT(*) AS taken FROM tickets t WHERE t.movie_session_id = ms.id
         ) counts
         WHERE ms.id = $1",
    )
    .bind(movie_session)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Movie session", movie_session))?;

    if availability.available < 0 {
        tracing::warn!(
            movie_session,
            capacity = availability.capacity,
            taken = availability.taken,
            "session has more tickets than seats"
        );
    }

    Ok(availability)
}
