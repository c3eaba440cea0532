use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};

use crate::pagination::PageRequest;

use super::{cinema_hall::SeatGrid, movie::MovieSummary};

#[derive(Debug, Clone, FromRow)]
pub struct MovieSession {
    pub id: i64,
    pub show_time: DateTime<Utc>,
    pub movie_id: i64,
    pub cinema_hall_id: i64,
}

/// Session list row; capacity and availability are computed per read.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct MovieSessionSummary {
    pub id: i64,
    pub show_time: DateTime<Utc>,
    pub movie_title: String,
    pub cinema_hall_name: String,
    pub cinema_hall_capacity: i64,
    pub tickets_available: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize)]
pub struct TakenPlace {
    pub row: i32,
    pub seat: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieSessionDetail {
    pub id: i64,
    pub show_time: DateTime<Utc>,
    pub movie: MovieSummary,
    pub cinema_hall: i64,
    pub taken_places: Vec<TakenPlace>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    /// Calendar date of the show time in the configured time zone.
    pub date: Option<NaiveDate>,
    pub movie: Option<i64>,
}

pub(crate) const SUMMARY_COLUMNS: &str = "ms.id, ms.show_time, \
     m.title AS movie_title, \
     ch.name AS cinema_hall_name, \
     ch.rows::BIGINT * ch.seats_in_row AS cinema_hall_capacity, \
     ch.rows::BIGINT * ch.seats_in_row \
        - (SELECT COUNT(*) FROM tickets taken WHERE taken.movie_session_id = ms.id) AS tickets_available";

pub(crate) const SUMMARY_JOINS: &str = " FROM movie_sessions ms \
     JOIN movies m ON m.id = ms.movie_id \
     JOIN cinema_halls ch ON ch.id = ms.cinema_hall_id";

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &SessionFilter, time_zone: &'a str) {
    qb.push(" WHERE TRUE");
    if let Some(date) = filter.date {
        qb.push(" AND (ms.show_time AT TIME ZONE ")
            .push_bind(time_zone)
            .push(")::date = ")
            .push_bind(date);
    }
    if let Some(movie) = filter.movie {
        qb.push(" AND ms.movie_id = ").push_bind(movie);
    }
}

impl MovieSession {
    pub async fn count(pool: &PgPool, filter: &SessionFilter, time_zone: &str) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM movie_sessions ms");
        push_filters(&mut qb, filter, time_zone);
        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &SessionFilter,
        time_zone: &str,
        page: &PageRequest,
    ) -> Result<Vec<MovieSessionSummary>, sqlx::Error> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(SUMMARY_COLUMNS).push(SUMMARY_JOINS);
        push_filters(&mut qb, filter, time_zone);
        qb.push(" ORDER BY ms.show_time, ms.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        qb.build_query_as::<MovieSessionSummary>().fetch_all(pool).await
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<MovieSession>, sqlx::Error> {
        sqlx::query_as::<_, MovieSession>(
            "SELECT id, show_time, movie_id, cinema_hall_id FROM movie_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn taken_places(pool: &PgPool, id: i64) -> Result<Vec<TakenPlace>, sqlx::Error> {
        sqlx::query_as::<_, TakenPlace>(
            r#"SELECT "row", seat FROM tickets WHERE movie_session_id = $1 ORDER BY "row", seat"#,
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// Seat grids of the halls behind the given sessions, keyed by session id.
    /// Sessions that do not exist are simply absent from the result.
    pub async fn seat_grids(
        conn: &mut PgConnection,
        ids: &[i64],
    ) -> Result<Vec<(i64, SeatGrid)>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (i64, i32, i32)>(
            "SELECT ms.id, ch.rows, ch.seats_in_row
             FROM movie_sessions ms
             JOIN cinema_halls ch ON ch.id = ms.cinema_hall_id
             WHERE ms.id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, rows, seats_in_row)| (id, SeatGrid { rows, seats_in_row }))
            .collect())
    }
}
