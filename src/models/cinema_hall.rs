use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::pagination::PageRequest;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CinemaHall {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
}

/// Seat layout of a hall: rows and seats are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatGrid {
    pub rows: i32,
    pub seats_in_row: i32,
}

impl SeatGrid {
    pub fn capacity(&self) -> i64 {
        i64::from(self.rows) * i64::from(self.seats_in_row)
    }

    pub fn contains(&self, row: i32, seat: i32) -> bool {
        (1..=self.rows).contains(&row) && (1..=self.seats_in_row).contains(&seat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CinemaHallResponse {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub capacity: i64,
}

impl CinemaHall {
    pub fn grid(&self) -> SeatGrid {
        SeatGrid {
            rows: self.rows,
            seats_in_row: self.seats_in_row,
        }
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM cinema_halls")
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool, page: &PageRequest) -> Result<Vec<CinemaHall>, sqlx::Error> {
        sqlx::query_as::<_, CinemaHall>(
            "SELECT id, name, rows, seats_in_row FROM cinema_halls ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }
}

impl From<CinemaHall> for CinemaHallResponse {
    fn from(hall: CinemaHall) -> Self {
        CinemaHallResponse {
            capacity: hall.grid().capacity(),
            id: hall.id,
            name: hall.name,
            rows: hall.rows,
            seats_in_row: hall.seats_in_row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_rows_times_seats() {
        let grid = SeatGrid { rows: 5, seats_in_row: 8 };
        assert_eq!(grid.capacity(), 40);
    }

    #[test]
    fn grid_bounds_are_inclusive_and_one_based() {
        let grid = SeatGrid { rows: 5, seats_in_row: 8 };
        assert!(grid.contains(1, 1));
        assert!(grid.contains(5, 8));
        assert!(!grid.contains(0, 1));
        assert!(!grid.contains(1, 0));
        assert!(!grid.contains(6, 1));
        assert!(!grid.contains(1, 9));
        assert!(!grid.contains(-1, -1));
    }
}
