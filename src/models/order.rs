use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;

use crate::pagination::PageRequest;

use super::movie_session::{MovieSessionSummary, SUMMARY_COLUMNS};

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Order {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketDetail {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub movie_session: MovieSessionSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    pub id: i64,
    pub tickets: Vec<TicketDetail>,
    pub created_at: DateTime<Utc>,
}

// Ticket joined with the summary of its session
#[derive(Debug, FromRow)]
struct TicketRow {
    ticket_id: i64,
    order_id: i64,
    row: i32,
    seat: i32,
    #[sqlx(flatten)]
    session: MovieSessionSummary,
}

impl Order {
    pub async fn insert(conn: &mut PgConnection, user_id: i64) -> Result<Order, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            "INSERT INTO orders (user_id) VALUES ($1) RETURNING id, created_at, user_id",
        )
        .bind(user_id)
        .fetch_one(conn)
        .await
    }

    pub async fn count_for_user(pool: &PgPool, user_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// The user's orders, newest first, with their tickets.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: i64,
        page: &PageRequest,
    ) -> Result<Vec<OrderDetail>, sqlx::Error> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT id, created_at, user_id FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

        Self::with_tickets(pool, orders).await
    }

    pub async fn find_detail(pool: &PgPool, id: i64) -> Result<Option<OrderDetail>, sqlx::Error> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, created_at, user_id FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match order {
            Some(order) => Ok(Self::with_tickets(pool, vec![order]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn with_tickets(pool: &PgPool, orders: Vec<Order>) -> Result<Vec<OrderDetail>, sqlx::Error> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();

        let sql = format!(
            "SELECT t.id AS ticket_id, t.order_id, t.row, t.seat, {SUMMARY_COLUMNS}
             FROM tickets t
             JOIN movie_sessions ms ON ms.id = t.movie_session_id
             JOIN movies m ON m.id = ms.movie_id
             JOIN cinema_halls ch ON ch.id = ms.cinema_hall_id
             WHERE t.order_id = ANY($1)
             ORDER BY t.order_id, t.id"
        );
        let rows = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(&ids)
            .fetch_all(pool)
            .await?;

        let mut tickets: HashMap<i64, Vec<TicketDetail>> = HashMap::new();
        for r in rows {
            tickets.entry(r.order_id).or_default().push(TicketDetail {
                id: r.ticket_id,
                row: r.row,
                seat: r.seat,
                movie_session: r.session,
            });
        }

        Ok(orders
            .into_iter()
            .map(|o| OrderDetail {
                tickets: tickets.remove(&o.id).unwrap_or_default(),
                id: o.id,
                created_at: o.created_at,
            })
            .collect())
    }
}
