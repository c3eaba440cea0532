use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub async fn find_active_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, is_active, date_joined, last_login
             FROM users
             WHERE username = $1 AND is_active = TRUE",
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_active_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, is_active, date_joined, last_login
             FROM users
             WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn touch_last_login(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Creates the user, or resets password and email if the username exists.
    pub async fn upsert(
        pool: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash)
             VALUES ($1, $2, $3)
             ON CONFLICT (username)
             DO UPDATE SET email = EXCLUDED.email,
                           password_hash = EXCLUDED.password_hash,
                           is_active = TRUE
             RETURNING id, username, email, password_hash, is_active, date_joined, last_login",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }
}
