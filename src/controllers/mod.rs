pub mod auth;
pub mod catalog;
pub mod movie_sessions;
pub mod movies;
pub mod orders;

use axum::{extract::rejection::PathRejection, extract::Path, Router};
use std::sync::Arc;

use crate::{error::AppError, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(movies::routes())
        .merge(movie_sessions::routes())
        .merge(catalog::routes())
        .merge(orders::routes())
        .merge(auth::routes())
}

/* ---------- helpers ---------- */

// Non-numeric ids cannot name a resource
fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::NotFound("Not found.".to_string()))
}

// Empty query values count as absent
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
