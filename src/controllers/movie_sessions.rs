use axum::{
    extract::{rejection::PathRejection, OriginalUri, Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieSession, MovieSessionDetail, MovieSessionSummary, SessionFilter},
    pagination::{Page, PageRequest},
    services::availability::{seat_availability, SeatAvailability},
    AppState,
};

use super::{non_empty, path_id};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movie_sessions/", get(list_movie_sessions))
        .route("/movie_sessions/{id}/", get(get_movie_session))
        .route("/movie_sessions/{id}/availability/", get(get_availability))
}

#[derive(Debug, Default, Deserialize)]
pub struct MovieSessionsQuery {
    pub date: Option<String>,
    pub movie: Option<String>,
    pub page: Option<String>,
}

impl MovieSessionsQuery {
    // Unparseable values are dropped, not reported
    fn filter(&self) -> SessionFilter {
        SessionFilter {
            date: non_empty(self.date.clone())
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            movie: non_empty(self.movie.clone()).and_then(|m| m.parse::<i64>().ok()),
        }
    }
}

// GET /movie_sessions/?date=YYYY-MM-DD&movie=<id>
async fn list_movie_sessions(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<MovieSessionsQuery>,
) -> AppResult<Json<Page<MovieSessionSummary>>> {
    let page = PageRequest::from_param(params.page.as_deref(), state.config.pagination.page_size);
    let filter = params.filter();
    let time_zone = state.config.app.time_zone.as_str();

    let count = MovieSession::count(&state.db.pool, &filter, time_zone).await?;
    page.ensure_exists(count)?;
    let sessions = MovieSession::list(&state.db.pool, &filter, time_zone, &page).await?;

    Ok(Json(Page::new(sessions, count, &page, &uri)))
}

// GET /movie_sessions/{id}/
async fn get_movie_session(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MovieSessionDetail>> {
    let id = path_id(path)?;
    let session = MovieSession::find(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Movie session", id))?;

    let movie = Movie::find(&state.db.pool, session.movie_id)
        .await?
        .ok_or_else(|| AppError::not_found("Movie", session.movie_id))?;
    let taken_places = MovieSession::taken_places(&state.db.pool, id).await?;

    Ok(Json(MovieSessionDetail {
        id: session.id,
        show_time: session.show_time,
        movie,
        cinema_hall: session.cinema_hall_id,
        taken_places,
    }))
}

// GET /movie_sessions/{id}/availability/
async fn get_availability(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<SeatAvailability>> {
    let id = path_id(path)?;
    Ok(Json(seat_availability(&state.db.pool, id).await?))
}
