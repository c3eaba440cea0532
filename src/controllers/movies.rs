use axum::{
    extract::{rejection::PathRejection, OriginalUri, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieFilter, MovieSummary},
    pagination::{Page, PageRequest},
    AppState,
};

use super::{non_empty, path_id};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies/", get(list_movies))
        .route("/movies/{id}/", get(get_movie))
}

#[derive(Debug, Default, Deserialize)]
pub struct MoviesQuery {
    pub title: Option<String>,
    pub genres: Option<String>,
    pub actors: Option<String>,
    pub page: Option<String>,
}

impl MoviesQuery {
    fn filter(self) -> MovieFilter {
        MovieFilter {
            title: non_empty(self.title),
            genres: non_empty(self.genres),
            actors: non_empty(self.actors),
        }
    }
}

// GET /movies/?title=&genres=&actors=
async fn list_movies(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<MoviesQuery>,
) -> AppResult<Json<Page<MovieSummary>>> {
    let page = PageRequest::from_param(params.page.as_deref(), state.config.pagination.page_size);
    let filter = params.filter();

    let count = Movie::count(&state.db.pool, &filter).await?;
    page.ensure_exists(count)?;
    let movies = Movie::list(&state.db.pool, &filter, &page).await?;

    Ok(Json(Page::new(movies, count, &page, &uri)))
}

// GET /movies/{id}/
async fn get_movie(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MovieSummary>> {
    let id = path_id(path)?;
    Movie::find(&state.db.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Movie", id))
}
