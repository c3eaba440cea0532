//! Read-only lookup lists: genres, actors and cinema halls.

use axum::{
    extract::{OriginalUri, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{
        actor::ActorResponse, cinema_hall::CinemaHallResponse, Actor, CinemaHall, Genre,
    },
    pagination::{Page, PageRequest},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/genres/", get(list_genres))
        .route("/actors/", get(list_actors))
        .route("/cinema_halls/", get(list_cinema_halls))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    fn page(&self, state: &AppState) -> PageRequest {
        PageRequest::from_param(self.page.as_deref(), state.config.pagination.page_size)
    }
}

async fn list_genres(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<Page<Genre>>> {
    let page = params.page(&state);
    let count = Genre::count(&state.db.pool).await?;
    page.ensure_exists(count)?;
    let genres = Genre::list(&state.db.pool, &page).await?;
    Ok(Json(Page::new(genres, count, &page, &uri)))
}

async fn list_actors(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<Page<ActorResponse>>> {
    let page = params.page(&state);
    let count = Actor::count(&state.db.pool).await?;
    page.ensure_exists(count)?;
    let actors = Actor::list(&state.db.pool, &page)
        .await?
        .into_iter()
        .map(ActorResponse::from)
        .collect();
    Ok(Json(Page::new(actors, count, &page, &uri)))
}

async fn list_cinema_halls(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<Page<CinemaHallResponse>>> {
    let page = params.page(&state);
    let count = CinemaHall::count(&state.db.pool).await?;
    page.ensure_exists(count)?;
    let halls = CinemaHall::list(&state.db.pool, &page)
        .await?
        .into_iter()
        .map(CinemaHallResponse::from)
        .collect();
    Ok(Json(Page::new(halls, count, &page, &uri)))
}
