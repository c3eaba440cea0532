use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{Order, OrderDetail},
    pagination::{Page, PageRequest},
    services::booking::{self, SeatRequest},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/orders/", get(list_orders).post(create_order))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "at least one ticket is required"))]
    pub tickets: Vec<SeatRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub page: Option<String>,
}

// POST /orders/
async fn create_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<OrderDetail>)> {
    let Json(req) = payload.map_err(|e| AppError::MalformedInput(e.body_text()))?;
    req.validate()
        .map_err(|e| AppError::MalformedInput(e.to_string()))?;

    tracing::debug!(
        username = %user.username,
        tickets = req.tickets.len(),
        "booking requested"
    );
    let order = booking::create_order(&state.db.pool, user.user_id, &req.tickets).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

// GET /orders/ - the caller's orders, newest first
async fn list_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<OrdersQuery>,
) -> AppResult<Json<Page<OrderDetail>>> {
    let page = PageRequest::from_param(params.page.as_deref(), state.config.pagination.page_size);

    let count = Order::count_for_user(&state.db.pool, user.user_id).await?;
    page.ensure_exists(count)?;
    let orders = Order::list_for_user(&state.db.pool, user.user_id, &page).await?;

    Ok(Json(Page::new(orders, count, &page, &uri)))
}
