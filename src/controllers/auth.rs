use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::User,
    services::auth::{self, IssuedToken},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/token/", post(obtain_token))
}

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

// POST /token/
async fn obtain_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> AppResult<Json<IssuedToken>> {
    let Json(req) = payload.map_err(|e| AppError::MalformedInput(e.body_text()))?;
    req.validate()
        .map_err(|e| AppError::MalformedInput(e.to_string()))?;

    let user = auth::authenticate(&state.db.pool, &req.username, &req.password).await?;
    let token = auth::issue_token(&state.config.jwt, &user)?;

    // Not worth failing the login over
    if let Err(e) = User::touch_last_login(&state.db.pool, user.id).await {
        tracing::warn!(user_id = user.id, error = %e, "failed to update last_login");
    }

    tracing::info!(user_id = user.id, "token issued");
    Ok(Json(token))
}
