use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use std::sync::Arc;

use crate::{error::AppError, services::auth, AppState};

/// Caller identity for endpoints that need an authenticated user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

// Accepts `Basic` credentials or a `Bearer` token issued by `POST /token/`
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthenticated("Authentication credentials were not provided.".to_string())
            })?;

        let user = if let Some(token) = auth::parse_bearer(value) {
            auth::user_from_token(&state.db.pool, &state.config.jwt, token).await?
        } else if value.starts_with("Basic ") {
            let (username, password) = auth::parse_basic(value).ok_or_else(|| {
                AppError::Unauthenticated("Invalid basic header.".to_string())
            })?;
            auth::authenticate(&state.db.pool, &username, &password).await?
        } else {
            return Err(AppError::Unauthenticated(
                "Unsupported authorization scheme.".to_string(),
            ));
        };

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
        })
    }
}
