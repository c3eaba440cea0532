//! Error type shared by the booking engine, the catalog queries and the HTTP layer.
//!
//! Every failure a caller can observe maps to one `AppError` variant, and each
//! variant renders as `{"error": {"code", "message", "details"?}}`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// Identifies one requested ticket inside a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeatRef {
    /// Position of the ticket in the request list.
    pub index: Option<usize>,
    pub movie_session: i64,
    pub row: i32,
    pub seat: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("row {} seat {} is outside the hall ({rows} rows x {seats_in_row} seats)", .seat.row, .seat.seat)]
    OutOfBounds {
        seat: SeatRef,
        rows: i32,
        seats_in_row: i32,
    },

    #[error("row {} seat {} is already taken for movie session {}", .0.row, .0.seat, .0.movie_session)]
    SeatTaken(SeatRef),

    #[error("row {} seat {} for movie session {} is requested more than once", .0.row, .0.seat, .0.movie_session)]
    DuplicateInRequest(SeatRef),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    MalformedInput(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(resource: &str, id: i64) -> Self {
        AppError::NotFound(format!("{resource} with id {id} not found"))
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::OutOfBounds { .. } => "OUT_OF_BOUNDS",
            AppError::SeatTaken(_) => "SEAT_TAKEN",
            AppError::DuplicateInRequest(_) => "DUPLICATE_IN_REQUEST",
            AppError::Unauthenticated(_) => "UNAUTHENTICATED",
            AppError::MalformedInput(_) => "MALFORMED_INPUT",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::OutOfBounds { .. }
            | AppError::DuplicateInRequest(_)
            | AppError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            AppError::SeatTaken(_) => StatusCode::CONFLICT,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::OutOfBounds {
                seat,
                rows,
                seats_in_row,
            } => Some(json!({
                "index": seat.index,
                "movie_session": seat.movie_session,
                "row": seat.row,
                "seat": seat.seat,
                "rows": rows,
                "seats_in_row": seats_in_row,
            })),
            AppError::SeatTaken(seat) | AppError::DuplicateInRequest(seat) => {
                serde_json::to_value(seat).ok()
            }
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internals are logged, never sent to the client
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            code: self.code(),
            message,
            details: self.details(),
        };

        let mut response = (status, Json(json!({ "error": body }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"api\""),
            );
        }
        response
    }
}
