//! API error type and its HTTP rendering.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use guestbook_types::api::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed client input. Reported, never logged as a failure.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or wrong admin token. The body carries no detail.
    #[error("unauthorized")]
    Unauthorized,

    /// Storage or runtime failure.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::BadRequest(msg) => {
                tracing::debug!(error = %msg, "rejected request");
                (StatusCode::BAD_REQUEST, msg)
            }
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(ErrorResponse { ok: false, error })).into_response()
    }
}
