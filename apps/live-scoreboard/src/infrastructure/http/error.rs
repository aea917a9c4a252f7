//! API error responses.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::error::{ErrorCode, ScoreboardError};

/// Error body returned to API clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Stable reason code.
    pub code: ErrorCode,
}

/// HTTP wrapper around a scoreboard error.
#[derive(Debug)]
pub struct ApiError(ScoreboardError);

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        if self.0.code().is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

impl From<ScoreboardError> for ApiError {
    fn from(error: ScoreboardError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.to_string(),
            code: self.0.code(),
        };

        (status, Json(body)).into_response()
    }
}
