//! JSON error responses.
//!
//! Every failure leaves the API as `{"error": CODE, "message": text}` with the
//! status code the error carries.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mizan_db::FinanceError;
use serde_json::json;
use tracing::{error, warn};

/// Error returned by route handlers.
#[derive(Debug)]
pub enum ApiError {
    /// A repository failure.
    Finance(FinanceError),
    /// A request that could not be interpreted.
    BadRequest {
        /// Machine-readable code.
        code: &'static str,
        /// Human-readable message.
        message: String,
    },
}

impl ApiError {
    /// Shorthand for a `400` with the given code.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }
}

impl From<FinanceError> for ApiError {
    fn from(err: FinanceError) -> Self {
        Self::Finance(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Finance(FinanceError::Database(err)) => {
                error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An error occurred".to_string(),
                )
            }
            Self::Finance(err) => {
                let status = StatusCode::from_u16(err.http_status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if status.is_server_error() {
                    error!(error = %err, "Internal error");
                } else if err.is_retryable() {
                    warn!(error = %err, "Write conflict, client may retry");
                }
                (status, err.error_code(), err.to_string())
            }
            Self::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
        };

        (
            status,
            Json(json!({
                "error": code,
                "message": message,
            })),
        )
            .into_response()
    }
}
