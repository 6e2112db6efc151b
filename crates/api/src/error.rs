use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use huebox_core::error::StageError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`StageError`] for pipeline errors that surface synchronously
/// (job folder creation) and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A pipeline-stage error raised before the job detached.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Stage(err) => {
                tracing::error!(error = %err, "Request failed in pipeline setup");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
