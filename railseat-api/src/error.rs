use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use railseat_core::BookingError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl AppError {
    /// Prefix the message with what the handler was doing.
    pub fn context(self, action: &str) -> Self {
        match self {
            AppError::NotFound(msg) => AppError::NotFound(format!("{action}: {msg}")),
            AppError::InvalidArgument(msg) => AppError::InvalidArgument(format!("{action}: {msg}")),
            AppError::InternalServerError(msg) => AppError::InternalServerError(format!("{action}: {msg}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound { .. } => AppError::NotFound(err.to_string()),
            BookingError::SeatConflict { .. } => AppError::InvalidArgument(err.to_string()),
            BookingError::NoSeatAvailable { .. } => AppError::InternalServerError(err.to_string()),
        }
    }
}
