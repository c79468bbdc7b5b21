use crate::model::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keyhole_shortener::ShortenerError;
use tracing::error;

pub type Result<T> = std::result::Result<T, AppError>;

/// An error answered with `{"error": message}` and an HTTP status.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Maps a failure on the shortening path. Backend failures are 500.
    pub fn from_shorten(err: ShortenerError) -> Self {
        match err {
            ShortenerError::InvalidUrl(_) => Self::unprocessable(err.to_string()),
            ShortenerError::EmptyPool(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            other => {
                error!(error = %other, "Shortening failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }

    /// Maps a failure on the redirect path. Backend failures are 503.
    pub fn from_resolve(err: ShortenerError) -> Self {
        match err {
            ShortenerError::InvalidShortKey(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            ShortenerError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            other => {
                error!(error = %other, "Resolving failed");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "service unavailable")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
