use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use snote_service::ServiceError;

use crate::api::schemas::ErrorResponse;

/// Errors that can occur when running the snote server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A note service error surfaced through the API.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The request could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded the configured limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, ErrorResponse::new(message)),
            Self::PayloadTooLarge(message) => {
                (StatusCode::PAYLOAD_TOO_LARGE, ErrorResponse::new(message))
            }
            Self::Service(ServiceError::ValidationFailed(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::with_details("validation failed", errors.into_errors()),
            ),
            Self::Service(ServiceError::DoesNotExist) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("note does not exist"),
            ),
            other => {
                tracing::error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
