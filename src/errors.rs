use crate::store::StoreError;
use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Maps a store failure for `operation` onto the HTTP taxonomy.
    /// `message` is the client-facing text used for 500s.
    pub fn from_store(operation: &str, message: &str, err: StoreError) -> Self {
        error!(operation = %operation, "store failure: {err}");
        match err {
            StoreError::PermissionDenied(detail) => {
                Self::forbidden("Permission denied by the activity store").with_details(detail)
            }
            StoreError::Conflict(detail) => {
                Self::conflict("An activity with this title already exists").with_details(detail)
            }
            StoreError::Query(err) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message).with_details(err.to_string())
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}
