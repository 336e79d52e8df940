//! Shared HTTP response types and extractors

pub mod id_path;
pub mod validated_json;

pub use id_path::IdPath;
pub use validated_json::ValidatedJson;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Error body returned by every endpoint: `{"detail": "..."}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable description of what went wrong
    pub detail: String,
}

/// Plain acknowledgement: `{"message": "..."}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An error on its way out of a handler
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) | DomainError::InvalidArgument(msg) => {
                Self::bad_request(msg)
            }
            DomainError::NoActiveSession => Self::bad_request(e.to_string()),
            DomainError::SessionAlreadyOpen(_) | DomainError::SessionAlreadyClosed(_) => {
                Self::new(StatusCode::CONFLICT, e.to_string())
            }
            DomainError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "Session not found"),
            DomainError::Storage(msg) => {
                error!("Storage failure: {}", msg);
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: DomainError) -> StatusCode {
        ApiError::from(e).status
    }

    #[test]
    fn domain_errors_map_to_status_codes() {
        assert_eq!(status_of(DomainError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(DomainError::InvalidArgument("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(DomainError::NoActiveSession), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(DomainError::SessionAlreadyOpen(1)), StatusCode::CONFLICT);
        assert_eq!(status_of(DomainError::session_not_found(1)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(DomainError::Storage("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn storage_details_are_not_leaked() {
        let err = ApiError::from(DomainError::Storage("/secret/path locked".into()));
        assert_eq!(err.detail, "Internal server error");
    }

    #[test]
    fn no_active_session_detail_is_stable() {
        let err = ApiError::from(DomainError::NoActiveSession);
        assert_eq!(err.detail, "No active charging session found");
    }
}
