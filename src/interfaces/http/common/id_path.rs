//! Numeric id path extractor
//!
//! `IdPath` reads a single `{id}` segment. Non-numeric ids are a 400 with a
//! `{"detail": ...}` body; numeric ids too large to exist are a 404.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use super::ApiError;
use crate::domain::DomainError;

/// Row id taken from the URL path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath(pub i32);

fn parse_id(raw: &str) -> Result<i32, ApiError> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::bad_request(format!(
            "Invalid id: expected an integer, got `{}`",
            raw
        )));
    }
    raw.parse::<i32>()
        .map_err(|_| DomainError::session_not_found(raw).into())
}

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        parse_id(&raw).map(IdPath)
    }
}
