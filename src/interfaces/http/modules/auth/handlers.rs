//! Unlock handler

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use super::dto::{UnlockRequest, UnlockResponse};
use crate::application::SharedGate;
use crate::interfaces::http::common::{ApiError, ErrorResponse, ValidatedJson};
use crate::interfaces::http::middleware::session_cookie;

#[utoipa::path(
    post,
    path = "/api/unlock",
    tag = "Authentication",
    request_body = UnlockRequest,
    responses(
        (status = 200, description = "Unlock outcome; sets the session cookie on success", body = UnlockResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse)
    )
)]
pub async fn unlock(
    State(gate): State<SharedGate>,
    ValidatedJson(request): ValidatedJson<UnlockRequest>,
) -> Result<Response, ApiError> {
    let outcome = gate.unlock(&request.phrase);

    let mut response = Json(UnlockResponse {
        success: outcome.success,
        message: outcome.message.to_string(),
    })
    .into_response();

    if let Some(token) = outcome.token {
        let cookie = session_cookie(&token.value, token.max_age_secs);
        let value = HeaderValue::from_str(&cookie).map_err(|e| {
            error!("Cannot encode session cookie: {}", e);
            ApiError::internal()
        })?;
        response.headers_mut().insert(header::SET_COOKIE, value);
    }

    Ok(response)
}
