//! Passphrase-gate middleware for Axum
//!
//! The session token travels in the `chargerecorder_session` cookie set by
//! `POST /api/unlock`; non-browser clients may send it as a Bearer token.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::application::SharedGate;
use crate::interfaces::http::common::ApiError;

/// Name of the session cookie
pub const SESSION_COOKIE_NAME: &str = "chargerecorder_session";

/// Find a cookie value by name across all `Cookie` headers
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Session token presented with the request, cookie first
pub fn extract_session_token(headers: &HeaderMap) -> Option<&str> {
    cookie_value(headers, SESSION_COOKIE_NAME).or_else(|| bearer_token(headers))
}

/// `Set-Cookie` value for a freshly issued token
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE_NAME, token, max_age_secs
    )
}

/// Rejects the request with 401 unless the gate authorizes its token
pub async fn require_unlock(
    State(gate): State<SharedGate>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !gate.authorize(extract_session_token(request.headers())) {
        return ApiError::unauthorized().into_response();
    }
    next.run(request).await
}
