//! Charging session API handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};

use super::dto::{
    RecordSessionRequest, RecordSessionResponse, SessionDto, SessionListResponse, StatusResponse,
};
use crate::application::charging::{render_csv, ChargingSessionService, CSV_FILENAME};
use crate::interfaces::http::common::{
    ApiError, ErrorResponse, IdPath, MessageResponse, ValidatedJson,
};

/// Session handler state
#[derive(Clone)]
pub struct SessionAppState {
    pub service: Arc<ChargingSessionService>,
}

#[utoipa::path(
    get,
    path = "/api/status",
    tag = "Sessions",
    responses(
        (status = 200, description = "Charging or idle", body = StatusResponse),
        (status = 401, description = "Locked", body = ErrorResponse)
    )
)]
pub async fn get_status(
    State(state): State<SessionAppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = state.service.status().await?;
    Ok(Json(status.into()))
}

#[utoipa::path(
    get,
    path = "/api/sessions",
    tag = "Sessions",
    responses(
        (status = 200, description = "All sessions, newest first", body = SessionListResponse),
        (status = 401, description = "Locked", body = ErrorResponse)
    )
)]
pub async fn list_sessions(
    State(state): State<SessionAppState>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state.service.history().await?;
    Ok(Json(SessionListResponse {
        sessions: sessions.iter().map(SessionDto::from_domain).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "Sessions",
    request_body = RecordSessionRequest,
    responses(
        (status = 200, description = "Reading recorded", body = RecordSessionResponse),
        (status = 400, description = "Bad percentage or type, or no open session to end", body = ErrorResponse),
        (status = 401, description = "Locked", body = ErrorResponse),
        (status = 409, description = "A session is already in progress", body = ErrorResponse)
    )
)]
pub async fn record_session(
    State(state): State<SessionAppState>,
    ValidatedJson(request): ValidatedJson<RecordSessionRequest>,
) -> Result<Json<RecordSessionResponse>, ApiError> {
    let session = state
        .service
        .record(&request.kind, request.percentage)
        .await?;
    Ok(Json(RecordSessionResponse::from_domain(&session)))
}

#[utoipa::path(
    get,
    path = "/api/sessions/csv",
    tag = "Sessions",
    responses(
        (status = 200, description = "CSV export, oldest first", content_type = "text/csv", body = String),
        (status = 401, description = "Locked", body = ErrorResponse)
    )
)]
pub async fn export_csv(
    State(state): State<SessionAppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.service.export().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", CSV_FILENAME),
            ),
        ],
        render_csv(&rows),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    tag = "Sessions",
    params(("id" = i32, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session deleted", body = MessageResponse),
        (status = 400, description = "Id is not an integer", body = ErrorResponse),
        (status = 401, description = "Locked", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
pub async fn delete_session(
    State(state): State<SessionAppState>,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>, ApiError> {
    state.service.delete(id).await?;
    Ok(Json(MessageResponse::new("Session deleted")))
}

#[utoipa::path(
    delete,
    path = "/api/sessions",
    tag = "Sessions",
    responses(
        (status = 200, description = "All sessions deleted", body = MessageResponse),
        (status = 401, description = "Locked", body = ErrorResponse)
    )
)]
pub async fn delete_all_sessions(
    State(state): State<SessionAppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.service.delete_all().await?;
    Ok(Json(MessageResponse::new("All sessions deleted")))
}
