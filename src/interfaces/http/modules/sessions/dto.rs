//! Charging session DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::session::format_timestamp;
use crate::domain::{ChargingSession, SessionStatus};

/// Body of `POST /api/sessions`
///
/// Range and kind checks happen in the service so that the error messages
/// stay in one place.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordSessionRequest {
    /// Battery percentage, 0–100
    pub percentage: i64,
    /// `"start"` or `"end"`
    #[serde(rename = "type")]
    pub kind: String,
}

/// A stored session; end fields are `null` while charging
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionDto {
    pub id: i32,
    pub start_percentage: i32,
    pub start_time: String,
    pub end_percentage: Option<i32>,
    pub end_time: Option<String>,
}

impl SessionDto {
    pub fn from_domain(s: &ChargingSession) -> Self {
        Self {
            id: s.id,
            start_percentage: s.start_percentage,
            start_time: format_timestamp(&s.start_time),
            end_percentage: s.end_percentage,
            end_time: s.end_time.as_ref().map(format_timestamp),
        }
    }
}

/// A newly started session (no end fields yet)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StartedSessionDto {
    pub id: i32,
    pub start_percentage: i32,
    pub start_time: String,
}

impl StartedSessionDto {
    pub fn from_domain(s: &ChargingSession) -> Self {
        Self {
            id: s.id,
            start_percentage: s.start_percentage,
            start_time: format_timestamp(&s.start_time),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RecordedSession {
    Closed(SessionDto),
    Started(StartedSessionDto),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordSessionResponse {
    pub message: String,
    pub session: RecordedSession,
}

impl RecordSessionResponse {
    pub fn from_domain(s: &ChargingSession) -> Self {
        if s.is_open() {
            Self {
                message: format!("Recorded {}% as start charge", s.start_percentage),
                session: RecordedSession::Started(StartedSessionDto::from_domain(s)),
            }
        } else {
            Self {
                message: format!(
                    "Recorded {}% as end charge",
                    s.end_percentage.unwrap_or_default()
                ),
                session: RecordedSession::Closed(SessionDto::from_domain(s)),
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionDto>,
}

/// `{"status": "charging", ...}` or `{"status": "idle"}`
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusResponse {
    Charging {
        start_percentage: i32,
        start_time: String,
    },
    Idle,
}

impl From<SessionStatus> for StatusResponse {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Charging {
                start_percentage,
                start_time,
            } => Self::Charging {
                start_percentage,
                start_time: format_timestamp(&start_time),
            },
            SessionStatus::Idle => Self::Idle,
        }
    }
}
