//! Charging session domain entity

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::support::errors::DomainError;

/// Lowest accepted battery percentage
pub const MIN_PERCENTAGE: i64 = 0;
/// Highest accepted battery percentage
pub const MAX_PERCENTAGE: i64 = 100;

/// Lifecycle state of a charging session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Started, no end reading yet
    Open,
    /// End reading recorded; terminal
    Closed,
}

/// Kind of reading the user records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Start,
    End,
}

impl FromStr for RecordKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            _ => Err(DomainError::InvalidArgument(
                "Type must be 'start' or 'end'".to_string(),
            )),
        }
    }
}

/// Ordering by start time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Check that a raw percentage lies in `[0, 100]`.
pub fn validate_percentage(percentage: i64) -> Result<i32, DomainError> {
    if (MIN_PERCENTAGE..=MAX_PERCENTAGE).contains(&percentage) {
        Ok(percentage as i32)
    } else {
        Err(DomainError::Validation(
            "Percentage must be between 0 and 100".to_string(),
        ))
    }
}

/// Render a timestamp the way the API and CSV export expose it.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// One charging session, from the start reading to the (optional) end reading
#[derive(Debug, Clone, PartialEq)]
pub struct ChargingSession {
    pub id: i32,
    pub start_percentage: i32,
    pub start_time: DateTime<Utc>,
    pub end_percentage: Option<i32>,
    pub end_time: Option<DateTime<Utc>>,
}

impl ChargingSession {
    pub fn state(&self) -> SessionState {
        if self.end_percentage.is_none() && self.end_time.is_none() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Record the end reading. Fails if the session is already closed.
    pub fn close(&mut self, end_percentage: i32, end_time: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.is_open() {
            return Err(DomainError::SessionAlreadyClosed(self.id));
        }
        self.end_percentage = Some(end_percentage);
        self.end_time = Some(end_time);
        Ok(())
    }
}

/// What `status()` reports
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Charging {
        start_percentage: i32,
        start_time: DateTime<Utc>,
    },
    Idle,
}

/// A session flattened to text, as written to the CSV export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub start_percentage: String,
    pub start_datetime: String,
    pub end_percentage: String,
    pub end_datetime: String,
}

impl From<&ChargingSession> for ExportRow {
    fn from(s: &ChargingSession) -> Self {
        Self {
            start_percentage: s.start_percentage.to_string(),
            start_datetime: format_timestamp(&s.start_time),
            end_percentage: s.end_percentage.map(|p| p.to_string()).unwrap_or_default(),
            end_datetime: s.end_time.as_ref().map(format_timestamp).unwrap_or_default(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
