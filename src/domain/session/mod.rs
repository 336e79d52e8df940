//! Charging session aggregate
//!
//! Contains the ChargingSession entity, related types, and repository interface.

pub mod model;
pub mod repository;

pub use model::{
    format_timestamp, validate_percentage, ChargingSession, ExportRow, RecordKind, SessionState,
    SessionStatus, SortOrder,
};
pub use repository::SessionRepository;
