pub mod session;

// Re-export commonly used types
pub use session::{
    ChargingSession, ExportRow, RecordKind, SessionRepository, SessionState, SessionStatus,
    SortOrder,
};

// Re-export errors from support for convenience
pub use crate::support::errors::{DomainError, DomainResult};
