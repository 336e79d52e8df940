use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("No active charging session found")]
    NoActiveSession,

    #[error("Charging session {0} is already in progress")]
    SessionAlreadyOpen(i32),

    #[error("Charging session {0} is already closed")]
    SessionAlreadyClosed(i32),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn session_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "ChargingSession",
            field: "id",
            value: id.to_string(),
        }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Storage(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
