//! # Charge Recorder
//!
//! Records EV charging sessions as pairs of battery readings (start and end
//! percentage) and serves them over a small REST API.
//!
//! ## Architecture
//!
//! - **domain**: charging session model and repository trait
//! - **application**: session state machine, CSV export, passphrase gate
//! - **infrastructure**: SeaORM/SQLite persistence and token hashing
//! - **interfaces**: Axum router, handlers and middleware
//! - **support**: error types and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod support;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{connect_and_migrate, init_database, DatabaseConfig, SeaOrmSessionRepository};

// Re-export API router
pub use interfaces::create_api_router;
