//! Infrastructure layer: persistence and crypto helpers

pub mod crypto;
pub mod database;

pub use database::{connect_and_migrate, init_database, DatabaseConfig, SeaOrmSessionRepository};
