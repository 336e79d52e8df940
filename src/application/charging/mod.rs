//! Charging session use-cases

pub mod export;
pub mod service;

pub use export::{render_csv, CSV_FILENAME, CSV_HEADER};
pub use service::ChargingSessionService;
