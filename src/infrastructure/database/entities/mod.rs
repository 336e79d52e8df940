//! Database entities module

pub mod charging_session;

pub use charging_session::Entity as ChargingSession;
