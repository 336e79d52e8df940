pub mod auth;
pub mod health;
pub mod metrics;
pub mod request_id;
pub mod sessions;
