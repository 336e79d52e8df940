//! Unlock endpoint: trades the passphrase for a session cookie

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
