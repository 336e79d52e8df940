pub mod charging;
pub mod identity;

// Re-export key types for convenience
pub use charging::{render_csv, ChargingSessionService};
pub use identity::{PassphraseGate, SharedGate, UnlockOutcome};
