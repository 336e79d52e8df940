//! Identity module: passphrase gate
//!
//! The whole API sits behind one shared passphrase. `PassphraseGate` checks
//! the phrase on unlock and keeps track of the session tokens it issued.

pub mod gate;

pub use gate::{IssuedToken, PassphraseGate, SharedGate, UnlockOutcome};
