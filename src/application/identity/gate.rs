//! Passphrase gate and session token registry

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::config::SecurityConfig;
use crate::infrastructure::crypto::token::{generate_token, hash_secret, verify_secret};

/// Upper bound on concurrently valid session tokens
pub const MAX_ACTIVE_TOKENS: usize = 64;

/// Token handed to the client after a successful unlock
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub value: String,
    /// Lifetime in seconds, for the cookie `Max-Age`
    pub max_age_secs: i64,
}

/// Result of an unlock attempt. A wrong phrase is a normal outcome, not an error.
#[derive(Debug, Clone)]
pub struct UnlockOutcome {
    pub success: bool,
    pub message: &'static str,
    pub token: Option<IssuedToken>,
}

pub struct PassphraseGate {
    /// SHA-256 of the configured passphrase; `None` disables the gate
    passphrase_hash: Option<String>,
    ttl: Duration,
    /// token hash -> expiry
    tokens: DashMap<String, DateTime<Utc>>,
}

/// Shared, reference-counted gate
pub type SharedGate = Arc<PassphraseGate>;

impl PassphraseGate {
    pub fn new(config: &SecurityConfig) -> Self {
        let passphrase_hash = config
            .gate_enabled()
            .then(|| hash_secret(&config.unlock_phrase));
        if passphrase_hash.is_none() {
            warn!("No unlock passphrase configured; API is open to everyone");
        }
        Self {
            passphrase_hash,
            ttl: Duration::hours(config.token_ttl_hours),
            tokens: DashMap::new(),
        }
    }

    /// Wrap in `Arc` for shared ownership
    pub fn shared(config: &SecurityConfig) -> SharedGate {
        Arc::new(Self::new(config))
    }

    pub fn is_enabled(&self) -> bool {
        self.passphrase_hash.is_some()
    }

    pub fn unlock(&self, phrase: &str) -> UnlockOutcome {
        self.unlock_at(phrase, Utc::now())
    }

    /// True if the gate is disabled or `token` is a live issued token.
    pub fn authorize(&self, token: Option<&str>) -> bool {
        self.authorize_at(token, Utc::now())
    }

    /// Drop expired tokens, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    fn unlock_at(&self, phrase: &str, now: DateTime<Utc>) -> UnlockOutcome {
        let Some(expected) = &self.passphrase_hash else {
            return UnlockOutcome {
                success: true,
                message: "No passphrase configured",
                token: None,
            };
        };

        if !verify_secret(phrase, expected) {
            warn!("Unlock attempt with incorrect passphrase");
            return UnlockOutcome {
                success: false,
                message: "Incorrect passphrase",
                token: None,
            };
        }

        self.purge_expired_at(now);
        self.evict_oldest_while_full();

        let value = generate_token();
        let expires_at = now + self.ttl;
        self.tokens.insert(hash_secret(&value), expires_at);
        info!(%expires_at, "Unlocked; session token issued");

        UnlockOutcome {
            success: true,
            message: "Unlocked",
            token: Some(IssuedToken {
                value,
                max_age_secs: self.ttl.num_seconds(),
            }),
        }
    }

    fn authorize_at(&self, token: Option<&str>, now: DateTime<Utc>) -> bool {
        if !self.is_enabled() {
            return true;
        }
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return false;
        };

        let key = hash_secret(token);
        let Some(expires_at) = self.tokens.get(&key).map(|e| *e.value()) else {
            return false;
        };
        if expires_at <= now {
            self.tokens.remove(&key);
            debug!("Rejected expired session token");
            return false;
        }
        true
    }

    /// Make room for one more token by dropping the ones closest to expiry
    fn evict_oldest_while_full(&self) {
        while self.tokens.len() >= MAX_ACTIVE_TOKENS {
            let oldest = self
                .tokens
                .iter()
                .min_by_key(|e| *e.value())
                .map(|e| e.key().clone());
            match oldest {
                Some(key) => {
                    self.tokens.remove(&key);
                    debug!("Evicted oldest session token; registry full");
                }
                None => break,
            }
        }
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|_, expires_at| *expires_at > now);
        before - self.tokens.len()
    }
}

// ── Tests ──────────────────────────────────────────────────────
