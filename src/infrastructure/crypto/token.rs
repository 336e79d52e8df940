//! Session token generation and hashing

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Random bytes per token (hex-encoded to twice as many chars)
const TOKEN_BYTES: usize = 32;

/// Generate a new opaque session token
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Hash a token or passphrase for storage/comparison using SHA-256
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a candidate secret against a stored SHA-256 hash in constant time
pub fn verify_secret(candidate: &str, stored_hash: &str) -> bool {
    let candidate_hash = hash_secret(candidate);
    candidate_hash.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}
