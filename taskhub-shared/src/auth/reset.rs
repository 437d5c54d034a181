/// Password-reset token generation
///
/// A reset token is 32 random bytes, hex-encoded. Only its SHA-256 digest
/// is stored; the raw token goes out in the reset email and is digested
/// again on redemption for comparison. A leaked database therefore never
/// reveals a usable token.
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Reset tokens are valid for one hour
pub fn reset_token_ttl() -> Duration {
    Duration::hours(1)
}

/// A freshly generated reset token
#[derive(Debug, Clone)]
pub struct ResetToken {
    /// Raw token for the email; never persisted
    pub raw: String,

    /// SHA-256 hex digest stored on the user row
    pub digest: String,

    /// Expiry timestamp stored alongside the digest
    pub expires: DateTime<Utc>,
}

/// Generates a new reset token with a one-hour expiry
pub fn generate_reset_token() -> ResetToken {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw = hex::encode(bytes);

    ResetToken {
        digest: digest_token(&raw),
        expires: Utc::now() + reset_token_ttl(),
        raw,
    }
}

/// Digests a raw token for storage or lookup
pub fn digest_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
