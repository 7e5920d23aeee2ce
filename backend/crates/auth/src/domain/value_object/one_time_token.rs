//! One-time token
//!
//! Email verification and password reset links carry a random token. Only
//! its SHA-256 digest is stored, with an absolute expiry that the server
//! checks when the token is redeemed.

use chrono::{DateTime, Duration, Utc};
use platform::crypto::{random_token, sha256_hex};

/// 256 bits of entropy
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeToken {
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued token: the raw value goes into the email, the rest is stored.
#[derive(Debug)]
pub struct IssuedToken {
    pub raw: String,
    pub stored: OneTimeToken,
}

impl OneTimeToken {
    pub fn issue(ttl: Duration) -> IssuedToken {
        let raw = random_token(TOKEN_BYTES);
        let stored = OneTimeToken {
            hash: Self::digest(&raw),
            expires_at: Utc::now() + ttl,
        };
        IssuedToken { raw, stored }
    }

    /// Storage form of a raw token taken from a link.
    pub fn digest(raw: &str) -> String {
        sha256_hex(raw.trim().as_bytes())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_stores_only_digest() {
        let issued = OneTimeToken::issue(Duration::hours(24));
        assert_ne!(issued.raw, issued.stored.hash);
        assert_eq!(OneTimeToken::digest(&issued.raw), issued.stored.hash);
        assert_eq!(issued.stored.hash.len(), 64);
    }

    #[test]
    fn test_expiry() {
        let issued = OneTimeToken::issue(Duration::hours(1));
        let now = Utc::now();
        assert!(!issued.stored.is_expired_at(now));
        assert!(issued.stored.is_expired_at(now + Duration::hours(2)));
    }
}
