//! Auth Session Entity
//!
//! Server-side session row. The cookie only carries the signed session id.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{SessionId, UserId};
use kernel::principal::Role;

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    /// Role at sign-in; requests use the live role from the user row
    pub role: Role,
    /// Unix timestamp, milliseconds
    pub expires_at_ms: i64,
    pub remember_me: bool,
    /// SHA-256 of the User-Agent that created the session
    pub client_fingerprint_hash: Vec<u8>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(
        user_id: UserId,
        role: Role,
        remember_me: bool,
        fingerprint_hash: Vec<u8>,
        client_ip: Option<String>,
        user_agent: Option<String>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            session_id: SessionId::new(),
            user_id,
            role,
            expires_at_ms: (now + ttl).timestamp_millis(),
            remember_me,
            client_fingerprint_hash: fingerprint_hash,
            client_ip,
            user_agent,
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    /// Slide a remember-me session once less than half of `ttl_long` remains.
    pub fn extend_if_needed(&mut self, ttl_long: Duration) {
        if !self.remember_me {
            return;
        }

        let now = Utc::now();
        if self.expires_at_ms < (now + (ttl_long / 2)).timestamp_millis() {
            self.expires_at_ms = (now + ttl_long).timestamp_millis();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(remember_me: bool, ttl: Duration) -> AuthSession {
        AuthSession::new(UserId::new(), Role::Student, remember_me, vec![0; 32], None, None, ttl)
    }

    #[test]
    fn test_expiry() {
        assert!(!session(false, Duration::hours(1)).is_expired());
        assert!(session(false, Duration::milliseconds(-1)).is_expired());
    }

    #[test]
    fn test_remember_me_slides() {
        let long = Duration::days(7);
        let mut s = session(true, Duration::days(1));
        let before = s.expires_at_ms;
        s.extend_if_needed(long);
        assert!(s.expires_at_ms > before);

        let mut short = session(false, Duration::days(1));
        let before = short.expires_at_ms;
        short.extend_if_needed(long);
        assert_eq!(short.expires_at_ms, before);
    }
}
