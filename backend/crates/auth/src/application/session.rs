//! Session establishment and cookie token format
//!
//! The cookie value is `session_id.signature` where the signature is a
//! URL-safe HMAC-SHA256 of the session id under `AuthConfig::session_secret`.

use chrono::Duration;
use kernel::id::SessionId;
use platform::client::ClientFingerprint;
use platform::crypto::{sign, verify_signed};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::AuthSessionRepository;
use crate::error::{AuthError, AuthResult};

/// A session that was just created, plus what the client needs
#[derive(Debug)]
pub struct EstablishedSession {
    pub session: AuthSession,
    pub token: String,
    pub redirect_to: String,
}

pub fn issue_token(config: &AuthConfig, session_id: &SessionId) -> String {
    sign(&config.session_secret, &session_id.to_string())
}

pub fn parse_token(config: &AuthConfig, token: &str) -> AuthResult<SessionId> {
    let payload = verify_signed(&config.session_secret, token).ok_or(AuthError::SessionInvalid)?;
    payload
        .parse::<Uuid>()
        .map(SessionId::from_uuid)
        .map_err(|_| AuthError::SessionInvalid)
}

/// Admins land on the admin area; everyone else on their dashboard.
pub fn landing_path(config: &AuthConfig, user: &User) -> String {
    if user.role == kernel::principal::Role::Admin {
        config.admin_landing_path.clone()
    } else {
        config.default_landing_path.clone()
    }
}

pub async fn establish<S>(
    session_repo: &S,
    config: &AuthConfig,
    user: &User,
    remember_me: bool,
    fingerprint: &ClientFingerprint,
) -> AuthResult<EstablishedSession>
where
    S: AuthSessionRepository,
{
    let ttl = Duration::from_std(config.session_ttl(remember_me))
        .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))?;

    let session = AuthSession::new(
        user.user_id,
        user.role,
        remember_me,
        fingerprint.hash_vec(),
        fingerprint.ip_string(),
        fingerprint.user_agent.clone(),
        ttl,
    );
    session_repo.create(&session).await?;

    let token = issue_token(config, &session.session_id);

    tracing::info!(
        user_id = %user.user_id,
        session_id = %session.session_id,
        remember_me,
        "Session established"
    );

    Ok(EstablishedSession {
        session,
        token,
        redirect_to: landing_path(config, user),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_and_tamper() {
        let config = AuthConfig::with_random_secret();
        let id = SessionId::new();
        let token = issue_token(&config, &id);
        assert_eq!(parse_token(&config, &token).unwrap(), id);

        let other = AuthConfig::with_random_secret();
        assert!(matches!(parse_token(&other, &token), Err(AuthError::SessionInvalid)));

        let forged = format!("{}.{}", SessionId::new(), token.rsplit_once('.').unwrap().1);
        assert!(matches!(parse_token(&config, &forged), Err(AuthError::SessionInvalid)));
    }
}
