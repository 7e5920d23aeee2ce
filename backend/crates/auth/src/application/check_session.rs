//! Check Session Use Case
//!
//! Resolves a session cookie into the request's `CurrentUser`.

use std::sync::Arc;

use kernel::principal::CurrentUser;
use platform::client::ClientFingerprint;

use crate::application::config::AuthConfig;
use crate::application::session::parse_token;
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

pub struct CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, S> CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        session_token: &str,
        fingerprint: &ClientFingerprint,
    ) -> AuthResult<CurrentUser> {
        let session_id = parse_token(&self.config, session_token)?;

        let mut session = self
            .session_repo
            .find_by_id(&session_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if session.is_expired() {
            self.session_repo.delete(&session_id).await?;
            return Err(AuthError::SessionInvalid);
        }

        if !fingerprint.matches(&session.client_fingerprint_hash) {
            return Err(AuthError::SessionFingerprintMismatch);
        }

        // The role comes from the live row so demotions apply immediately.
        let Some(user) = self.user_repo.find_by_id(&session.user_id).await? else {
            tracing::info!(
                session_id = %session_id,
                user_id = %session.user_id,
                "Session refers to a deleted user; removing it"
            );
            self.session_repo.delete(&session_id).await?;
            return Err(AuthError::SessionInvalid);
        };

        session.touch();
        let ttl_long = chrono::Duration::from_std(self.config.session_ttl_long)
            .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))?;
        session.extend_if_needed(ttl_long);

        let repo = self.session_repo.clone();
        let touched = session.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.update(&touched).await {
                tracing::warn!(error = %e, "Failed to update session activity");
            }
        });

        Ok(CurrentUser {
            user_id: user.user_id,
            user_name: user.user_name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            role: user.role,
            session_id: session.session_id,
        })
    }
}
