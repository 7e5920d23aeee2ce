//! Password reset use cases

use std::sync::Arc;

use chrono::{Duration, Utc};
use kernel::id::UserId;
use platform::mail::Mailer;

use crate::application::config::AuthConfig;
use crate::application::notifications::{password_reset_email, send_best_effort};
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    one_time_token::OneTimeToken,
    user_password::{NewPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct RequestPasswordResetUseCase<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    user_repo: Arc<U>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, M> RequestPasswordResetUseCase<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    pub fn new(user_repo: Arc<U>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            mailer,
            config,
        }
    }

    /// Always succeeds for a well-formed address so the response does not
    /// reveal which emails have accounts.
    pub async fn execute(&self, email: &str) -> AuthResult<()> {
        let email = Email::new(email)?;

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };
        if user.is_oauth_only() {
            tracing::debug!(user_id = %user.user_id, "Password reset skipped for OAuth-only account");
            return Ok(());
        }

        let ttl = Duration::from_std(self.config.reset_token_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid token TTL: {e}")))?;
        let issued = OneTimeToken::issue(ttl);
        if !self.user_repo.set_reset_token(&user.user_id, &issued.stored).await? {
            tracing::debug!(user_id = %user.user_id, "Password reset skipped, account changed");
            return Ok(());
        }

        tracing::info!(user_id = %user.user_id, "Password reset token issued");

        let message = password_reset_email(&self.config, &user, &issued.raw);
        send_best_effort(self.mailer.as_ref(), message).await;

        Ok(())
    }
}

pub struct ResetPasswordUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, S> ResetPasswordUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    /// The password is validated before the token is consumed, so a rejected
    /// password leaves the link usable.
    pub async fn execute(&self, raw_token: &str, new_password: String) -> AuthResult<UserId> {
        if raw_token.trim().is_empty() {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let password = NewPassword::new(new_password, &[])?;
        let password_hash = UserPassword::from_new(&password, self.config.pepper())?;

        let user_id = self
            .user_repo
            .redeem_reset_token(&OneTimeToken::digest(raw_token), &password_hash, Utc::now())
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        let revoked = self.session_repo.delete_all_for_user(&user_id, None).await?;
        tracing::info!(user_id = %user_id, revoked_sessions = revoked, "Password reset");

        Ok(user_id)
    }
}
