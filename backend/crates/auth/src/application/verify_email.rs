//! Email verification use cases

use std::sync::Arc;

use chrono::{Duration, Utc};
use kernel::id::UserId;
use platform::mail::Mailer;

use crate::application::config::AuthConfig;
use crate::application::notifications::{send_best_effort, verification_email};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, one_time_token::OneTimeToken};
use crate::error::{AuthError, AuthResult};

pub struct VerifyEmailUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> VerifyEmailUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// Redeems a verification token. Unknown, expired and already used
    /// tokens all fail the same way.
    pub async fn execute(&self, raw_token: &str) -> AuthResult<UserId> {
        if raw_token.trim().is_empty() {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let user_id = self
            .user_repo
            .redeem_verification_token(&OneTimeToken::digest(raw_token), Utc::now())
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        tracing::info!(user_id = %user_id, "Email verified");
        Ok(user_id)
    }
}

pub struct ResendVerificationUseCase<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    user_repo: Arc<U>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, M> ResendVerificationUseCase<U, M>
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

    /// Succeeds whether or not the address belongs to an account.
    pub async fn execute(&self, email: &str) -> AuthResult<()> {
        let email = Email::new(email)?;

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            return Ok(());
        };
        if user.email_verified || user.is_oauth_only() {
            return Ok(());
        }

        let ttl = Duration::from_std(self.config.verification_token_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid token TTL: {e}")))?;
        let issued = OneTimeToken::issue(ttl);
        if !self
            .user_repo
            .set_verification_token(&user.user_id, &issued.stored)
            .await?
        {
            return Ok(());
        }

        tracing::info!(user_id = %user.user_id, "Verification email reissued");

        let message = verification_email(&self.config, &user, &issued.raw);
        send_best_effort(self.mailer.as_ref(), message).await;

        Ok(())
    }
}
