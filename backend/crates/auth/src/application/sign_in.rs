//! Sign In Use Case
//!
//! Authenticates an email + password pair and creates a session.

use std::sync::Arc;

use platform::client::ClientFingerprint;

use crate::application::config::AuthConfig;
use crate::application::session::{EstablishedSession, establish};
use crate::domain::entity::user::User;
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_password::SubmittedPassword};
use crate::error::{AuthError, AuthResult};

pub struct SignInInput {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

#[derive(Debug)]
pub struct SignInOutput {
    pub user: User,
    pub session_token: String,
    pub redirect_to: String,
}

pub struct SignInUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, S> SignInUseCase<U, S>
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

    pub async fn execute(
        &self,
        input: SignInInput,
        fingerprint: &ClientFingerprint,
    ) -> AuthResult<SignInOutput> {
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;
        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(password_hash) = &user.password_hash else {
            let provider = user
                .oauth
                .as_ref()
                .map(|link| link.provider.display_name().to_string())
                .unwrap_or_else(|| "a linked account".to_string());
            return Err(AuthError::OAuthOnlyAccount(provider));
        };

        let submitted = SubmittedPassword::new(input.password);
        if !password_hash.verify(&submitted, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        // Only reveal verification state once the password is proven.
        if !user.email_verified {
            return Err(AuthError::UnverifiedEmail);
        }

        let logged_in_at = user.record_login();
        self.user_repo.record_login(&user.user_id, logged_in_at).await?;

        let EstablishedSession {
            token, redirect_to, ..
        } = establish(
            self.session_repo.as_ref(),
            &self.config,
            &user,
            input.remember_me,
            fingerprint,
        )
        .await?;

        Ok(SignInOutput {
            user,
            session_token: token,
            redirect_to,
        })
    }
}
