//! Register Use Case
//!
//! Creates an unverified local account and emails a verification link.

use std::sync::Arc;

use chrono::Duration;
use platform::mail::Mailer;

use crate::application::config::AuthConfig;
use crate::application::notifications::{send_best_effort, verification_email};
use crate::domain::entity::user::User;
use crate::domain::repository::{UserInsert, UserRepository};
use crate::domain::value_object::{
    email::Email,
    one_time_token::OneTimeToken,
    user_name::UserName,
    user_password::{NewPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct RegisterInput {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

pub struct RegisterUseCase<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    user_repo: Arc<U>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, M> RegisterUseCase<U, M>
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

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<User> {
        let user_name = UserName::new(&input.user_name)
            .map_err(|e| AuthError::validation("user_name", e.to_string()))?;
        let email = Email::new(&input.email)?;
        let password = NewPassword::new(input.password, &[user_name.as_str(), email.as_str()])?;

        // Early checks give friendlier errors; the unique constraints still decide.
        if self.user_repo.exists_by_user_name(&user_name).await? {
            return Err(AuthError::UserNameTaken);
        }
        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = UserPassword::from_new(&password, self.config.pepper())?;
        let mut user = User::new_local(user_name, email, password_hash);

        let ttl = Duration::from_std(self.config.verification_token_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid token TTL: {e}")))?;
        let issued = OneTimeToken::issue(ttl);
        user.verification_token = Some(issued.stored);

        match self.user_repo.insert(&user).await? {
            UserInsert::Created => {}
            UserInsert::UserNameTaken => return Err(AuthError::UserNameTaken),
            UserInsert::EmailTaken => return Err(AuthError::EmailTaken),
            UserInsert::OAuthIdentityTaken => {
                return Err(AuthError::Internal(
                    "OAuth identity conflict on local registration".to_string(),
                ));
            }
        }

        tracing::info!(user_id = %user.user_id, user_name = %user.user_name, "User registered");

        let message = verification_email(&self.config, &user, &issued.raw);
        send_best_effort(self.mailer.as_ref(), message).await;

        Ok(user)
    }
}
