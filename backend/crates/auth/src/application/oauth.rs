//! OAuth sign-in use cases
//!
//! `start` hands the browser to the provider with a random `state`, bound to
//! that browser through a signed short-lived cookie. `callback` checks the
//! state before contacting the provider, then resolves the profile to a
//! user: existing link, else an account with the same email (linked on the
//! spot), else a new verified account.

use std::sync::Arc;

use chrono::Utc;
use platform::client::ClientFingerprint;
use platform::crypto::{constant_time_eq, random_token, sign, verify_signed};

use crate::application::config::AuthConfig;
use crate::application::session::{EstablishedSession, establish};
use crate::domain::entity::user::{OAuthLink, User};
use crate::domain::oauth::{OAuthClient, OAuthProfile};
use crate::domain::repository::{AuthSessionRepository, UserInsert, UserRepository};
use crate::domain::value_object::{email::Email, oauth_provider::OAuthProvider, user_name::UserName};
use crate::error::{AuthError, AuthResult};

const STATE_BYTES: usize = 32;

/// Attempts at finding a free user name before giving up
const MAX_USER_NAME_ATTEMPTS: u32 = 50;

pub struct OAuthStartOutput {
    pub authorize_url: String,
    /// Signed value for the state cookie
    pub state_cookie: String,
}

/// Query parameters of the provider redirect, plus the state cookie
#[derive(Debug, Default)]
pub struct OAuthCallbackInput {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub state_cookie: Option<String>,
}

#[derive(Debug)]
pub struct OAuthCallbackOutput {
    pub user: User,
    pub session_token: String,
    pub redirect_to: String,
    pub created: bool,
}

fn state_cookie_value(config: &AuthConfig, provider: OAuthProvider, state: &str) -> String {
    let expires_at = Utc::now().timestamp() + config.oauth_state_ttl.as_secs() as i64;
    sign(
        &config.session_secret,
        &format!("{}:{}:{}", provider.code(), state, expires_at),
    )
}

/// Cookie payload is `provider:state:expires_at`.
pub fn verify_state(
    config: &AuthConfig,
    provider: OAuthProvider,
    cookie: Option<&str>,
    state: Option<&str>,
) -> AuthResult<()> {
    let (Some(cookie), Some(state)) = (cookie, state) else {
        return Err(AuthError::OAuthStateMismatch);
    };
    let payload =
        verify_signed(&config.session_secret, cookie).ok_or(AuthError::OAuthStateMismatch)?;

    let mut parts = payload.splitn(3, ':');
    let (Some(stored_provider), Some(stored_state), Some(expires_at)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::OAuthStateMismatch);
    };

    let expires_at: i64 = expires_at.parse().map_err(|_| AuthError::OAuthStateMismatch)?;
    if stored_provider != provider.code() || Utc::now().timestamp() >= expires_at {
        return Err(AuthError::OAuthStateMismatch);
    }
    if !constant_time_eq(stored_state.as_bytes(), state.as_bytes()) {
        return Err(AuthError::OAuthStateMismatch);
    }

    Ok(())
}

pub struct OAuthStartUseCase<O>
where
    O: OAuthClient,
{
    oauth_client: Arc<O>,
    config: Arc<AuthConfig>,
}

impl<O> OAuthStartUseCase<O>
where
    O: OAuthClient,
{
    pub fn new(oauth_client: Arc<O>, config: Arc<AuthConfig>) -> Self {
        Self {
            oauth_client,
            config,
        }
    }

    pub fn execute(&self, provider: OAuthProvider) -> AuthResult<OAuthStartOutput> {
        let state = random_token(STATE_BYTES);
        let authorize_url = self.oauth_client.authorize_url(provider, &state)?;

        Ok(OAuthStartOutput {
            authorize_url,
            state_cookie: state_cookie_value(&self.config, provider, &state),
        })
    }
}

pub struct OAuthCallbackUseCase<U, S, O>
where
    U: UserRepository,
    S: AuthSessionRepository,
    O: OAuthClient,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    oauth_client: Arc<O>,
    config: Arc<AuthConfig>,
}

impl<U, S, O> OAuthCallbackUseCase<U, S, O>
where
    U: UserRepository,
    S: AuthSessionRepository,
    O: OAuthClient,
{
    pub fn new(
        user_repo: Arc<U>,
        session_repo: Arc<S>,
        oauth_client: Arc<O>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            oauth_client,
            config,
        }
    }

    pub async fn execute(
        &self,
        provider: OAuthProvider,
        input: OAuthCallbackInput,
        fingerprint: &ClientFingerprint,
    ) -> AuthResult<OAuthCallbackOutput> {
        verify_state(
            &self.config,
            provider,
            input.state_cookie.as_deref(),
            input.state.as_deref(),
        )?;

        if let Some(error) = input.error {
            return Err(AuthError::OAuthProvider(format!("{provider} returned {error}")));
        }
        let code = input
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::OAuthProvider("Missing authorization code".to_string()))?;

        let profile = self.oauth_client.exchange_code(provider, &code).await?;
        let (mut user, created) = self.resolve_user(profile).await?;

        let logged_in_at = user.record_login();
        self.user_repo.record_login(&user.user_id, logged_in_at).await?;

        let EstablishedSession {
            token, redirect_to, ..
        } = establish(self.session_repo.as_ref(), &self.config, &user, false, fingerprint).await?;

        tracing::info!(user_id = %user.user_id, provider = %provider, created, "OAuth sign-in");

        Ok(OAuthCallbackOutput {
            user,
            session_token: token,
            redirect_to,
            created,
        })
    }

    async fn resolve_user(&self, profile: OAuthProfile) -> AuthResult<(User, bool)> {
        if let Some(user) = self
            .user_repo
            .find_by_oauth(profile.provider, &profile.provider_id)
            .await?
        {
            return Ok((user, false));
        }

        let raw_email = profile
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(AuthError::OAuthNoEmail)?;
        let email = Email::new(raw_email).map_err(|_| {
            AuthError::OAuthProvider(format!("{} returned an invalid email", profile.provider))
        })?;

        let link = OAuthLink {
            provider: profile.provider,
            provider_id: profile.provider_id.clone(),
            avatar_url: profile.avatar_url.clone(),
        };

        if let Some(user) = self.user_repo.find_by_email(&email).await? {
            return Ok((self.link_existing(user, link).await?, false));
        }

        let base = UserName::from_email_local_part(email.local_part());
        for attempt in 0..MAX_USER_NAME_ATTEMPTS {
            let user_name = if attempt == 0 {
                base.clone()
            } else {
                base.with_suffix(attempt)
            };
            let user = User::new_oauth(user_name, email.clone(), link.clone());

            match self.user_repo.insert(&user).await? {
                UserInsert::Created => return Ok((user, true)),
                UserInsert::UserNameTaken => continue,
                // A concurrent callback won the race: use what it stored.
                UserInsert::EmailTaken => {
                    let existing = self
                        .user_repo
                        .find_by_email(&email)
                        .await?
                        .ok_or_else(|| AuthError::Internal("User vanished after conflict".to_string()))?;
                    return Ok((self.link_existing(existing, link).await?, false));
                }
                UserInsert::OAuthIdentityTaken => {
                    let existing = self
                        .user_repo
                        .find_by_oauth(link.provider, &link.provider_id)
                        .await?
                        .ok_or_else(|| AuthError::Internal("User vanished after conflict".to_string()))?;
                    return Ok((existing, false));
                }
            }
        }

        Err(AuthError::Internal(format!(
            "No free user name derived from {}",
            base
        )))
    }

    /// Accounts already linked to another provider sign in without relinking.
    async fn link_existing(&self, mut user: User, link: OAuthLink) -> AuthResult<User> {
        if user.oauth.is_some() {
            return Ok(user);
        }
        if self.user_repo.link_oauth(&user.user_id, &link).await? {
            tracing::info!(user_id = %user.user_id, provider = %link.provider, "OAuth identity linked");
            user.oauth = Some(link);
            user.email_verified = true;
            user.verification_token = None;
        }
        Ok(user)
    }
}
