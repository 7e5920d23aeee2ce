//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, Utc};
use kernel::id::{SessionId, UserId};
use kernel::principal::Role;

use crate::domain::entity::{
    auth_session::AuthSession,
    user::{OAuthLink, User},
};
use crate::domain::value_object::{
    email::Email, oauth_provider::OAuthProvider, one_time_token::OneTimeToken,
    user_name::UserName, user_password::UserPassword,
};
use crate::error::AuthResult;

/// Result of an insert-or-fail against the unique constraints on `users`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInsert {
    Created,
    UserNameTaken,
    EmailTaken,
    OAuthIdentityTaken,
}

#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new user; unique violations are reported, not raised.
    async fn insert(&self, user: &User) -> AuthResult<UserInsert>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn find_by_oauth(
        &self,
        provider: OAuthProvider,
        provider_id: &str,
    ) -> AuthResult<Option<User>>;

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    async fn record_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()>;

    /// Replace the pending verification token of an unverified account.
    /// Returns `false` when the account is already verified or gone.
    async fn set_verification_token(
        &self,
        user_id: &UserId,
        token: &OneTimeToken,
    ) -> AuthResult<bool>;

    /// Replace the pending reset token of an account with a local password.
    async fn set_reset_token(&self, user_id: &UserId, token: &OneTimeToken) -> AuthResult<bool>;

    /// Attach an OAuth identity to a user that has none yet and mark the
    /// email verified. Returns `false` when the user already had a link.
    async fn link_oauth(&self, user_id: &UserId, link: &OAuthLink) -> AuthResult<bool>;

    /// Atomically mark the email verified and clear the token, only if the
    /// token digest matches and has not expired at `now`.
    async fn redeem_verification_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<UserId>>;

    /// Atomically replace the password and clear the token, only if the
    /// token digest matches and has not expired at `now`.
    async fn redeem_reset_token(
        &self,
        token_hash: &str,
        password_hash: &UserPassword,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<UserId>>;

    async fn list(&self) -> AuthResult<Vec<User>>;

    async fn set_role(&self, user_id: &UserId, role: Role) -> AuthResult<bool>;

    async fn delete(&self, user_id: &UserId) -> AuthResult<bool>;
}

#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    async fn create(&self, session: &AuthSession) -> AuthResult<()>;

    /// Unexpired session by id
    async fn find_by_id(&self, session_id: &SessionId) -> AuthResult<Option<AuthSession>>;

    /// Persist expiry and last activity
    async fn update(&self, session: &AuthSession) -> AuthResult<()>;

    async fn delete(&self, session_id: &SessionId) -> AuthResult<()>;

    async fn delete_all_for_user(
        &self,
        user_id: &UserId,
        except: Option<&SessionId>,
    ) -> AuthResult<u64>;

    async fn cleanup_expired(&self) -> AuthResult<u64>;
}

/// Everything the auth handlers need from storage
pub trait AuthStore: UserRepository + AuthSessionRepository + Send + Sync + 'static {}

impl<T> AuthStore for T where T: UserRepository + AuthSessionRepository + Send + Sync + 'static {}
