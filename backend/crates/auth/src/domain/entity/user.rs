//! User Entity
//!
//! A user signs in with a local password, a linked OAuth identity, or both.
//! At least one of the two is always present (enforced by a table CHECK).

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use kernel::principal::Role;

use crate::domain::value_object::{
    email::Email, oauth_provider::OAuthProvider, one_time_token::OneTimeToken,
    user_name::UserName, user_password::UserPassword,
};

/// Federated identity attached to a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthLink {
    pub provider: OAuthProvider,
    pub provider_id: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub user_name: UserName,
    pub email: Email,
    /// `None` for accounts provisioned through OAuth
    pub password_hash: Option<UserPassword>,
    pub role: Role,
    pub oauth: Option<OAuthLink>,
    pub email_verified: bool,
    pub verification_token: Option<OneTimeToken>,
    pub reset_token: Option<OneTimeToken>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Unverified local account; verification token attached by the caller.
    pub fn new_local(user_name: UserName, email: Email, password_hash: UserPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            user_name,
            email,
            password_hash: Some(password_hash),
            role: Role::Student,
            oauth: None,
            email_verified: false,
            verification_token: None,
            reset_token: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// OAuth accounts are verified at creation: the provider vouches for the email.
    pub fn new_oauth(user_name: UserName, email: Email, link: OAuthLink) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            user_name,
            email,
            password_hash: None,
            role: Role::Student,
            oauth: Some(link),
            email_verified: true,
            verification_token: None,
            reset_token: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_oauth_only(&self) -> bool {
        self.password_hash.is_none()
    }

    /// Stamps the login on this copy; persist the returned instant with
    /// `UserRepository::record_login`.
    pub fn record_login(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
        now
    }
}
