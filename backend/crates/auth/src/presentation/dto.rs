//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use kernel::principal::Role;
use serde::{Deserialize, Serialize};

use crate::domain::entity::user::User;

// ============================================================================
// Register
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub message: String,
}

// ============================================================================
// Sign In
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Also returned by the OAuth callback
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub user: UserResponse,
    pub redirect_to: String,
}

// ============================================================================
// Email tokens
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

// ============================================================================
// OAuth
// ============================================================================

/// Query string of the provider redirect
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthStartResponse {
    pub authorize_url: String,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub user_name: String,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
    pub oauth_provider: Option<&'static str>,
    pub avatar_url: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id,
            user_name: user.user_name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            role: user.role,
            email_verified: user.email_verified,
            oauth_provider: user.oauth.as_ref().map(|l| l.provider.code()),
            avatar_url: user.oauth.as_ref().and_then(|l| l.avatar_url.clone()),
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}
