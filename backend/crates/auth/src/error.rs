//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("User name is already taken")]
    UserNameTaken,

    #[error("Email is already registered")]
    EmailTaken,

    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email address has not been verified")]
    UnverifiedEmail,

    #[error("This account signs in with {0}")]
    OAuthOnlyAccount(String),

    #[error("Link is invalid or has expired")]
    InvalidOrExpiredToken,

    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Session not found or expired")]
    SessionInvalid,

    #[error("Session fingerprint mismatch")]
    SessionFingerprintMismatch,

    #[error("OAuth state mismatch")]
    OAuthStateMismatch,

    #[error("OAuth provider error: {0}")]
    OAuthProvider(String),

    #[error("The provider did not share an email address")]
    OAuthNoEmail,

    #[error("Sign-in with {0} is not configured")]
    OAuthProviderNotConfigured(String),

    #[error("Unknown OAuth provider: {0}")]
    UnknownProvider(String),

    #[error("You cannot change or delete your own account here")]
    CannotModifySelf,

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AuthError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserNotFound | AuthError::UnknownProvider(_) => ErrorKind::NotFound,
            AuthError::UserNameTaken | AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::SessionInvalid
            | AuthError::SessionFingerprintMismatch => ErrorKind::Unauthorized,
            AuthError::UnverifiedEmail | AuthError::CannotModifySelf => ErrorKind::Forbidden,
            AuthError::OAuthOnlyAccount(_) => ErrorKind::Conflict,
            AuthError::InvalidOrExpiredToken => ErrorKind::Gone,
            AuthError::Validation { .. } | AuthError::OAuthNoEmail => {
                ErrorKind::UnprocessableEntity
            }
            AuthError::OAuthStateMismatch | AuthError::MissingHeader(_) => ErrorKind::BadRequest,
            AuthError::OAuthProvider(_) => ErrorKind::BadGateway,
            AuthError::OAuthProviderNotConfigured(_) => ErrorKind::ServiceUnavailable,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::Validation { field, message } => err.with_field(*field, message.clone()),
            AuthError::UserNameTaken => err.with_field("user_name", self.to_string()),
            AuthError::EmailTaken => err.with_field("email", self.to_string()),
            AuthError::UnverifiedEmail => {
                err.with_action("Follow the link in your verification email or request a new one")
            }
            AuthError::OAuthOnlyAccount(provider) => {
                err.with_action(format!("Continue with {}", provider))
            }
            AuthError::InvalidOrExpiredToken => err.with_action("Request a new link"),
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::SessionFingerprintMismatch => {
                tracing::warn!("Session fingerprint mismatch detected");
            }
            AuthError::OAuthStateMismatch => {
                tracing::warn!("OAuth callback with mismatched state");
            }
            AuthError::OAuthProvider(msg) => {
                tracing::warn!(message = %msg, "OAuth provider failure");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::client::FingerprintError> for AuthError {
    fn from(err: platform::client::FingerprintError) -> Self {
        match err {
            platform::client::FingerprintError::MissingHeader(header) => {
                AuthError::MissingHeader(header)
            }
        }
    }
}
