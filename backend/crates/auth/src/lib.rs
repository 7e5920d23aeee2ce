//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository and OAuth ports
//! - `application/` - Use cases and application services
//! - `infra/` - PostgreSQL repository and the OAuth HTTP client
//! - `presentation/` - HTTP handlers, DTOs, router, session middleware
//!
//! ## Features
//! - Registration with email verification
//! - Email + password sign-in, "remember me" sessions
//! - Google and Facebook sign-in with account linking by email
//! - Password reset by emailed link
//! - Admin user management (list, change role, delete)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional pepper
//! - Verification and reset tokens stored as SHA-256 digests with a
//!   server-checked expiry, cleared on use
//! - Server-side sessions behind an HMAC-signed cookie, bound to the
//!   client's User-Agent fingerprint
//! - OAuth `state` bound to the browser by a signed short-lived cookie and
//!   checked before any provider call

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

pub use application::config::{AuthConfig, OAuthProviderConfig, OAuthSettings};
pub use error::{AuthError, AuthResult};
pub use infra::{oauth_http::HttpOAuthClient, postgres::PgAuthRepository};
pub use presentation::handlers::AuthAppState;
pub use presentation::middleware::{AuthMiddlewareState, resolve_session};
pub use presentation::router::{auth_router, auth_router_generic, session_layer_state};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
