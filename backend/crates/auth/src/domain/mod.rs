//! Domain Layer
//!
//! Contains entities, value objects, repository traits, and the OAuth port.

pub mod entity;
pub mod oauth;
pub mod repository;
pub mod value_object;

pub use entity::{auth_session::AuthSession, user::User};
pub use oauth::{OAuthClient, OAuthProfile};
pub use repository::{AuthSessionRepository, AuthStore, UserInsert, UserRepository};
