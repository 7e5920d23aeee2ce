//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod oauth_http;
pub mod postgres;

pub use oauth_http::HttpOAuthClient;
pub use postgres::PgAuthRepository;
