//! OAuth identity provider port

use crate::domain::value_object::oauth_provider::OAuthProvider;
use crate::error::AuthResult;

/// Profile returned by a provider after a successful code exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub provider: OAuthProvider,
    pub provider_id: String,
    /// Absent when the user declined the email scope
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[trait_variant::make(OAuthClient: Send)]
pub trait LocalOAuthClient {
    /// Authorization endpoint URL carrying `state`
    fn authorize_url(&self, provider: OAuthProvider, state: &str) -> AuthResult<String>;

    /// Exchange an authorization code for the user's profile
    async fn exchange_code(&self, provider: OAuthProvider, code: &str) -> AuthResult<OAuthProfile>;
}
