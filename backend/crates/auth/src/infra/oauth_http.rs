//! OAuth 2.0 authorization-code client for Google and Facebook

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::application::config::{OAuthProviderConfig, OAuthSettings};
use crate::domain::oauth::{OAuthClient, OAuthProfile};
use crate::domain::value_object::oauth_provider::OAuthProvider;
use crate::error::{AuthError, AuthResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

struct Endpoints {
    authorize: &'static str,
    token: &'static str,
    profile: &'static str,
    scope: &'static str,
}

fn endpoints(provider: OAuthProvider) -> Endpoints {
    match provider {
        OAuthProvider::Google => Endpoints {
            authorize: "https://accounts.google.com/o/oauth2/v2/auth",
            token: "https://oauth2.googleapis.com/token",
            profile: "https://www.googleapis.com/oauth2/v2/userinfo",
            scope: "openid email profile",
        },
        OAuthProvider::Facebook => Endpoints {
            authorize: "https://www.facebook.com/v18.0/dialog/oauth",
            token: "https://graph.facebook.com/v18.0/oauth/access_token",
            profile: "https://graph.facebook.com/me?fields=id,name,email,picture",
            scope: "email,public_profile",
        },
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleProfile {
    id: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FacebookPictureData {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FacebookPicture {
    data: Option<FacebookPictureData>,
}

#[derive(Debug, Deserialize)]
struct FacebookProfile {
    id: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<FacebookPicture>,
}

pub struct HttpOAuthClient {
    settings: OAuthSettings,
    http: reqwest::Client,
}

impl HttpOAuthClient {
    pub fn new(settings: OAuthSettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("learning-hub/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self { settings, http }
    }

    fn config(&self, provider: OAuthProvider) -> AuthResult<&OAuthProviderConfig> {
        self.settings
            .provider(provider)
            .ok_or_else(|| AuthError::OAuthProviderNotConfigured(provider.display_name().to_string()))
    }

    async fn access_token(
        &self,
        provider: OAuthProvider,
        config: &OAuthProviderConfig,
        code: &str,
    ) -> AuthResult<String> {
        let params = [
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(endpoints(provider).token)
            .form(&params)
            .send()
            .await
            .map_err(|e| provider_error(provider, "token request failed", e))?;

        if !response.status().is_success() {
            return Err(AuthError::OAuthProvider(format!(
                "{provider} token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| provider_error(provider, "invalid token response", e))?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::OAuthProvider(format!("{provider} returned no access token")))
    }

    async fn fetch_profile<T>(&self, provider: OAuthProvider, access_token: &str) -> AuthResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .get(endpoints(provider).profile)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| provider_error(provider, "profile request failed", e))?;

        if !response.status().is_success() {
            return Err(AuthError::OAuthProvider(format!(
                "{provider} profile endpoint returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| provider_error(provider, "invalid profile response", e))
    }
}

fn provider_error(provider: OAuthProvider, what: &str, err: reqwest::Error) -> AuthError {
    AuthError::OAuthProvider(format!("{provider} {what}: {err}"))
}

impl OAuthClient for HttpOAuthClient {
    fn authorize_url(&self, provider: OAuthProvider, state: &str) -> AuthResult<String> {
        let config = self.config(provider)?;
        let endpoints = endpoints(provider);

        let url = Url::parse_with_params(
            endpoints.authorize,
            &[
                ("client_id", config.client_id.as_str()),
                ("redirect_uri", config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", endpoints.scope),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Internal(format!("Invalid authorize URL: {e}")))?;

        Ok(url.into())
    }

    async fn exchange_code(&self, provider: OAuthProvider, code: &str) -> AuthResult<OAuthProfile> {
        let config = self.config(provider)?;
        let access_token = self.access_token(provider, config, code).await?;

        let profile = match provider {
            OAuthProvider::Google => {
                let p: GoogleProfile = self.fetch_profile(provider, &access_token).await?;
                OAuthProfile {
                    provider,
                    provider_id: p.id,
                    email: p.email,
                    name: p.name,
                    avatar_url: p.picture,
                }
            }
            OAuthProvider::Facebook => {
                let p: FacebookProfile = self.fetch_profile(provider, &access_token).await?;
                OAuthProfile {
                    provider,
                    provider_id: p.id,
                    email: p.email,
                    name: p.name,
                    avatar_url: p.picture.and_then(|pic| pic.data).and_then(|d| d.url),
                }
            }
        };

        if profile.provider_id.is_empty() {
            return Err(AuthError::OAuthProvider(format!("{provider} returned no user id")));
        }

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpOAuthClient {
        HttpOAuthClient::new(OAuthSettings {
            google: Some(OAuthProviderConfig {
                client_id: "client-123".to_string(),
                client_secret: "secret".to_string(),
                redirect_uri: "http://localhost:3000/api/auth/oauth/google/callback".to_string(),
            }),
            facebook: None,
        })
    }

    #[test]
    fn test_authorize_url_carries_state() {
        let url = client().authorize_url(OAuthProvider::Google, "abc123").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let query: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(query.contains(&("state".to_string(), "abc123".to_string())));
        assert!(query.contains(&("client_id".to_string(), "client-123".to_string())));
        assert!(query.contains(&("response_type".to_string(), "code".to_string())));
    }

    #[test]
    fn test_unconfigured_provider() {
        let err = client().authorize_url(OAuthProvider::Facebook, "s").unwrap_err();
        assert!(matches!(err, AuthError::OAuthProviderNotConfigured(_)));
    }
}
