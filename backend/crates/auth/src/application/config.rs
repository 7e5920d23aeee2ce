//! Application Configuration

use std::time::Duration;

pub use platform::cookie::SameSite;
use platform::cookie::CookieConfig;

use crate::domain::value_object::oauth_provider::OAuthProvider;

/// Client credentials for one identity provider
#[derive(Debug, Clone)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Default)]
pub struct OAuthSettings {
    pub google: Option<OAuthProviderConfig>,
    pub facebook: Option<OAuthProviderConfig>,
}

impl OAuthSettings {
    pub fn provider(&self, provider: OAuthProvider) -> Option<&OAuthProviderConfig> {
        match provider {
            OAuthProvider::Google => self.google.as_ref(),
            OAuthProvider::Facebook => self.facebook.as_ref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_cookie_name: String,
    /// HMAC key for session cookies and OAuth state cookies
    pub session_secret: [u8; 32],
    /// Session TTL without "Remember Me"
    pub session_ttl_short: Duration,
    /// Session TTL with "Remember Me"
    pub session_ttl_long: Duration,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    pub password_pepper: Option<Vec<u8>>,
    pub verification_token_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub oauth_state_cookie_name: String,
    pub oauth_state_ttl: Duration,
    /// Origin used to build links in outgoing email
    pub public_base_url: String,
    /// Display name in the From header of outgoing email
    pub site_name: String,
    pub admin_landing_path: String,
    pub default_landing_path: String,
    pub oauth: OAuthSettings,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "lms_session".to_string(),
            session_secret: [0u8; 32],
            session_ttl_short: Duration::from_secs(12 * 3600),
            session_ttl_long: Duration::from_secs(30 * 24 * 3600),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            verification_token_ttl: Duration::from_secs(24 * 3600),
            reset_token_ttl: Duration::from_secs(3600),
            oauth_state_cookie_name: "lms_oauth_state".to_string(),
            oauth_state_ttl: Duration::from_secs(10 * 60),
            public_base_url: "http://localhost:3000".to_string(),
            site_name: "Learning Hub".to_string(),
            admin_landing_path: "/admin".to_string(),
            default_landing_path: "/dashboard".to_string(),
            oauth: OAuthSettings::default(),
        }
    }
}

impl AuthConfig {
    pub fn with_random_secret() -> Self {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&platform::crypto::random_bytes(32));
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Random secret, insecure cookies (plain http on localhost)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn session_ttl(&self, remember_me: bool) -> Duration {
        if remember_me {
            self.session_ttl_long
        } else {
            self.session_ttl_short
        }
    }

    fn base_cookie(&self) -> CookieConfig {
        CookieConfig::default()
            .with_secure(self.cookie_secure)
            .with_same_site(self.cookie_same_site)
    }

    pub fn session_cookie(&self) -> CookieConfig {
        self.base_cookie().with_name(self.session_cookie_name.as_str())
    }

    /// Lax is required so the cookie survives the provider's top-level redirect back.
    pub fn oauth_state_cookie(&self) -> CookieConfig {
        self.base_cookie()
            .with_name(self.oauth_state_cookie_name.as_str())
            .with_same_site(SameSite::Lax)
            .with_max_age(self.oauth_state_ttl.as_secs() as i64)
    }

    pub fn verification_link(&self, raw_token: &str) -> String {
        format!(
            "{}/auth/verify-email/{}",
            self.public_base_url.trim_end_matches('/'),
            raw_token
        )
    }

    pub fn reset_link(&self, raw_token: &str) -> String {
        format!(
            "{}/auth/reset-password/{}",
            self.public_base_url.trim_end_matches('/'),
            raw_token
        )
    }
}
