//! Cookie Management Infrastructure

use axum::http::{HeaderMap, HeaderValue, header};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie attributes shared by every cookie the API issues
///
/// The session cookie and the short-lived OAuth state cookie are both
/// derived from one base config so `Secure`/`SameSite` stay consistent.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age_secs: Option<i64>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: None,
        }
    }
}

impl CookieConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_max_age(mut self, secs: i64) -> Self {
        self.max_age_secs = Some(secs);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    fn attributes(&self, max_age: Option<i64>) -> String {
        let mut attrs = String::new();
        if self.http_only {
            attrs.push_str("; HttpOnly");
        }
        if self.secure {
            attrs.push_str("; Secure");
        }
        attrs.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        attrs.push_str(&format!("; Path={}", self.path));
        if let Some(max_age) = max_age {
            attrs.push_str(&format!("; Max-Age={}", max_age));
        }
        attrs
    }

    /// Build Set-Cookie header value
    pub fn build_set_cookie(&self, value: &str) -> String {
        format!("{}={}{}", self.name, value, self.attributes(self.max_age_secs))
    }

    /// Build Set-Cookie header value with an explicit lifetime
    pub fn build_set_cookie_for(&self, value: &str, max_age_secs: i64) -> String {
        format!("{}={}{}", self.name, value, self.attributes(Some(max_age_secs)))
    }

    /// Build Set-Cookie header for deletion (same attributes, expired)
    pub fn build_delete_cookie(&self) -> String {
        format!("{}={}", self.name, self.attributes(Some(0)))
    }
}

/// Extract a cookie value from headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
}

/// Convert a built cookie string into a header value
pub fn header_value(cookie: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(cookie).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_config_build() {
        let config = CookieConfig::named("lms_session")
            .with_path("/api")
            .with_max_age(3600);

        let cookie = config.build_set_cookie("value123");
        assert!(cookie.starts_with("lms_session=value123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/api"));
        assert!(cookie.contains("Max-Age=3600"));
    }

    #[test]
    fn test_delete_cookie_keeps_attributes() {
        let config = CookieConfig::named("oauth_state").with_same_site(SameSite::Strict);
        let cookie = config.build_delete_cookie();
        assert!(cookie.starts_with("oauth_state=;"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_explicit_lifetime() {
        let config = CookieConfig::named("oauth_state").with_secure(false);
        let cookie = config.build_set_cookie_for("s", 600);
        assert!(cookie.contains("Max-Age=600"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; session=abc123; other=xyz"),
        );

        assert_eq!(
            extract_cookie(&headers, "session"),
            Some("abc123".to_string())
        );
        assert_eq!(extract_cookie(&headers, "foo"), Some("bar".to_string()));
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }
}
