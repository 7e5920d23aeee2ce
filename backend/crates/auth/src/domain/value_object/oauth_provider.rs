//! OAuth Provider Value Object

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Facebook,
}

impl OAuthProvider {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Facebook => "facebook",
        }
    }

    #[inline]
    pub const fn display_name(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "Google",
            OAuthProvider::Facebook => "Facebook",
        }
    }
}

impl FromStr for OAuthProvider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(OAuthProvider::Google),
            "facebook" => Ok(OAuthProvider::Facebook),
            other => Err(AuthError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!("google".parse::<OAuthProvider>().unwrap(), OAuthProvider::Google);
        assert_eq!("facebook".parse::<OAuthProvider>().unwrap(), OAuthProvider::Facebook);
        assert!(matches!(
            "github".parse::<OAuthProvider>(),
            Err(AuthError::UnknownProvider(_))
        ));
        assert_eq!(OAuthProvider::Facebook.to_string(), "facebook");
    }
}
