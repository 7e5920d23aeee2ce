//! Email Value Object
//!
//! Syntactic validation only; ownership is proven by the verification link
//! (local accounts) or by the identity provider (OAuth accounts).

use serde::Serialize;
use std::fmt;

use crate::error::{AuthError, AuthResult};

/// RFC 5321 path limit
const EMAIL_MAX_LENGTH: usize = 254;
const LOCAL_PART_MAX_LENGTH: usize = 64;

/// Lowercased email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct Email(String);

impl Email {
    pub fn new(email: impl AsRef<str>) -> AuthResult<Self> {
        let email = email.as_ref().trim().to_lowercase();

        if email.is_empty() {
            return Err(AuthError::validation("email", "Email is required"));
        }
        if email.len() > EMAIL_MAX_LENGTH {
            return Err(AuthError::validation(
                "email",
                format!("Email must be at most {} characters", EMAIL_MAX_LENGTH),
            ));
        }
        if !Self::is_valid_format(&email) {
            return Err(AuthError::validation("email", "Enter a valid email address"));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty()
            || local.len() > LOCAL_PART_MAX_LENGTH
            || local.chars().any(|c| c.is_whitespace() || c.is_control())
        {
            return false;
        }

        !domain.is_empty()
            && domain.contains('.')
            && domain
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
            && !domain.starts_with(['.', '-'])
            && !domain.ends_with(['.', '-'])
            && !domain.contains("..")
    }

    /// Rehydrate from storage (already validated on the way in)
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or_default()
    }

    pub fn domain(&self) -> &str {
        self.0.rsplit('@').next().unwrap_or_default()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("user@example.com").is_ok());
        assert!(Email::new("user.name+lms@example.co.uk").is_ok());
        assert_eq!(Email::new("  Ada@Example.COM ").unwrap().as_str(), "ada@example.com");
    }

    #[test]
    fn test_email_invalid() {
        for bad in [
            "",
            "userexample.com",
            "user@",
            "@example.com",
            "user@@example.com",
            "user@example",
            "user@.example.com",
            "user@example..com",
            "us er@example.com",
        ] {
            assert!(
                matches!(Email::new(bad), Err(AuthError::Validation { field: "email", .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_email_parts() {
        let email = Email::new("ada@example.com").unwrap();
        assert_eq!(email.local_part(), "ada");
        assert_eq!(email.domain(), "example.com");
    }
}
