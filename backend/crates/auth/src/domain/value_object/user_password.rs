//! User Password Value Object
//!
//! Domain wrappers over `platform::password`:
//! - [`NewPassword`] is a policy-checked password chosen at registration or reset
//! - [`SubmittedPassword`] is whatever was typed into the login form
//! - [`UserPassword`] is the stored Argon2id hash

use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use std::fmt;

use crate::error::{AuthError, AuthResult};

pub struct NewPassword(ClearTextPassword);

impl NewPassword {
    /// Apply the password policy.
    ///
    /// `identifiers` are the account's user name and email, which the
    /// password may not contain.
    pub fn new(raw: String, identifiers: &[&str]) -> AuthResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(policy_error)?;
        clear_text
            .ensure_not_identity(identifiers)
            .map_err(policy_error)?;
        Ok(Self(clear_text))
    }
}

fn policy_error(err: PasswordPolicyError) -> AuthError {
    AuthError::validation("password", err.to_string())
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NewPassword").field(&"[REDACTED]").finish()
    }
}

pub struct SubmittedPassword(ClearTextPassword);

impl SubmittedPassword {
    pub fn new(raw: String) -> Self {
        Self(ClearTextPassword::for_verification(raw))
    }
}

impl fmt::Debug for SubmittedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SubmittedPassword").field(&"[REDACTED]").finish()
    }
}

/// Argon2id hash in PHC format
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_new(password: &NewPassword, pepper: Option<&[u8]>) -> AuthResult<Self> {
        password
            .0
            .hash(pepper)
            .map(Self)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    pub fn from_db(phc_string: impl Into<String>) -> AuthResult<Self> {
        HashedPassword::from_phc_string(phc_string)
            .map(Self)
            .map_err(|_| AuthError::Internal("Invalid password hash in database".to_string()))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    pub fn verify(&self, submitted: &SubmittedPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(&submitted.0, pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword").field("hash", &"[HASH]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_errors_name_the_field() {
        let err = NewPassword::new("short".to_string(), &[]).unwrap_err();
        assert!(matches!(err, AuthError::Validation { field: "password", .. }));

        let err = NewPassword::new("password123".to_string(), &[]).unwrap_err();
        assert!(matches!(err, AuthError::Validation { field: "password", .. }));
    }

    #[test]
    fn test_password_may_not_contain_user_name() {
        let err = NewPassword::new("ada_lovelace#1815".to_string(), &["ada_lovelace", "ada@example.com"])
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation { field: "password", .. }));
    }

    #[test]
    fn test_hash_and_verify() {
        let new = NewPassword::new("Lesson#Plan2024".to_string(), &["ada"]).unwrap();
        let hashed = UserPassword::from_new(&new, Some(b"pepper")).unwrap();

        assert!(hashed.verify(&SubmittedPassword::new("Lesson#Plan2024".to_string()), Some(b"pepper")));
        assert!(!hashed.verify(&SubmittedPassword::new("Lesson#Plan2025".to_string()), Some(b"pepper")));
        assert!(!hashed.verify(&SubmittedPassword::new("Lesson#Plan2024".to_string()), None));
    }

    #[test]
    fn test_reload_from_db() {
        let new = NewPassword::new("Lesson#Plan2024".to_string(), &[]).unwrap();
        let hashed = UserPassword::from_new(&new, None).unwrap();
        let reloaded = UserPassword::from_db(hashed.as_phc_string()).unwrap();
        assert!(reloaded.verify(&SubmittedPassword::new("Lesson#Plan2024".to_string()), None));

        assert!(UserPassword::from_db("plaintext").is_err());
    }
}
