//! Password hashing and policy
//!
//! - Argon2id hashing with an optional application pepper
//! - NFKC normalization before both hashing and verification
//! - Zeroization of clear text on drop
//!
//! Policy follows NIST SP 800-63B: length bounds, no control characters,
//! a small deny-list of trivially guessable values, and no reuse of the
//! account's own identifiers.

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    #[error("Password is too common or follows a predictable pattern")]
    CommonPattern,

    #[error("Password must not contain your user name or email")]
    ContainsIdentity,
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Clear text password, zeroized on drop, never `Clone`
///
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// let password = ClearTextPassword::new("correct horse battery".to_string()).unwrap();
/// let hashed = password.hash(None).unwrap();
/// assert!(hashed.verify(&password, None));
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Validate a new password (registration, reset).
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        if is_common_pattern(&normalized) {
            return Err(PasswordPolicyError::CommonPattern);
        }

        Ok(Self(normalized))
    }

    /// Wrap a submitted login password without applying the policy.
    ///
    /// Accounts created under an older policy must still be able to sign in.
    pub fn for_verification(raw: String) -> Self {
        Self(raw.nfkc().collect())
    }

    /// Reject passwords that embed the account's own identifiers.
    pub fn ensure_not_identity(&self, identifiers: &[&str]) -> Result<(), PasswordPolicyError> {
        let lower = self.0.to_lowercase();
        let hit = identifiers
            .iter()
            .map(|id| id.trim().to_lowercase())
            .filter(|id| id.chars().count() >= 3)
            .any(|id| lower.contains(&id));

        if hit {
            Err(PasswordPolicyError::ContainsIdentity)
        } else {
            Ok(())
        }
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Vec<u8> {
        let mut bytes = self.0.as_bytes().to_vec();
        if let Some(p) = pepper {
            bytes.extend_from_slice(p);
        }
        bytes
    }

    /// Hash with Argon2id (default OWASP parameters, 16-byte random salt).
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let mut input = self.peppered(pepper);
        let salt = SaltString::generate(OsRng);

        let result = Argon2::default()
            .hash_password(&input, &salt)
            .map(|hash| HashedPassword {
                hash: hash.to_string(),
            })
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()));

        input.zeroize();
        result
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

/// Argon2id hash in PHC string format, safe to persist
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Constant-time verification (inside argon2).
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.hash) else {
            return false;
        };

        let mut input = password.peppered(pepper);
        let ok = Argon2::default().verify_password(&input, &parsed).is_ok();
        input.zeroize();
        ok
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

fn is_common_pattern(password: &str) -> bool {
    let lower = password.to_lowercase();

    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    if is_sequential_numbers(&lower) {
        return true;
    }

    const KEYBOARD_PATTERNS: &[&str] = &["qwerty", "asdfgh", "zxcvbn", "qazwsx", "1qaz2wsx"];
    if KEYBOARD_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    const COMMON_PASSWORDS: &[&str] = &[
        "password",
        "password1",
        "password123",
        "abcdefgh",
        "letmein1",
        "welcome1",
        "iloveyou",
        "sunshine",
        "princess",
        "football",
        "baseball",
        "trustno1",
        "learning",
        "student1",
    ];
    COMMON_PASSWORDS.contains(&lower.as_str())
}

fn is_sequential_numbers(s: &str) -> bool {
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 4 || digits.len() != s.chars().count() {
        return false;
    }

    let ascending = digits.windows(2).all(|w| w[1] == (w[0] + 1) % 10);
    let descending = digits.windows(2).all(|w| w[0] == (w[1] + 1) % 10);
    ascending || descending
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_bounds() {
        assert!(matches!(
            ClearTextPassword::new("short".to_string()),
            Err(PasswordPolicyError::TooShort { .. })
        ));
        assert!(matches!(
            ClearTextPassword::new("x".repeat(MAX_PASSWORD_LENGTH + 1)),
            Err(PasswordPolicyError::TooLong { .. })
        ));
        assert!(matches!(
            ClearTextPassword::new("          ".to_string()),
            Err(PasswordPolicyError::EmptyOrWhitespace)
        ));
    }

    #[test]
    fn test_common_patterns() {
        for weak in ["password123", "qwerty2024!", "12345678", "98765432", "zzzzzzzz"] {
            assert!(
                matches!(
                    ClearTextPassword::new(weak.to_string()),
                    Err(PasswordPolicyError::CommonPattern)
                ),
                "{weak} should be rejected"
            );
        }
    }

    #[test]
    fn test_control_character_rejected() {
        assert!(matches!(
            ClearTextPassword::new("tab\u{0007}bell-pass".to_string()),
            Err(PasswordPolicyError::InvalidCharacter)
        ));
    }

    #[test]
    fn test_valid_passwords() {
        assert!(ClearTextPassword::new("Lesson#Plan2024".to_string()).is_ok());
        assert!(ClearTextPassword::new("パスワード安全です!".to_string()).is_ok());
    }

    #[test]
    fn test_identity_check() {
        let password = ClearTextPassword::new("ada_lovelace!42".to_string()).unwrap();
        assert_eq!(
            password.ensure_not_identity(&["ada_lovelace", "ada@example.com"]),
            Err(PasswordPolicyError::ContainsIdentity)
        );
        assert!(password.ensure_not_identity(&["grace"]).is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let password = ClearTextPassword::for_verification("Lesson#Plan2024".to_string());
        let hashed = password.hash(None).unwrap();
        assert!(hashed.verify(&password, None));

        let wrong = ClearTextPassword::for_verification("Lesson#Plan2025".to_string());
        assert!(!hashed.verify(&wrong, None));
    }

    #[test]
    fn test_pepper_must_match() {
        let password = ClearTextPassword::for_verification("Lesson#Plan2024".to_string());
        let hashed = password.hash(Some(b"pepper")).unwrap();

        assert!(hashed.verify(&password, Some(b"pepper")));
        assert!(!hashed.verify(&password, None));
        assert!(!hashed.verify(&password, Some(b"salt")));
    }

    #[test]
    fn test_phc_string_reload() {
        let password = ClearTextPassword::for_verification("Lesson#Plan2024".to_string());
        let hashed = password.hash(None).unwrap();
        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&password, None));

        assert!(HashedPassword::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::for_verification("secret-value".to_string());
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret-value"));
    }
}
