//! User Name Value Object
//!
//! Public handle shown next to submissions and in the admin listing.
//!
//! ## Invariants
//! - 3 to 30 characters after NFKC normalization and lowercasing
//! - ASCII `a-z`, `0-9`, `_`, `.`, `-` only
//! - Starts and ends with a letter or digit
//! - Not a reserved route word

use std::fmt;

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

pub const USER_NAME_MIN_LENGTH: usize = 3;
pub const USER_NAME_MAX_LENGTH: usize = 30;

const RESERVED_WORDS: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "support",
    "api",
    "auth",
    "oauth",
    "login",
    "logout",
    "register",
    "dashboard",
    "courses",
    "lessons",
    "uploads",
    "me",
    "null",
    "anonymous",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserNameError {
    TooShort { length: usize },
    TooLong { length: usize },
    InvalidCharacter { char: char },
    InvalidEdge { char: char },
    Reserved,
}

impl fmt::Display for UserNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { .. } => write!(
                f,
                "User name must be at least {USER_NAME_MIN_LENGTH} characters"
            ),
            Self::TooLong { .. } => write!(
                f,
                "User name must be at most {USER_NAME_MAX_LENGTH} characters"
            ),
            Self::InvalidCharacter { char } => write!(
                f,
                "User name cannot contain '{char}'; use a-z, 0-9, '_', '.', or '-'"
            ),
            Self::InvalidEdge { char } => {
                write!(f, "User name cannot start or end with '{char}'")
            }
            Self::Reserved => write!(f, "This user name is reserved"),
        }
    }
}

impl std::error::Error for UserNameError {}

/// Validated, lowercase user name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct UserName(String);

impl UserName {
    pub fn new(input: impl AsRef<str>) -> Result<Self, UserNameError> {
        let normalized: String = input.as_ref().trim().nfkc().collect::<String>().to_lowercase();
        Self::validate(&normalized)?;
        Ok(Self(normalized))
    }

    fn validate(name: &str) -> Result<(), UserNameError> {
        let length = name.chars().count();
        if length < USER_NAME_MIN_LENGTH {
            return Err(UserNameError::TooShort { length });
        }
        if length > USER_NAME_MAX_LENGTH {
            return Err(UserNameError::TooLong { length });
        }

        if let Some(char) = name.chars().find(|c| !is_allowed(*c)) {
            return Err(UserNameError::InvalidCharacter { char });
        }

        for edge in [name.chars().next(), name.chars().last()].into_iter().flatten() {
            if !edge.is_ascii_alphanumeric() {
                return Err(UserNameError::InvalidEdge { char: edge });
            }
        }

        if RESERVED_WORDS.contains(&name) {
            return Err(UserNameError::Reserved);
        }

        Ok(())
    }

    /// Derive a handle from an email local part for OAuth-provisioned accounts.
    ///
    /// Plus-addressing tags are dropped, disallowed characters removed, and
    /// short or reserved results padded so the outcome always validates.
    pub fn from_email_local_part(local: &str) -> Self {
        let base = local.split('+').next().unwrap_or(local).to_lowercase();
        let mut cleaned: String = base.chars().filter(|c| is_allowed(*c)).collect();

        cleaned = cleaned
            .trim_matches(|c: char| !c.is_ascii_alphanumeric())
            .chars()
            .take(USER_NAME_MAX_LENGTH)
            .collect();
        cleaned = cleaned
            .trim_end_matches(|c: char| !c.is_ascii_alphanumeric())
            .to_string();

        if cleaned.chars().count() < USER_NAME_MIN_LENGTH || RESERVED_WORDS.contains(&cleaned.as_str()) {
            cleaned = format!("learner{}", cleaned);
            cleaned.truncate(USER_NAME_MAX_LENGTH);
        }

        Self(cleaned)
    }

    /// `base` + numeric suffix, truncating the base so the result fits.
    pub fn with_suffix(&self, suffix: u32) -> Self {
        let suffix = suffix.to_string();
        let room = USER_NAME_MAX_LENGTH - suffix.len();
        let mut base: String = self.0.chars().take(room).collect();
        base = base
            .trim_end_matches(|c: char| !c.is_ascii_alphanumeric())
            .to_string();
        Self(format!("{}{}", base, suffix))
    }

    /// Rehydrate from storage (already validated on the way in)
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-')
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names_are_lowercased() {
        assert_eq!(UserName::new("Ada_Lovelace").unwrap().as_str(), "ada_lovelace");
        assert_eq!(UserName::new("  grace.h-1 ").unwrap().as_str(), "grace.h-1");
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(UserName::new("ab"), Err(UserNameError::TooShort { length: 2 }));
        assert!(UserName::new("a".repeat(30)).is_ok());
        assert_eq!(
            UserName::new("a".repeat(31)),
            Err(UserNameError::TooLong { length: 31 })
        );
    }

    #[test]
    fn test_rejected_characters() {
        assert_eq!(
            UserName::new("ada lovelace"),
            Err(UserNameError::InvalidCharacter { char: ' ' })
        );
        assert_eq!(
            UserName::new("ada+1"),
            Err(UserNameError::InvalidCharacter { char: '+' })
        );
        assert_eq!(UserName::new("_ada"), Err(UserNameError::InvalidEdge { char: '_' }));
        assert_eq!(UserName::new("ada."), Err(UserNameError::InvalidEdge { char: '.' }));
        assert_eq!(UserName::new("admin"), Err(UserNameError::Reserved));
    }

    #[test]
    fn test_from_email_local_part() {
        assert_eq!(UserName::from_email_local_part("Ada.Lovelace").as_str(), "ada.lovelace");
        assert_eq!(UserName::from_email_local_part("ada+courses").as_str(), "ada");
        assert_eq!(UserName::from_email_local_part("j").as_str(), "learnerj");
        assert_eq!(UserName::from_email_local_part("admin").as_str(), "learneradmin");
        assert_eq!(UserName::from_email_local_part("__x__").as_str(), "learnerx");

        let long = UserName::from_email_local_part(&"b".repeat(64));
        assert_eq!(long.as_str().len(), USER_NAME_MAX_LENGTH);
    }

    #[test]
    fn test_derived_names_validate() {
        for local in ["Ada.Lovelace", "x", "o'brien", "--", "ユーザー", "root"] {
            let derived = UserName::from_email_local_part(local);
            assert!(UserName::new(derived.as_str()).is_ok(), "{local} -> {derived}");
        }
    }

    #[test]
    fn test_with_suffix() {
        let name = UserName::new("ada").unwrap();
        assert_eq!(name.with_suffix(1).as_str(), "ada1");
        assert_eq!(name.with_suffix(12).as_str(), "ada12");

        let long = UserName::new("c".repeat(30)).unwrap();
        let suffixed = long.with_suffix(7);
        assert_eq!(suffixed.as_str().len(), USER_NAME_MAX_LENGTH);
        assert!(suffixed.as_str().ends_with('7'));
    }
}
