//! Domain Value Objects
//!
//! Slugs and the small closed vocabularies stored as text columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const SLUG_MAX_LENGTH: usize = 120;

/// Stored enum columns: `code()` is the database and JSON form
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $code:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

text_enum! {
    /// Visibility of courses and lessons
    pub enum PublishStatus {
        Draft => "draft",
        Published => "published",
    }
}

text_enum! {
    pub enum Difficulty {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

text_enum! {
    pub enum EnrollmentType {
        Open => "open",
        ApprovalRequired => "approval_required",
        Closed => "closed",
    }
}

text_enum! {
    pub enum ContentType {
        Text => "text",
        Video => "video",
        Mixed => "mixed",
        Markdown => "markdown",
    }
}

text_enum! {
    pub enum BlockType {
        Text => "text",
        Code => "code",
        Image => "image",
        Video => "video",
        Callout => "callout",
    }
}

text_enum! {
    pub enum EnrollmentStatus {
        Enrolled => "enrolled",
        Completed => "completed",
        Dropped => "dropped",
    }
}

text_enum! {
    pub enum ProgressStatus {
        InProgress => "in_progress",
        Completed => "completed",
        Passed => "passed",
        Failed => "failed",
    }
}

text_enum! {
    pub enum SubmissionStatus {
        Passed => "passed",
        Failed => "failed",
    }
}

impl Default for PublishStatus {
    fn default() -> Self {
        PublishStatus::Draft
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Beginner
    }
}

impl Default for EnrollmentType {
    fn default() -> Self {
        EnrollmentType::Open
    }
}

impl Default for ContentType {
    fn default() -> Self {
        ContentType::Markdown
    }
}

impl EnrollmentStatus {
    /// Dropped enrollments no longer grant access or hold a seat
    pub const fn is_active(&self) -> bool {
        !matches!(self, EnrollmentStatus::Dropped)
    }
}

impl ProgressStatus {
    /// Statuses that count towards course progress
    pub const fn is_complete(&self) -> bool {
        matches!(self, ProgressStatus::Completed | ProgressStatus::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    Empty,
    TooLong { length: usize },
    InvalidCharacter { char: char },
    InvalidHyphen,
}

impl fmt::Display for SlugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Slug is required"),
            Self::TooLong { .. } => write!(f, "Slug must be at most {SLUG_MAX_LENGTH} characters"),
            Self::InvalidCharacter { char } => {
                write!(f, "Slug cannot contain '{char}'; use a-z, 0-9 and '-'")
            }
            Self::InvalidHyphen => {
                write!(f, "Slug cannot start or end with '-' or contain '--'")
            }
        }
    }
}

impl std::error::Error for SlugError {}

/// URL segment for courses and lessons: `[a-z0-9]+(-[a-z0-9]+)*`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn new(input: impl AsRef<str>) -> Result<Self, SlugError> {
        let value = input.as_ref().trim().to_ascii_lowercase();

        if value.is_empty() {
            return Err(SlugError::Empty);
        }
        if value.len() > SLUG_MAX_LENGTH {
            return Err(SlugError::TooLong { length: value.len() });
        }
        if let Some(char) = value
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(SlugError::InvalidCharacter { char });
        }
        if value.starts_with('-') || value.ends_with('-') || value.contains("--") {
            return Err(SlugError::InvalidHyphen);
        }

        Ok(Self(value))
    }

    /// Derive a slug from a human title: ASCII alphanumerics kept, every
    /// other run of characters collapsed into one hyphen.
    pub fn from_title(title: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(title.len());
        for c in title.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }

        let mut slug = slug.trim_end_matches('-').to_string();
        if slug.len() > SLUG_MAX_LENGTH {
            slug.truncate(SLUG_MAX_LENGTH);
            slug = slug.trim_end_matches('-').to_string();
        }

        Self::new(slug)
    }

    /// `python-basics` -> `python-basics-2`, trimming to fit the length cap
    pub fn with_suffix(&self, n: u32) -> Self {
        let suffix = format!("-{n}");
        let keep = SLUG_MAX_LENGTH.saturating_sub(suffix.len()).min(self.0.len());
        let base = self.0[..keep].trim_end_matches('-');
        Self(format!("{base}{suffix}"))
    }

    /// Trust a value read back from the database
    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

/// Seconds reported by one time-tracking ping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedSeconds(i64);

impl TrackedSeconds {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 86_400;

    pub fn new(seconds: i64) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&seconds).then_some(Self(seconds))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_accepts_canonical_form() {
        assert_eq!(Slug::new("python-basics").unwrap().as_str(), "python-basics");
        assert_eq!(Slug::new(" Rust-101 ").unwrap().as_str(), "rust-101");
    }

    #[test]
    fn test_slug_rejects_bad_input() {
        assert_eq!(Slug::new(""), Err(SlugError::Empty));
        assert_eq!(Slug::new("-lead"), Err(SlugError::InvalidHyphen));
        assert_eq!(Slug::new("a--b"), Err(SlugError::InvalidHyphen));
        assert_eq!(
            Slug::new("a_b"),
            Err(SlugError::InvalidCharacter { char: '_' })
        );
        assert!(matches!(
            Slug::new("a".repeat(SLUG_MAX_LENGTH + 1)),
            Err(SlugError::TooLong { .. })
        ));
    }

    #[test]
    fn test_slug_from_title() {
        assert_eq!(Slug::from_title("Python Basics").unwrap().as_str(), "python-basics");
        assert_eq!(
            Slug::from_title("  C++ & Rust: the good parts!  ").unwrap().as_str(),
            "c-rust-the-good-parts"
        );
        assert_eq!(Slug::from_title("???"), Err(SlugError::Empty));
    }

    #[test]
    fn test_slug_suffix_respects_limit() {
        let slug = Slug::new("intro").unwrap();
        assert_eq!(slug.with_suffix(2).as_str(), "intro-2");

        let long = Slug::new("a".repeat(SLUG_MAX_LENGTH)).unwrap();
        let suffixed = long.with_suffix(12);
        assert_eq!(suffixed.as_str().len(), SLUG_MAX_LENGTH);
        assert!(suffixed.as_str().ends_with("-12"));
    }

    #[test]
    fn test_text_enum_codes() {
        assert_eq!(
            EnrollmentType::from_code("approval_required"),
            Some(EnrollmentType::ApprovalRequired)
        );
        assert_eq!(ProgressStatus::InProgress.code(), "in_progress");
        assert_eq!(BlockType::from_code("quiz"), None);
        assert_eq!(
            serde_json::to_string(&EnrollmentStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn test_completion_statuses() {
        assert!(ProgressStatus::Completed.is_complete());
        assert!(ProgressStatus::Passed.is_complete());
        assert!(!ProgressStatus::InProgress.is_complete());
        assert!(!ProgressStatus::Failed.is_complete());
        assert!(!EnrollmentStatus::Dropped.is_active());
    }

    #[test]
    fn test_tracked_seconds_bounds() {
        assert!(TrackedSeconds::new(0).is_none());
        assert_eq!(TrackedSeconds::new(1).map(|s| s.get()), Some(1));
        assert!(TrackedSeconds::new(86_400).is_some());
        assert!(TrackedSeconds::new(86_401).is_none());
    }
}
