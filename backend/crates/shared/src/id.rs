//! Common ID Types
//!
//! Type-safe ID wrappers for domain entities.

use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// Generic typed ID wrapper
///
/// Usage:
/// ```
/// use kernel::id::{Id, markers};
/// let user_id: Id<markers::User> = Id::new();
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id<T> {
    value: uuid::Uuid,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    /// Create a new random ID (UUID v4)
    pub fn new() -> Self {
        Self {
            value: Uuid::new_v4(),
            _marker: PhantomData,
        }
    }

    /// Create from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            value: uuid,
            _marker: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.value
    }

    /// Convert to UUID
    pub fn into_uuid(self) -> Uuid {
        self.value
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<Uuid> for Id<T> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl<T> From<Id<T>> for Uuid {
    fn from(id: Id<T>) -> Self {
        id.value
    }
}

impl<T> serde::Serialize for Id<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> serde::Deserialize<'de> for Id<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

/// Marker types for different entity IDs
pub mod markers {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct User;
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Session;
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Course;
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Module;
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Lesson;
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Exercise;
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContentBlock;
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Enrollment;
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Progress;
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Submission;
}

/// Type aliases for common IDs
pub type UserId = Id<markers::User>;
pub type SessionId = Id<markers::Session>;
pub type CourseId = Id<markers::Course>;
pub type ModuleId = Id<markers::Module>;
pub type LessonId = Id<markers::Lesson>;
pub type ExerciseId = Id<markers::Exercise>;
pub type ContentBlockId = Id<markers::ContentBlock>;
pub type EnrollmentId = Id<markers::Enrollment>;
pub type ProgressId = Id<markers::Progress>;
pub type SubmissionId = Id<markers::Submission>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_type_safety() {
        let course_id: CourseId = Id::new();
        let lesson_id: LessonId = Id::new();

        // Distinct types; only the raw UUIDs can be compared
        assert_ne!(course_id.into_uuid(), lesson_id.into_uuid());
    }

    #[test]
    fn test_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id: UserId = Id::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }
}
