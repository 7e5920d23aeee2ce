//! Domain Entities
//!
//! Content tree (Course -> Module -> Lesson -> Exercise / ContentBlock) and
//! the per-user records hanging off it.

use chrono::{DateTime, Utc};
use kernel::id::{
    ContentBlockId, CourseId, EnrollmentId, ExerciseId, LessonId, ModuleId, ProgressId,
    SubmissionId, UserId,
};

use crate::domain::value_objects::{
    BlockType, ContentType, Difficulty, EnrollmentStatus, EnrollmentType, ProgressStatus,
    PublishStatus, Slug, SubmissionStatus,
};

#[derive(Debug, Clone)]
pub struct Course {
    pub course_id: CourseId,
    pub slug: Slug,
    pub title: String,
    pub description: String,
    pub status: PublishStatus,
    pub difficulty: Difficulty,
    pub enrollment_type: EnrollmentType,
    /// Seat limit; `None` means unlimited
    pub capacity: Option<i32>,
    /// Set on subcourses of a bundle
    pub parent_course_id: Option<CourseId>,
    pub instructor_id: Option<UserId>,
    pub thumbnail_url: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn is_published(&self) -> bool {
        self.status == PublishStatus::Published
    }
}

#[derive(Debug, Clone)]
pub struct Module {
    pub module_id: ModuleId,
    pub course_id: CourseId,
    pub title: String,
    pub description: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Lesson {
    pub lesson_id: LessonId,
    pub module_id: ModuleId,
    /// Always the owning module's course; derived on every write
    pub course_id: CourseId,
    pub slug: Slug,
    pub title: String,
    pub content: String,
    pub status: PublishStatus,
    pub content_type: ContentType,
    pub video_url: Option<String>,
    pub duration_minutes: Option<i32>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    pub fn is_published(&self) -> bool {
        self.status == PublishStatus::Published
    }
}

#[derive(Debug, Clone)]
pub struct Exercise {
    pub exercise_id: ExerciseId,
    pub lesson_id: LessonId,
    pub title: String,
    pub instructions: String,
    pub starter_code: String,
    pub solution_code: String,
    pub hints: Vec<String>,
    /// Stored for authoring tools; grading compares against `solution_code` only
    pub test_cases: serde_json::Value,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ContentBlock {
    pub block_id: ContentBlockId,
    pub lesson_id: LessonId,
    pub block_type: BlockType,
    pub content: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Enrollment {
    pub enrollment_id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub status: EnrollmentStatus,
    /// 0.00 ..= 100.00, two decimals
    pub progress_percentage: f64,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn new(user_id: UserId, course_id: CourseId, now: DateTime<Utc>) -> Self {
        Self {
            enrollment_id: EnrollmentId::new(),
            user_id,
            course_id,
            status: EnrollmentStatus::Enrolled,
            progress_percentage: 0.0,
            enrolled_at: now,
            completed_at: None,
            last_accessed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone)]
pub struct UserProgress {
    pub progress_id: ProgressId,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub status: ProgressStatus,
    pub time_spent_seconds: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

/// Append-only record of one attempt
#[derive(Debug, Clone)]
pub struct CodeSubmission {
    pub submission_id: SubmissionId,
    pub user_id: UserId,
    pub exercise_id: ExerciseId,
    pub code: String,
    pub status: SubmissionStatus,
    pub output: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Bookmark {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub created_at: DateTime<Utc>,
}

/// Bookmark joined with enough of the lesson and course to link back
#[derive(Debug, Clone)]
pub struct BookmarkedLesson {
    pub lesson_id: LessonId,
    pub lesson_slug: Slug,
    pub lesson_title: String,
    pub course_slug: Slug,
    pub course_title: String,
    pub bookmarked_at: DateTime<Utc>,
}
