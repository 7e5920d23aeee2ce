//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//!
//! Method names are unique across the traits so one store type can
//! implement all of them without call-site ambiguity.

use chrono::{DateTime, Utc};
use kernel::id::{ContentBlockId, CourseId, ExerciseId, LessonId, ModuleId, UserId};

use crate::domain::entities::{
    BookmarkedLesson, CodeSubmission, ContentBlock, Course, Enrollment, Exercise, Lesson, Module,
    UserProgress,
};
use crate::domain::value_objects::{ProgressStatus, Slug};
use crate::error::LearningResult;

/// Outcome of a write guarded by a unique slug constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugWrite {
    Written,
    SlugTaken,
}

/// Outcome of the atomic enroll statement
#[derive(Debug, Clone)]
pub enum EnrollOutcome {
    Enrolled(Enrollment),
    /// A dropped enrollment was switched back on
    Reactivated(Enrollment),
    AlreadyEnrolled,
    CapacityReached,
}

#[trait_variant::make(CourseRepository: Send)]
pub trait LocalCourseRepository {
    /// Published top-level courses by `sort_order`, then title
    async fn list_published_courses(&self) -> LearningResult<Vec<Course>>;

    async fn list_all_courses(&self) -> LearningResult<Vec<Course>>;

    async fn list_subcourses(
        &self,
        parent: &CourseId,
        published_only: bool,
    ) -> LearningResult<Vec<Course>>;

    async fn find_course(&self, course_id: &CourseId) -> LearningResult<Option<Course>>;

    async fn find_course_by_slug(&self, slug: &Slug) -> LearningResult<Option<Course>>;

    async fn insert_course(&self, course: &Course) -> LearningResult<SlugWrite>;

    async fn update_course(&self, course: &Course) -> LearningResult<SlugWrite>;

    /// Modules, lessons and everything under them go with it
    async fn delete_course(&self, course_id: &CourseId) -> LearningResult<bool>;

    /// Parent, grandparent, ... of `course_id`, nearest first
    async fn course_ancestors(&self, course_id: &CourseId) -> LearningResult<Vec<CourseId>>;
}

#[trait_variant::make(ModuleRepository: Send)]
pub trait LocalModuleRepository {
    async fn list_modules(&self, course_id: &CourseId) -> LearningResult<Vec<Module>>;

    async fn find_module(&self, module_id: &ModuleId) -> LearningResult<Option<Module>>;

    async fn insert_module(&self, module: &Module) -> LearningResult<()>;

    async fn update_module(&self, module: &Module) -> LearningResult<bool>;

    async fn delete_module(&self, module_id: &ModuleId) -> LearningResult<bool>;
}

#[trait_variant::make(LessonRepository: Send)]
pub trait LocalLessonRepository {
    /// Every lesson of a course, drafts included
    async fn list_lessons(&self, course_id: &CourseId) -> LearningResult<Vec<Lesson>>;

    async fn list_module_lessons(&self, module_id: &ModuleId) -> LearningResult<Vec<Lesson>>;

    async fn find_lesson(&self, lesson_id: &LessonId) -> LearningResult<Option<Lesson>>;

    async fn find_lesson_by_slug(
        &self,
        course_id: &CourseId,
        slug: &Slug,
    ) -> LearningResult<Option<Lesson>>;

    /// Slugs are unique within a course
    async fn insert_lesson(&self, lesson: &Lesson) -> LearningResult<SlugWrite>;

    async fn update_lesson(&self, lesson: &Lesson) -> LearningResult<SlugWrite>;

    async fn delete_lesson(&self, lesson_id: &LessonId) -> LearningResult<bool>;

    async fn count_published_lessons(&self, course_id: &CourseId) -> LearningResult<u64>;
}

#[trait_variant::make(ExerciseRepository: Send)]
pub trait LocalExerciseRepository {
    async fn list_exercises(&self, lesson_id: &LessonId) -> LearningResult<Vec<Exercise>>;

    async fn find_exercise(&self, exercise_id: &ExerciseId) -> LearningResult<Option<Exercise>>;

    async fn insert_exercise(&self, exercise: &Exercise) -> LearningResult<()>;

    async fn update_exercise(&self, exercise: &Exercise) -> LearningResult<bool>;

    async fn delete_exercise(&self, exercise_id: &ExerciseId) -> LearningResult<bool>;
}

#[trait_variant::make(ContentBlockRepository: Send)]
pub trait LocalContentBlockRepository {
    async fn list_blocks(&self, lesson_id: &LessonId) -> LearningResult<Vec<ContentBlock>>;

    async fn find_block(&self, block_id: &ContentBlockId) -> LearningResult<Option<ContentBlock>>;

    async fn insert_block(&self, block: &ContentBlock) -> LearningResult<()>;

    async fn update_block(&self, block: &ContentBlock) -> LearningResult<bool>;

    async fn delete_block(&self, block_id: &ContentBlockId) -> LearningResult<bool>;
}

#[trait_variant::make(EnrollmentRepository: Send)]
pub trait LocalEnrollmentRepository {
    /// Seat check and insert as one atomic step, serialized per course.
    /// Existing active enrollments are reported, never duplicated.
    async fn enroll(
        &self,
        user_id: &UserId,
        course: &Course,
        now: DateTime<Utc>,
    ) -> LearningResult<EnrollOutcome>;

    async fn find_enrollment(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> LearningResult<Option<Enrollment>>;

    /// Returns `false` when there was no active enrollment to drop
    async fn drop_enrollment(&self, user_id: &UserId, course_id: &CourseId) -> LearningResult<bool>;

    /// Active enrollments, most recently accessed first
    async fn list_enrollments(&self, user_id: &UserId) -> LearningResult<Vec<Enrollment>>;

    async fn touch_enrollment(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        now: DateTime<Utc>,
    ) -> LearningResult<()>;

    /// Store the recomputed percentage. `completed` moves the enrollment to
    /// `completed`, keeping the first completion time.
    async fn set_enrollment_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        percentage: f64,
        completed: bool,
        now: DateTime<Utc>,
    ) -> LearningResult<()>;
}

#[trait_variant::make(ProgressRepository: Send)]
pub trait LocalProgressRepository {
    async fn find_progress(
        &self,
        user_id: &UserId,
        lesson_id: &LessonId,
    ) -> LearningResult<Option<UserProgress>>;

    /// First view creates an `in_progress` row; later views only bump
    /// `last_accessed_at`.
    async fn start_progress(
        &self,
        user_id: &UserId,
        lesson: &Lesson,
        now: DateTime<Utc>,
    ) -> LearningResult<UserProgress>;

    /// Upsert to `status` (`completed` or `passed`). A `passed` row is
    /// never downgraded and the first `completed_at` is kept.
    async fn complete_progress(
        &self,
        user_id: &UserId,
        lesson: &Lesson,
        status: ProgressStatus,
        now: DateTime<Utc>,
    ) -> LearningResult<UserProgress>;

    /// Upsert to `failed` unless the lesson is already completed or passed
    async fn record_failed_attempt(
        &self,
        user_id: &UserId,
        lesson: &Lesson,
        now: DateTime<Utc>,
    ) -> LearningResult<UserProgress>;

    /// Add to the running total and return it
    async fn add_time_spent(
        &self,
        user_id: &UserId,
        lesson: &Lesson,
        seconds: i64,
        now: DateTime<Utc>,
    ) -> LearningResult<i64>;

    /// Completed or passed rows over the course's published lessons
    async fn count_completed_lessons(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> LearningResult<u64>;
}

#[trait_variant::make(SubmissionRepository: Send)]
pub trait LocalSubmissionRepository {
    async fn insert_submission(&self, submission: &CodeSubmission) -> LearningResult<()>;

    /// Newest first
    async fn list_submissions(
        &self,
        user_id: &UserId,
        exercise_id: &ExerciseId,
    ) -> LearningResult<Vec<CodeSubmission>>;
}

#[trait_variant::make(BookmarkRepository: Send)]
pub trait LocalBookmarkRepository {
    /// Flip the bookmark; returns whether it is set afterwards
    async fn toggle_bookmark(
        &self,
        user_id: &UserId,
        lesson_id: &LessonId,
        now: DateTime<Utc>,
    ) -> LearningResult<bool>;

    async fn is_bookmarked(&self, user_id: &UserId, lesson_id: &LessonId) -> LearningResult<bool>;

    /// Newest first
    async fn list_bookmarks(&self, user_id: &UserId) -> LearningResult<Vec<BookmarkedLesson>>;
}

/// Storage for uploaded images, addressed by generated file name
#[trait_variant::make(ImageStore: Send)]
pub trait LocalImageStore {
    async fn save_image(&self, file_name: &str, bytes: &[u8]) -> LearningResult<()>;

    async fn load_image(&self, file_name: &str) -> LearningResult<Option<Vec<u8>>>;
}

/// Everything the learning handlers need from the database
pub trait LearningStore:
    CourseRepository
    + ModuleRepository
    + LessonRepository
    + ExerciseRepository
    + ContentBlockRepository
    + EnrollmentRepository
    + ProgressRepository
    + SubmissionRepository
    + BookmarkRepository
    + Send
    + Sync
    + 'static
{
}

impl<T> LearningStore for T where
    T: CourseRepository
        + ModuleRepository
        + LessonRepository
        + ExerciseRepository
        + ContentBlockRepository
        + EnrollmentRepository
        + ProgressRepository
        + SubmissionRepository
        + BookmarkRepository
        + Send
        + Sync
        + 'static
{
}
