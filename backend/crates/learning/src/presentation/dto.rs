//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::{
    ContentBlockId, CourseId, EnrollmentId, ExerciseId, LessonId, ModuleId, SubmissionId, UserId,
};
use serde::{Deserialize, Serialize};

use crate::application::{
    ContentBlockInput, CourseDetail, CourseInput, CourseOutline, CourseProgress, DashboardEntry,
    ExerciseInput, LessonInput, LessonView, ModuleInput, ModuleOutline, SubmissionResult,
    UploadedImage,
};
use crate::domain::entities::{
    BookmarkedLesson, CodeSubmission, ContentBlock, Course, Enrollment, Exercise, Lesson, Module,
    UserProgress,
};
use crate::domain::value_objects::{
    BlockType, ContentType, Difficulty, EnrollmentStatus, EnrollmentType, ProgressStatus,
    PublishStatus, Slug, SubmissionStatus,
};

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: CourseId,
    pub slug: Slug,
    pub title: String,
    pub description: String,
    pub status: PublishStatus,
    pub difficulty: Difficulty,
    pub enrollment_type: EnrollmentType,
    pub capacity: Option<i32>,
    pub parent_course_id: Option<CourseId>,
    pub instructor_id: Option<UserId>,
    pub thumbnail_url: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Course> for CourseResponse {
    fn from(course: &Course) -> Self {
        Self {
            id: course.course_id,
            slug: course.slug.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            status: course.status,
            difficulty: course.difficulty,
            enrollment_type: course.enrollment_type,
            capacity: course.capacity,
            parent_course_id: course.parent_course_id,
            instructor_id: course.instructor_id,
            thumbnail_url: course.thumbnail_url.clone(),
            sort_order: course.sort_order,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<CourseResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseEnvelope {
    pub course: CourseResponse,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleResponse {
    pub id: ModuleId,
    pub course_id: CourseId,
    pub title: String,
    pub description: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Module> for ModuleResponse {
    fn from(module: &Module) -> Self {
        Self {
            id: module.module_id,
            course_id: module.course_id,
            title: module.title.clone(),
            description: module.description.clone(),
            sort_order: module.sort_order,
            created_at: module.created_at,
            updated_at: module.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleListResponse {
    pub modules: Vec<ModuleResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleEnvelope {
    pub module: ModuleResponse,
}

/// Lesson without its body, for outlines and navigation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummary {
    pub id: LessonId,
    pub module_id: ModuleId,
    pub slug: Slug,
    pub title: String,
    pub status: PublishStatus,
    pub content_type: ContentType,
    pub duration_minutes: Option<i32>,
    pub sort_order: i32,
}

impl From<&Lesson> for LessonSummary {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.lesson_id,
            module_id: lesson.module_id,
            slug: lesson.slug.clone(),
            title: lesson.title.clone(),
            status: lesson.status,
            content_type: lesson.content_type,
            duration_minutes: lesson.duration_minutes,
            sort_order: lesson.sort_order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonResponse {
    pub id: LessonId,
    pub module_id: ModuleId,
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

impl From<&Lesson> for LessonResponse {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.lesson_id,
            module_id: lesson.module_id,
            course_id: lesson.course_id,
            slug: lesson.slug.clone(),
            title: lesson.title.clone(),
            content: lesson.content.clone(),
            status: lesson.status,
            content_type: lesson.content_type,
            video_url: lesson.video_url.clone(),
            duration_minutes: lesson.duration_minutes,
            sort_order: lesson.sort_order,
            created_at: lesson.created_at,
            updated_at: lesson.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonListResponse {
    pub lessons: Vec<LessonSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonEnvelope {
    pub lesson: LessonResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleOutlineResponse {
    #[serde(flatten)]
    pub module: ModuleResponse,
    pub lessons: Vec<LessonSummary>,
}

impl From<&ModuleOutline> for ModuleOutlineResponse {
    fn from(outline: &ModuleOutline) -> Self {
        Self {
            module: ModuleResponse::from(&outline.module),
            lessons: outline.lessons.iter().map(LessonSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetailResponse {
    pub course: CourseResponse,
    pub modules: Vec<ModuleOutlineResponse>,
    pub subcourses: Vec<CourseResponse>,
    pub enrollment: Option<EnrollmentResponse>,
}

impl From<&CourseDetail> for CourseDetailResponse {
    fn from(detail: &CourseDetail) -> Self {
        Self {
            course: CourseResponse::from(&detail.course),
            modules: detail.modules.iter().map(ModuleOutlineResponse::from).collect(),
            subcourses: detail.subcourses.iter().map(CourseResponse::from).collect(),
            enrollment: detail.enrollment.as_ref().map(EnrollmentResponse::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlockResponse {
    pub id: ContentBlockId,
    pub lesson_id: LessonId,
    pub block_type: BlockType,
    pub content: String,
    pub sort_order: i32,
}

impl From<&ContentBlock> for ContentBlockResponse {
    fn from(block: &ContentBlock) -> Self {
        Self {
            id: block.block_id,
            lesson_id: block.lesson_id,
            block_type: block.block_type,
            content: block.content.clone(),
            sort_order: block.sort_order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentBlockListResponse {
    pub blocks: Vec<ContentBlockResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentBlockEnvelope {
    pub block: ContentBlockResponse,
}

/// Learner view of an exercise: the solution never leaves the server
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseResponse {
    pub id: ExerciseId,
    pub lesson_id: LessonId,
    pub title: String,
    pub instructions: String,
    pub starter_code: String,
    pub hints: Vec<String>,
    pub sort_order: i32,
}

impl From<&Exercise> for ExerciseResponse {
    fn from(exercise: &Exercise) -> Self {
        Self {
            id: exercise.exercise_id,
            lesson_id: exercise.lesson_id,
            title: exercise.title.clone(),
            instructions: exercise.instructions.clone(),
            starter_code: exercise.starter_code.clone(),
            hints: exercise.hints.clone(),
            sort_order: exercise.sort_order,
        }
    }
}

/// Authoring view of an exercise
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseAdminResponse {
    #[serde(flatten)]
    pub exercise: ExerciseResponse,
    pub solution_code: String,
    pub test_cases: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Exercise> for ExerciseAdminResponse {
    fn from(exercise: &Exercise) -> Self {
        Self {
            exercise: ExerciseResponse::from(exercise),
            solution_code: exercise.solution_code.clone(),
            test_cases: exercise.test_cases.clone(),
            created_at: exercise.created_at,
            updated_at: exercise.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseListResponse {
    pub exercises: Vec<ExerciseAdminResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseEnvelope {
    pub exercise: ExerciseAdminResponse,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub lesson_id: LessonId,
    pub status: ProgressStatus,
    pub time_spent_seconds: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl From<&UserProgress> for ProgressResponse {
    fn from(progress: &UserProgress) -> Self {
        Self {
            lesson_id: progress.lesson_id,
            status: progress.status,
            time_spent_seconds: progress.time_spent_seconds,
            completed_at: progress.completed_at,
            last_accessed_at: progress.last_accessed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonViewResponse {
    pub course: CourseResponse,
    pub lesson: LessonResponse,
    pub blocks: Vec<ContentBlockResponse>,
    pub exercises: Vec<ExerciseResponse>,
    pub progress: Option<ProgressResponse>,
    pub enrollment: Option<EnrollmentResponse>,
    pub bookmarked: bool,
    pub previous_lesson: Option<LessonSummary>,
    pub next_lesson: Option<LessonSummary>,
}

impl From<&LessonView> for LessonViewResponse {
    fn from(view: &LessonView) -> Self {
        Self {
            course: CourseResponse::from(&view.course),
            lesson: LessonResponse::from(&view.lesson),
            blocks: view.blocks.iter().map(ContentBlockResponse::from).collect(),
            exercises: view.exercises.iter().map(ExerciseResponse::from).collect(),
            progress: view.progress.as_ref().map(ProgressResponse::from),
            enrollment: view.enrollment.as_ref().map(EnrollmentResponse::from),
            bookmarked: view.bookmarked,
            previous_lesson: view.previous.as_ref().map(LessonSummary::from),
            next_lesson: view.next.as_ref().map(LessonSummary::from),
        }
    }
}

// ============================================================================
// Enrollment & progress
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub id: EnrollmentId,
    pub course_id: CourseId,
    pub status: EnrollmentStatus,
    pub progress_percentage: f64,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl From<&Enrollment> for EnrollmentResponse {
    fn from(enrollment: &Enrollment) -> Self {
        Self {
            id: enrollment.enrollment_id,
            course_id: enrollment.course_id,
            status: enrollment.status,
            progress_percentage: enrollment.progress_percentage,
            enrolled_at: enrollment.enrolled_at,
            completed_at: enrollment.completed_at,
            last_accessed_at: enrollment.last_accessed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollResponse {
    pub enrollment: EnrollmentResponse,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardItem {
    pub course: CourseResponse,
    pub enrollment: EnrollmentResponse,
}

impl From<&DashboardEntry> for DashboardItem {
    fn from(entry: &DashboardEntry) -> Self {
        Self {
            course: CourseResponse::from(&entry.course),
            enrollment: EnrollmentResponse::from(&entry.enrollment),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub enrollments: Vec<DashboardItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressResponse {
    pub course_id: CourseId,
    pub progress_percentage: f64,
    pub course_completed: bool,
}

impl From<&CourseProgress> for CourseProgressResponse {
    fn from(progress: &CourseProgress) -> Self {
        Self {
            course_id: progress.course_id,
            progress_percentage: progress.percentage,
            course_completed: progress.completed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackTimeRequest {
    pub seconds: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackTimeResponse {
    pub time_spent_seconds: i64,
}

// ============================================================================
// Bookmarks
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct BookmarkToggleResponse {
    pub bookmarked: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkResponse {
    pub lesson_id: LessonId,
    pub lesson_slug: Slug,
    pub lesson_title: String,
    pub course_slug: Slug,
    pub course_title: String,
    pub bookmarked_at: DateTime<Utc>,
}

impl From<&BookmarkedLesson> for BookmarkResponse {
    fn from(bookmark: &BookmarkedLesson) -> Self {
        Self {
            lesson_id: bookmark.lesson_id,
            lesson_slug: bookmark.lesson_slug.clone(),
            lesson_title: bookmark.lesson_title.clone(),
            course_slug: bookmark.course_slug.clone(),
            course_title: bookmark.course_title.clone(),
            bookmarked_at: bookmark.bookmarked_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookmarkListResponse {
    pub bookmarks: Vec<BookmarkResponse>,
}

// ============================================================================
// Submissions
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: SubmissionId,
    pub exercise_id: ExerciseId,
    pub code: String,
    pub status: SubmissionStatus,
    pub output: String,
    pub submitted_at: DateTime<Utc>,
}

impl From<&CodeSubmission> for SubmissionResponse {
    fn from(submission: &CodeSubmission) -> Self {
        Self {
            id: submission.submission_id,
            exercise_id: submission.exercise_id,
            code: submission.code.clone(),
            status: submission.status,
            output: submission.output.clone(),
            submitted_at: submission.submitted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub submission: SubmissionResponse,
    /// Present when a pass completed the lesson
    pub course_progress: Option<CourseProgressResponse>,
}

impl From<&SubmissionResult> for SubmitResponse {
    fn from(result: &SubmissionResult) -> Self {
        Self {
            submission: SubmissionResponse::from(&result.submission),
            course_progress: result.course_progress.as_ref().map(CourseProgressResponse::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionListResponse {
    pub submissions: Vec<SubmissionResponse>,
}

// ============================================================================
// Authoring
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub enrollment_type: EnrollmentType,
    #[serde(default)]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub parent_course_id: Option<CourseId>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

impl From<CourseRequest> for CourseInput {
    fn from(req: CourseRequest) -> Self {
        Self {
            title: req.title,
            slug: req.slug,
            description: req.description,
            status: req.status,
            difficulty: req.difficulty,
            enrollment_type: req.enrollment_type,
            capacity: req.capacity,
            parent_course_id: req.parent_course_id,
            thumbnail_url: req.thumbnail_url,
            sort_order: req.sort_order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseOutlineResponse {
    pub course: CourseResponse,
    pub modules: Vec<ModuleResponse>,
    pub lessons: Vec<LessonSummary>,
}

impl From<&CourseOutline> for CourseOutlineResponse {
    fn from(outline: &CourseOutline) -> Self {
        Self {
            course: CourseResponse::from(&outline.course),
            modules: outline.modules.iter().map(ModuleResponse::from).collect(),
            lessons: outline.lessons.iter().map(LessonSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_order: i32,
}

impl From<ModuleRequest> for ModuleInput {
    fn from(req: ModuleRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            sort_order: req.sort_order,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRequest {
    pub module_id: ModuleId,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub sort_order: i32,
}

impl From<LessonRequest> for LessonInput {
    fn from(req: LessonRequest) -> Self {
        Self {
            module_id: req.module_id,
            title: req.title,
            slug: req.slug,
            content: req.content,
            status: req.status,
            content_type: req.content_type,
            video_url: req.video_url,
            duration_minutes: req.duration_minutes,
            sort_order: req.sort_order,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRequest {
    pub title: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub starter_code: String,
    pub solution_code: String,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub test_cases: serde_json::Value,
    #[serde(default)]
    pub sort_order: i32,
}

impl From<ExerciseRequest> for ExerciseInput {
    fn from(req: ExerciseRequest) -> Self {
        Self {
            title: req.title,
            instructions: req.instructions,
            starter_code: req.starter_code,
            solution_code: req.solution_code,
            hints: req.hints,
            test_cases: req.test_cases,
            sort_order: req.sort_order,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlockRequest {
    pub block_type: BlockType,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sort_order: i32,
}

impl From<ContentBlockRequest> for ContentBlockInput {
    fn from(req: ContentBlockRequest) -> Self {
        Self {
            block_type: req.block_type,
            content: req.content,
            sort_order: req.sort_order,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_name: String,
    pub url: String,
    pub mime_type: &'static str,
    pub size: usize,
}

impl From<&UploadedImage> for UploadResponse {
    fn from(image: &UploadedImage) -> Self {
        Self {
            file_name: image.file_name.clone(),
            url: image.url.clone(),
            mime_type: image.kind.mime(),
            size: image.size,
        }
    }
}
