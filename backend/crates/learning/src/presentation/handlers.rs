//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use kernel::id::{ContentBlockId, CourseId, ExerciseId, LessonId, ModuleId};
use kernel::principal::CurrentUser;
use kernel::response::Success;
use uuid::Uuid;

use crate::application::config::LearningConfig;
use crate::application::{
    ContentBlockAuthoring, CourseAuthoring, CourseDetailUseCase, DashboardUseCase,
    DropEnrollmentUseCase, EnrollUseCase, ExerciseAuthoring, LessonAuthoring,
    ListBookmarksUseCase, ListCoursesUseCase, ListSubmissionsUseCase, MarkLessonCompleteUseCase,
    ModuleAuthoring, ServeImageUseCase, SubmitExerciseUseCase, ToggleBookmarkUseCase,
    TrackTimeUseCase, UploadImageUseCase, ViewLessonUseCase,
};
use crate::domain::repository::{ImageStore, LearningStore};
use crate::domain::value_objects::PublishStatus;
use crate::error::{LearningError, LearningResult};
use crate::presentation::dto::{
    BookmarkListResponse, BookmarkResponse, BookmarkToggleResponse, ContentBlockEnvelope,
    ContentBlockListResponse, ContentBlockRequest, ContentBlockResponse, CourseDetailResponse,
    CourseEnvelope, CourseListResponse, CourseOutlineResponse, CourseProgressResponse,
    CourseRequest, CourseResponse, DashboardItem, DashboardResponse, EnrollResponse,
    EnrollmentResponse, ExerciseAdminResponse, ExerciseEnvelope, ExerciseListResponse,
    ExerciseRequest, LessonEnvelope, LessonListResponse, LessonRequest, LessonResponse,
    LessonSummary, LessonViewResponse, ModuleEnvelope, ModuleListResponse, ModuleRequest,
    ModuleResponse, SubmissionListResponse, SubmissionResponse, SubmitRequest, SubmitResponse,
    TrackTimeRequest, TrackTimeResponse, UploadResponse,
};

/// Multipart field carrying the uploaded image
const IMAGE_FIELD: &str = "image";

/// Shared state for learning handlers
pub struct LearningAppState<R, I> {
    pub repo: Arc<R>,
    pub images: Arc<I>,
    pub config: Arc<LearningConfig>,
}

impl<R, I> Clone for LearningAppState<R, I> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            images: self.images.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, I> LearningAppState<R, I> {
    pub fn new(repo: R, images: I, config: LearningConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            images: Arc::new(images),
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /api/courses
pub async fn list_courses<R, I>(
    State(state): State<LearningAppState<R, I>>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let courses = ListCoursesUseCase::new(state.repo.clone()).execute().await?;

    Ok(Success::new(CourseListResponse {
        courses: courses.iter().map(CourseResponse::from).collect(),
    }))
}

/// GET /api/courses/{slug}
pub async fn course_detail<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: Option<CurrentUser>,
    Path(slug): Path<String>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let detail = CourseDetailUseCase::new(state.repo.clone())
        .execute(&slug, current.as_ref())
        .await?;

    Ok(Success::new(CourseDetailResponse::from(&detail)))
}

/// GET /api/courses/{slug}/lessons/{lesson_slug}
pub async fn view_lesson<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: CurrentUser,
    Path((course_slug, lesson_slug)): Path<(String, String)>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let view = ViewLessonUseCase::new(state.repo.clone())
        .execute(&current, &course_slug, &lesson_slug)
        .await?;

    Ok(Success::new(LessonViewResponse::from(&view)))
}

// ============================================================================
// Enrollment & progress
// ============================================================================

/// POST /api/courses/{slug}/enroll
pub async fn enroll<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: CurrentUser,
    Path(slug): Path<String>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let enrollment = EnrollUseCase::new(state.repo.clone())
        .execute(&current, &slug)
        .await?;

    Ok((
        StatusCode::CREATED,
        Success::new(EnrollResponse {
            enrollment: EnrollmentResponse::from(&enrollment),
            message: "Enrolled".to_string(),
        }),
    ))
}

/// POST /api/courses/{slug}/drop
pub async fn drop_enrollment<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: CurrentUser,
    Path(slug): Path<String>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    DropEnrollmentUseCase::new(state.repo.clone())
        .execute(&current, &slug)
        .await?;

    Ok(Success::message("Enrollment dropped"))
}

/// GET /api/dashboard
pub async fn dashboard<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: CurrentUser,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let entries = DashboardUseCase::new(state.repo.clone())
        .execute(&current)
        .await?;

    Ok(Success::new(DashboardResponse {
        enrollments: entries.iter().map(DashboardItem::from).collect(),
    }))
}

/// POST /api/lessons/{id}/complete
pub async fn complete_lesson<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: CurrentUser,
    Path(lesson_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let progress = MarkLessonCompleteUseCase::new(state.repo.clone())
        .execute(&current, &LessonId::from_uuid(lesson_id))
        .await?;

    Ok(Success::new(CourseProgressResponse::from(&progress)))
}

/// POST /api/lessons/{id}/time
pub async fn track_time<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: CurrentUser,
    Path(lesson_id): Path<Uuid>,
    Json(req): Json<TrackTimeRequest>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let total = TrackTimeUseCase::new(state.repo.clone())
        .execute(&current, &LessonId::from_uuid(lesson_id), req.seconds)
        .await?;

    Ok(Success::new(TrackTimeResponse {
        time_spent_seconds: total,
    }))
}

// ============================================================================
// Bookmarks
// ============================================================================

/// POST /api/lessons/{id}/bookmark
pub async fn toggle_bookmark<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: CurrentUser,
    Path(lesson_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let bookmarked = ToggleBookmarkUseCase::new(state.repo.clone())
        .execute(&current, &LessonId::from_uuid(lesson_id))
        .await?;

    Ok(Success::new(BookmarkToggleResponse { bookmarked }))
}

/// GET /api/bookmarks
pub async fn list_bookmarks<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: CurrentUser,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let bookmarks = ListBookmarksUseCase::new(state.repo.clone())
        .execute(&current)
        .await?;

    Ok(Success::new(BookmarkListResponse {
        bookmarks: bookmarks.iter().map(BookmarkResponse::from).collect(),
    }))
}

// ============================================================================
// Submissions
// ============================================================================

/// POST /api/exercises/{id}/submit
pub async fn submit_exercise<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: CurrentUser,
    Path(exercise_id): Path<Uuid>,
    Json(req): Json<SubmitRequest>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let result = SubmitExerciseUseCase::new(state.repo.clone())
        .execute(&current, &ExerciseId::from_uuid(exercise_id), req.code)
        .await?;

    Ok(Success::new(SubmitResponse::from(&result)))
}

/// GET /api/exercises/{id}/submissions
pub async fn list_submissions<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: CurrentUser,
    Path(exercise_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let submissions = ListSubmissionsUseCase::new(state.repo.clone())
        .execute(&current, &ExerciseId::from_uuid(exercise_id))
        .await?;

    Ok(Success::new(SubmissionListResponse {
        submissions: submissions.iter().map(SubmissionResponse::from).collect(),
    }))
}

// ============================================================================
// Uploads
// ============================================================================

/// GET /api/uploads/{file}
pub async fn serve_upload<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(file_name): Path<String>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let (kind, bytes) = ServeImageUseCase::new(state.images.clone())
        .execute(&file_name)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, kind.mime()),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    ))
}

/// POST /api/admin/uploads
pub async fn upload_image<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let limit = state.config.max_upload_bytes;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let declared = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

        let image = UploadImageUseCase::new(state.images.clone(), state.config.clone())
            .execute(declared.as_deref(), &bytes)
            .await?;
        tracing::debug!(user_id = %current.user_id, file_name = %image.file_name, "Upload stored");

        return Ok((StatusCode::CREATED, Success::new(UploadResponse::from(&image))));
    }

    Err(LearningError::BadUpload(format!("missing '{IMAGE_FIELD}' field")))
}

fn multipart_error(err: MultipartError, limit: usize) -> LearningError {
    // Body limit hit before the use case could see the size
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return LearningError::PayloadTooLarge(limit);
    }
    LearningError::BadUpload(err.body_text())
}

// ============================================================================
// Course authoring
// ============================================================================

/// GET /api/admin/courses
pub async fn admin_list_courses<R, I>(
    State(state): State<LearningAppState<R, I>>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let courses = CourseAuthoring::new(state.repo.clone()).list().await?;

    Ok(Success::new(CourseListResponse {
        courses: courses.iter().map(CourseResponse::from).collect(),
    }))
}

/// GET /api/admin/courses/{id}
pub async fn admin_course_outline<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(course_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let outline = CourseAuthoring::new(state.repo.clone())
        .outline(&CourseId::from_uuid(course_id))
        .await?;

    Ok(Success::new(CourseOutlineResponse::from(&outline)))
}

/// POST /api/admin/courses
pub async fn create_course<R, I>(
    State(state): State<LearningAppState<R, I>>,
    current: CurrentUser,
    Json(req): Json<CourseRequest>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let course = CourseAuthoring::new(state.repo.clone())
        .create(&current, req.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Success::new(CourseEnvelope {
            course: CourseResponse::from(&course),
        }),
    ))
}

/// PUT /api/admin/courses/{id}
pub async fn update_course<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<CourseRequest>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let course = CourseAuthoring::new(state.repo.clone())
        .update(&CourseId::from_uuid(course_id), req.into())
        .await?;

    Ok(Success::new(CourseEnvelope {
        course: CourseResponse::from(&course),
    }))
}

/// POST /api/admin/courses/{id}/publish
pub async fn publish_course<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(course_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    set_course_status(&state, course_id, PublishStatus::Published).await
}

/// POST /api/admin/courses/{id}/unpublish
pub async fn unpublish_course<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(course_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    set_course_status(&state, course_id, PublishStatus::Draft).await
}

async fn set_course_status<R, I>(
    state: &LearningAppState<R, I>,
    course_id: Uuid,
    status: PublishStatus,
) -> LearningResult<Success<CourseEnvelope>>
where
    R: LearningStore,
{
    let course = CourseAuthoring::new(state.repo.clone())
        .set_status(&CourseId::from_uuid(course_id), status)
        .await?;

    Ok(Success::new(CourseEnvelope {
        course: CourseResponse::from(&course),
    }))
}

/// DELETE /api/admin/courses/{id}
pub async fn delete_course<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(course_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    CourseAuthoring::new(state.repo.clone())
        .delete(&CourseId::from_uuid(course_id))
        .await?;

    Ok(Success::message("Course deleted"))
}

// ============================================================================
// Module authoring
// ============================================================================

/// GET /api/admin/courses/{id}/modules
pub async fn list_modules<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(course_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let modules = ModuleAuthoring::new(state.repo.clone())
        .list(&CourseId::from_uuid(course_id))
        .await?;

    Ok(Success::new(ModuleListResponse {
        modules: modules.iter().map(ModuleResponse::from).collect(),
    }))
}

/// POST /api/admin/courses/{id}/modules
pub async fn create_module<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<ModuleRequest>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let module = ModuleAuthoring::new(state.repo.clone())
        .create(&CourseId::from_uuid(course_id), req.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Success::new(ModuleEnvelope {
            module: ModuleResponse::from(&module),
        }),
    ))
}

/// PUT /api/admin/modules/{id}
pub async fn update_module<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(module_id): Path<Uuid>,
    Json(req): Json<ModuleRequest>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let module = ModuleAuthoring::new(state.repo.clone())
        .update(&ModuleId::from_uuid(module_id), req.into())
        .await?;

    Ok(Success::new(ModuleEnvelope {
        module: ModuleResponse::from(&module),
    }))
}

/// DELETE /api/admin/modules/{id}
pub async fn delete_module<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(module_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    ModuleAuthoring::new(state.repo.clone())
        .delete(&ModuleId::from_uuid(module_id))
        .await?;

    Ok(Success::message("Module deleted"))
}

// ============================================================================
// Lesson authoring
// ============================================================================

/// GET /api/admin/modules/{id}/lessons
pub async fn list_module_lessons<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(module_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let lessons = LessonAuthoring::new(state.repo.clone())
        .list(&ModuleId::from_uuid(module_id))
        .await?;

    Ok(Success::new(LessonListResponse {
        lessons: lessons.iter().map(LessonSummary::from).collect(),
    }))
}

/// POST /api/admin/lessons
pub async fn create_lesson<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Json(req): Json<LessonRequest>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let lesson = LessonAuthoring::new(state.repo.clone())
        .create(req.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Success::new(LessonEnvelope {
            lesson: LessonResponse::from(&lesson),
        }),
    ))
}

/// PUT /api/admin/lessons/{id}
pub async fn update_lesson<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(lesson_id): Path<Uuid>,
    Json(req): Json<LessonRequest>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let lesson = LessonAuthoring::new(state.repo.clone())
        .update(&LessonId::from_uuid(lesson_id), req.into())
        .await?;

    Ok(Success::new(LessonEnvelope {
        lesson: LessonResponse::from(&lesson),
    }))
}

/// DELETE /api/admin/lessons/{id}
pub async fn delete_lesson<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(lesson_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    LessonAuthoring::new(state.repo.clone())
        .delete(&LessonId::from_uuid(lesson_id))
        .await?;

    Ok(Success::message("Lesson deleted"))
}

// ============================================================================
// Exercise and content block authoring
// ============================================================================

/// GET /api/admin/lessons/{id}/exercises
pub async fn list_exercises<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(lesson_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let exercises = ExerciseAuthoring::new(state.repo.clone())
        .list(&LessonId::from_uuid(lesson_id))
        .await?;

    Ok(Success::new(ExerciseListResponse {
        exercises: exercises.iter().map(ExerciseAdminResponse::from).collect(),
    }))
}

/// POST /api/admin/lessons/{id}/exercises
pub async fn create_exercise<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(lesson_id): Path<Uuid>,
    Json(req): Json<ExerciseRequest>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let exercise = ExerciseAuthoring::new(state.repo.clone())
        .create(&LessonId::from_uuid(lesson_id), req.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Success::new(ExerciseEnvelope {
            exercise: ExerciseAdminResponse::from(&exercise),
        }),
    ))
}

/// PUT /api/admin/exercises/{id}
pub async fn update_exercise<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(exercise_id): Path<Uuid>,
    Json(req): Json<ExerciseRequest>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let exercise = ExerciseAuthoring::new(state.repo.clone())
        .update(&ExerciseId::from_uuid(exercise_id), req.into())
        .await?;

    Ok(Success::new(ExerciseEnvelope {
        exercise: ExerciseAdminResponse::from(&exercise),
    }))
}

/// DELETE /api/admin/exercises/{id}
pub async fn delete_exercise<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(exercise_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    ExerciseAuthoring::new(state.repo.clone())
        .delete(&ExerciseId::from_uuid(exercise_id))
        .await?;

    Ok(Success::message("Exercise deleted"))
}

/// GET /api/admin/lessons/{id}/blocks
pub async fn list_blocks<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(lesson_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let blocks = ContentBlockAuthoring::new(state.repo.clone())
        .list(&LessonId::from_uuid(lesson_id))
        .await?;

    Ok(Success::new(ContentBlockListResponse {
        blocks: blocks.iter().map(ContentBlockResponse::from).collect(),
    }))
}

/// POST /api/admin/lessons/{id}/blocks
pub async fn create_block<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(lesson_id): Path<Uuid>,
    Json(req): Json<ContentBlockRequest>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let block = ContentBlockAuthoring::new(state.repo.clone())
        .create(&LessonId::from_uuid(lesson_id), req.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Success::new(ContentBlockEnvelope {
            block: ContentBlockResponse::from(&block),
        }),
    ))
}

/// PUT /api/admin/blocks/{id}
pub async fn update_block<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(block_id): Path<Uuid>,
    Json(req): Json<ContentBlockRequest>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    let block = ContentBlockAuthoring::new(state.repo.clone())
        .update(&ContentBlockId::from_uuid(block_id), req.into())
        .await?;

    Ok(Success::new(ContentBlockEnvelope {
        block: ContentBlockResponse::from(&block),
    }))
}

/// DELETE /api/admin/blocks/{id}
pub async fn delete_block<R, I>(
    State(state): State<LearningAppState<R, I>>,
    Path(block_id): Path<Uuid>,
) -> LearningResult<impl IntoResponse>
where
    R: LearningStore,
    I: ImageStore + Sync + 'static,
{
    ContentBlockAuthoring::new(state.repo.clone())
        .delete(&ContentBlockId::from_uuid(block_id))
        .await?;

    Ok(Success::message("Content block deleted"))
}
