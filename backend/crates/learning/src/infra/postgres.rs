//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{
    ContentBlockId, CourseId, EnrollmentId, ExerciseId, LessonId, ModuleId, ProgressId,
    SubmissionId, UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{
    BookmarkedLesson, CodeSubmission, ContentBlock, Course, Enrollment, Exercise, Lesson, Module,
    UserProgress,
};
use crate::domain::repository::{
    BookmarkRepository, ContentBlockRepository, CourseRepository, EnrollOutcome,
    EnrollmentRepository, ExerciseRepository, LessonRepository, ModuleRepository,
    ProgressRepository, SlugWrite, SubmissionRepository,
};
use crate::domain::value_objects::{
    BlockType, ContentType, Difficulty, EnrollmentStatus, EnrollmentType, ProgressStatus,
    PublishStatus, Slug, SubmissionStatus,
};
use crate::error::{LearningError, LearningResult};

const COURSE_SLUG_CONSTRAINT: &str = "courses_slug_key";
const LESSON_SLUG_CONSTRAINT: &str = "lessons_course_slug_key";

/// Guard against a corrupted parent chain when walking ancestors
const MAX_COURSE_DEPTH: i32 = 64;

const COURSE_COLUMNS: &str = r#"
    course_id,
    slug,
    title,
    description,
    status,
    difficulty,
    enrollment_type,
    capacity,
    parent_course_id,
    instructor_id,
    thumbnail_url,
    sort_order,
    created_at,
    updated_at
"#;

const MODULE_COLUMNS: &str =
    "module_id, course_id, title, description, sort_order, created_at, updated_at";

const LESSON_COLUMNS: &str = r#"
    lesson_id,
    module_id,
    course_id,
    slug,
    title,
    content,
    status,
    content_type,
    video_url,
    duration_minutes,
    sort_order,
    created_at,
    updated_at
"#;

const EXERCISE_COLUMNS: &str = r#"
    exercise_id,
    lesson_id,
    title,
    instructions,
    starter_code,
    solution_code,
    hints,
    test_cases,
    sort_order,
    created_at,
    updated_at
"#;

const BLOCK_COLUMNS: &str =
    "block_id, lesson_id, block_type, content, sort_order, created_at, updated_at";

const ENROLLMENT_COLUMNS: &str = r#"
    enrollment_id,
    user_id,
    course_id,
    status,
    progress_percentage,
    enrolled_at,
    completed_at,
    last_accessed_at
"#;

const PROGRESS_COLUMNS: &str = r#"
    progress_id,
    user_id,
    lesson_id,
    course_id,
    status,
    time_spent_seconds,
    completed_at,
    last_accessed_at
"#;

const SUBMISSION_COLUMNS: &str =
    "submission_id, user_id, exercise_id, code, status, output, submitted_at";

/// PostgreSQL-backed learning repository
#[derive(Clone)]
pub struct PgLearningRepository {
    pool: PgPool,
}

impl PgLearningRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn courses_where(&self, clause: &str) -> LearningResult<Vec<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses {clause}");
        let rows = sqlx::query_as::<_, CourseRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(CourseRow::into_course).collect()
    }
}

/// Name of the unique constraint a failed statement tripped, if any
fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Some(db.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

fn slug_write(result: Result<u64, sqlx::Error>, constraint: &str) -> LearningResult<SlugWrite> {
    match result {
        Ok(_) => Ok(SlugWrite::Written),
        Err(e) if unique_violation(&e).as_deref() == Some(constraint) => Ok(SlugWrite::SlugTaken),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Content catalog
// ============================================================================

impl CourseRepository for PgLearningRepository {
    async fn list_published_courses(&self) -> LearningResult<Vec<Course>> {
        self.courses_where(
            "WHERE status = 'published' AND parent_course_id IS NULL ORDER BY sort_order, title",
        )
        .await
    }

    async fn list_all_courses(&self) -> LearningResult<Vec<Course>> {
        self.courses_where("ORDER BY sort_order, title").await
    }

    async fn list_subcourses(
        &self,
        parent: &CourseId,
        published_only: bool,
    ) -> LearningResult<Vec<Course>> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses \
             WHERE parent_course_id = $1 AND (NOT $2 OR status = 'published') \
             ORDER BY sort_order, title"
        );
        let rows = sqlx::query_as::<_, CourseRow>(&sql)
            .bind(parent.as_uuid())
            .bind(published_only)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(CourseRow::into_course).collect()
    }

    async fn find_course(&self, course_id: &CourseId) -> LearningResult<Option<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = $1");
        let row = sqlx::query_as::<_, CourseRow>(&sql)
            .bind(course_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(CourseRow::into_course).transpose()
    }

    async fn find_course_by_slug(&self, slug: &Slug) -> LearningResult<Option<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE slug = $1");
        let row = sqlx::query_as::<_, CourseRow>(&sql)
            .bind(slug.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(CourseRow::into_course).transpose()
    }

    async fn insert_course(&self, course: &Course) -> LearningResult<SlugWrite> {
        let result = sqlx::query(&format!(
            "INSERT INTO courses ({COURSE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        ))
        .bind(course.course_id.as_uuid())
        .bind(course.slug.as_str())
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.status.code())
        .bind(course.difficulty.code())
        .bind(course.enrollment_type.code())
        .bind(course.capacity)
        .bind(course.parent_course_id.map(Uuid::from))
        .bind(course.instructor_id.map(Uuid::from))
        .bind(course.thumbnail_url.as_deref())
        .bind(course.sort_order)
        .bind(course.created_at)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected());

        slug_write(result, COURSE_SLUG_CONSTRAINT)
    }

    async fn update_course(&self, course: &Course) -> LearningResult<SlugWrite> {
        let result = sqlx::query(
            r#"
            UPDATE courses SET
                slug = $2,
                title = $3,
                description = $4,
                status = $5,
                difficulty = $6,
                enrollment_type = $7,
                capacity = $8,
                parent_course_id = $9,
                thumbnail_url = $10,
                sort_order = $11,
                updated_at = $12
            WHERE course_id = $1
            "#,
        )
        .bind(course.course_id.as_uuid())
        .bind(course.slug.as_str())
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.status.code())
        .bind(course.difficulty.code())
        .bind(course.enrollment_type.code())
        .bind(course.capacity)
        .bind(course.parent_course_id.map(Uuid::from))
        .bind(course.thumbnail_url.as_deref())
        .bind(course.sort_order)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected());

        slug_write(result, COURSE_SLUG_CONSTRAINT)
    }

    async fn delete_course(&self, course_id: &CourseId) -> LearningResult<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE course_id = $1")
            .bind(course_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn course_ancestors(&self, course_id: &CourseId) -> LearningResult<Vec<CourseId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            WITH RECURSIVE chain (course_id, parent_course_id, depth) AS (
                SELECT course_id, parent_course_id, 0
                FROM courses
                WHERE course_id = $1
                UNION ALL
                SELECT c.course_id, c.parent_course_id, chain.depth + 1
                FROM courses c
                JOIN chain ON c.course_id = chain.parent_course_id
                WHERE chain.depth < $2
            )
            SELECT course_id FROM chain WHERE depth > 0 ORDER BY depth
            "#,
        )
        .bind(course_id.as_uuid())
        .bind(MAX_COURSE_DEPTH)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(CourseId::from_uuid).collect())
    }
}

impl ModuleRepository for PgLearningRepository {
    async fn list_modules(&self, course_id: &CourseId) -> LearningResult<Vec<Module>> {
        let sql = format!(
            "SELECT {MODULE_COLUMNS} FROM modules WHERE course_id = $1 ORDER BY sort_order, created_at"
        );
        let rows = sqlx::query_as::<_, ModuleRow>(&sql)
            .bind(course_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ModuleRow::into_module).collect())
    }

    async fn find_module(&self, module_id: &ModuleId) -> LearningResult<Option<Module>> {
        let sql = format!("SELECT {MODULE_COLUMNS} FROM modules WHERE module_id = $1");
        let row = sqlx::query_as::<_, ModuleRow>(&sql)
            .bind(module_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ModuleRow::into_module))
    }

    async fn insert_module(&self, module: &Module) -> LearningResult<()> {
        sqlx::query(&format!(
            "INSERT INTO modules ({MODULE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(module.module_id.as_uuid())
        .bind(module.course_id.as_uuid())
        .bind(&module.title)
        .bind(&module.description)
        .bind(module.sort_order)
        .bind(module.created_at)
        .bind(module.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_module(&self, module: &Module) -> LearningResult<bool> {
        let result = sqlx::query(
            "UPDATE modules SET title = $2, description = $3, sort_order = $4, updated_at = $5 \
             WHERE module_id = $1",
        )
        .bind(module.module_id.as_uuid())
        .bind(&module.title)
        .bind(&module.description)
        .bind(module.sort_order)
        .bind(module.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_module(&self, module_id: &ModuleId) -> LearningResult<bool> {
        let result = sqlx::query("DELETE FROM modules WHERE module_id = $1")
            .bind(module_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl LessonRepository for PgLearningRepository {
    async fn list_lessons(&self, course_id: &CourseId) -> LearningResult<Vec<Lesson>> {
        let sql = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = $1 ORDER BY sort_order, created_at"
        );
        let rows = sqlx::query_as::<_, LessonRow>(&sql)
            .bind(course_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(LessonRow::into_lesson).collect()
    }

    async fn list_module_lessons(&self, module_id: &ModuleId) -> LearningResult<Vec<Lesson>> {
        let sql = format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE module_id = $1 ORDER BY sort_order, created_at"
        );
        let rows = sqlx::query_as::<_, LessonRow>(&sql)
            .bind(module_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(LessonRow::into_lesson).collect()
    }

    async fn find_lesson(&self, lesson_id: &LessonId) -> LearningResult<Option<Lesson>> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE lesson_id = $1");
        let row = sqlx::query_as::<_, LessonRow>(&sql)
            .bind(lesson_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(LessonRow::into_lesson).transpose()
    }

    async fn find_lesson_by_slug(
        &self,
        course_id: &CourseId,
        slug: &Slug,
    ) -> LearningResult<Option<Lesson>> {
        let sql = format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE course_id = $1 AND slug = $2");
        let row = sqlx::query_as::<_, LessonRow>(&sql)
            .bind(course_id.as_uuid())
            .bind(slug.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(LessonRow::into_lesson).transpose()
    }

    async fn insert_lesson(&self, lesson: &Lesson) -> LearningResult<SlugWrite> {
        let result = sqlx::query(&format!(
            "INSERT INTO lessons ({LESSON_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(lesson.lesson_id.as_uuid())
        .bind(lesson.module_id.as_uuid())
        .bind(lesson.course_id.as_uuid())
        .bind(lesson.slug.as_str())
        .bind(&lesson.title)
        .bind(&lesson.content)
        .bind(lesson.status.code())
        .bind(lesson.content_type.code())
        .bind(lesson.video_url.as_deref())
        .bind(lesson.duration_minutes)
        .bind(lesson.sort_order)
        .bind(lesson.created_at)
        .bind(lesson.updated_at)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected());

        slug_write(result, LESSON_SLUG_CONSTRAINT)
    }

    /// Progress rows follow the lesson when it moves to another course
    async fn update_lesson(&self, lesson: &Lesson) -> LearningResult<SlugWrite> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE lessons SET
                module_id = $2,
                course_id = $3,
                slug = $4,
                title = $5,
                content = $6,
                status = $7,
                content_type = $8,
                video_url = $9,
                duration_minutes = $10,
                sort_order = $11,
                updated_at = $12
            WHERE lesson_id = $1
            "#,
        )
        .bind(lesson.lesson_id.as_uuid())
        .bind(lesson.module_id.as_uuid())
        .bind(lesson.course_id.as_uuid())
        .bind(lesson.slug.as_str())
        .bind(&lesson.title)
        .bind(&lesson.content)
        .bind(lesson.status.code())
        .bind(lesson.content_type.code())
        .bind(lesson.video_url.as_deref())
        .bind(lesson.duration_minutes)
        .bind(lesson.sort_order)
        .bind(lesson.updated_at)
        .execute(&mut *tx)
        .await
        .map(|r| r.rows_affected());

        let outcome = slug_write(result, LESSON_SLUG_CONSTRAINT)?;
        if outcome == SlugWrite::SlugTaken {
            return Ok(outcome);
        }

        sqlx::query("UPDATE user_progress SET course_id = $2 WHERE lesson_id = $1 AND course_id <> $2")
            .bind(lesson.lesson_id.as_uuid())
            .bind(lesson.course_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(outcome)
    }

    async fn delete_lesson(&self, lesson_id: &LessonId) -> LearningResult<bool> {
        let result = sqlx::query("DELETE FROM lessons WHERE lesson_id = $1")
            .bind(lesson_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_published_lessons(&self, course_id: &CourseId) -> LearningResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lessons WHERE course_id = $1 AND status = 'published'",
        )
        .bind(course_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }
}

impl ExerciseRepository for PgLearningRepository {
    async fn list_exercises(&self, lesson_id: &LessonId) -> LearningResult<Vec<Exercise>> {
        let sql = format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE lesson_id = $1 ORDER BY sort_order, created_at"
        );
        let rows = sqlx::query_as::<_, ExerciseRow>(&sql)
            .bind(lesson_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ExerciseRow::into_exercise).collect())
    }

    async fn find_exercise(&self, exercise_id: &ExerciseId) -> LearningResult<Option<Exercise>> {
        let sql = format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE exercise_id = $1");
        let row = sqlx::query_as::<_, ExerciseRow>(&sql)
            .bind(exercise_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ExerciseRow::into_exercise))
    }

    async fn insert_exercise(&self, exercise: &Exercise) -> LearningResult<()> {
        sqlx::query(&format!(
            "INSERT INTO exercises ({EXERCISE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(exercise.exercise_id.as_uuid())
        .bind(exercise.lesson_id.as_uuid())
        .bind(&exercise.title)
        .bind(&exercise.instructions)
        .bind(&exercise.starter_code)
        .bind(&exercise.solution_code)
        .bind(&exercise.hints)
        .bind(&exercise.test_cases)
        .bind(exercise.sort_order)
        .bind(exercise.created_at)
        .bind(exercise.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_exercise(&self, exercise: &Exercise) -> LearningResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE exercises SET
                title = $2,
                instructions = $3,
                starter_code = $4,
                solution_code = $5,
                hints = $6,
                test_cases = $7,
                sort_order = $8,
                updated_at = $9
            WHERE exercise_id = $1
            "#,
        )
        .bind(exercise.exercise_id.as_uuid())
        .bind(&exercise.title)
        .bind(&exercise.instructions)
        .bind(&exercise.starter_code)
        .bind(&exercise.solution_code)
        .bind(&exercise.hints)
        .bind(&exercise.test_cases)
        .bind(exercise.sort_order)
        .bind(exercise.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_exercise(&self, exercise_id: &ExerciseId) -> LearningResult<bool> {
        let result = sqlx::query("DELETE FROM exercises WHERE exercise_id = $1")
            .bind(exercise_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl ContentBlockRepository for PgLearningRepository {
    async fn list_blocks(&self, lesson_id: &LessonId) -> LearningResult<Vec<ContentBlock>> {
        let sql = format!(
            "SELECT {BLOCK_COLUMNS} FROM content_blocks WHERE lesson_id = $1 ORDER BY sort_order, created_at"
        );
        let rows = sqlx::query_as::<_, ContentBlockRow>(&sql)
            .bind(lesson_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ContentBlockRow::into_block).collect()
    }

    async fn find_block(&self, block_id: &ContentBlockId) -> LearningResult<Option<ContentBlock>> {
        let sql = format!("SELECT {BLOCK_COLUMNS} FROM content_blocks WHERE block_id = $1");
        let row = sqlx::query_as::<_, ContentBlockRow>(&sql)
            .bind(block_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(ContentBlockRow::into_block).transpose()
    }

    async fn insert_block(&self, block: &ContentBlock) -> LearningResult<()> {
        sqlx::query(&format!(
            "INSERT INTO content_blocks ({BLOCK_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(block.block_id.as_uuid())
        .bind(block.lesson_id.as_uuid())
        .bind(block.block_type.code())
        .bind(&block.content)
        .bind(block.sort_order)
        .bind(block.created_at)
        .bind(block.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_block(&self, block: &ContentBlock) -> LearningResult<bool> {
        let result = sqlx::query(
            "UPDATE content_blocks SET block_type = $2, content = $3, sort_order = $4, updated_at = $5 \
             WHERE block_id = $1",
        )
        .bind(block.block_id.as_uuid())
        .bind(block.block_type.code())
        .bind(&block.content)
        .bind(block.sort_order)
        .bind(block.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_block(&self, block_id: &ContentBlockId) -> LearningResult<bool> {
        let result = sqlx::query("DELETE FROM content_blocks WHERE block_id = $1")
            .bind(block_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Enrollment ledger
// ============================================================================

impl EnrollmentRepository for PgLearningRepository {
    async fn enroll(
        &self,
        user_id: &UserId,
        course: &Course,
        now: DateTime<Utc>,
    ) -> LearningResult<EnrollOutcome> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent enrollments into this course, so the
        // seat count below cannot go stale before the insert
        let capacity: Option<Option<i32>> =
            sqlx::query_scalar("SELECT capacity FROM courses WHERE course_id = $1 FOR UPDATE")
                .bind(course.course_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        let Some(capacity) = capacity else {
            return Err(LearningError::NotFound("Course"));
        };

        let existing = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = $1 AND course_id = $2"
        ))
        .bind(user_id.as_uuid())
        .bind(course.course_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        if existing
            .as_ref()
            .is_some_and(|row| row.status != EnrollmentStatus::Dropped.code())
        {
            return Ok(EnrollOutcome::AlreadyEnrolled);
        }

        if let Some(capacity) = capacity {
            let taken: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM enrollments WHERE course_id = $1 AND status <> 'dropped'",
            )
            .bind(course.course_id.as_uuid())
            .fetch_one(&mut *tx)
            .await?;

            if taken >= i64::from(capacity) {
                return Ok(EnrollOutcome::CapacityReached);
            }
        }

        let outcome = if existing.is_some() {
            let row = sqlx::query_as::<_, EnrollmentRow>(&format!(
                "UPDATE enrollments SET status = 'enrolled', enrolled_at = $3, completed_at = NULL \
                 WHERE user_id = $1 AND course_id = $2 \
                 RETURNING {ENROLLMENT_COLUMNS}"
            ))
            .bind(user_id.as_uuid())
            .bind(course.course_id.as_uuid())
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

            EnrollOutcome::Reactivated(row.into_enrollment()?)
        } else {
            let enrollment = Enrollment::new(*user_id, course.course_id, now);
            let inserted = sqlx::query(&format!(
                "INSERT INTO enrollments ({ENROLLMENT_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 ON CONFLICT (user_id, course_id) DO NOTHING"
            ))
            .bind(enrollment.enrollment_id.as_uuid())
            .bind(enrollment.user_id.as_uuid())
            .bind(enrollment.course_id.as_uuid())
            .bind(enrollment.status.code())
            .bind(enrollment.progress_percentage)
            .bind(enrollment.enrolled_at)
            .bind(enrollment.completed_at)
            .bind(enrollment.last_accessed_at)
            .execute(&mut *tx)
            .await?;

            if inserted.rows_affected() == 0 {
                return Ok(EnrollOutcome::AlreadyEnrolled);
            }
            EnrollOutcome::Enrolled(enrollment)
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn find_enrollment(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> LearningResult<Option<Enrollment>> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = $1 AND course_id = $2"
        );
        let row = sqlx::query_as::<_, EnrollmentRow>(&sql)
            .bind(user_id.as_uuid())
            .bind(course_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(EnrollmentRow::into_enrollment).transpose()
    }

    async fn drop_enrollment(&self, user_id: &UserId, course_id: &CourseId) -> LearningResult<bool> {
        let result = sqlx::query(
            "UPDATE enrollments SET status = 'dropped' \
             WHERE user_id = $1 AND course_id = $2 AND status <> 'dropped'",
        )
        .bind(user_id.as_uuid())
        .bind(course_id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_enrollments(&self, user_id: &UserId) -> LearningResult<Vec<Enrollment>> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
             WHERE user_id = $1 AND status <> 'dropped' \
             ORDER BY last_accessed_at DESC NULLS LAST, enrolled_at DESC"
        );
        let rows = sqlx::query_as::<_, EnrollmentRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(EnrollmentRow::into_enrollment).collect()
    }

    async fn touch_enrollment(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        now: DateTime<Utc>,
    ) -> LearningResult<()> {
        sqlx::query(
            "UPDATE enrollments SET last_accessed_at = $3 WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id.as_uuid())
        .bind(course_id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_enrollment_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        percentage: f64,
        completed: bool,
        now: DateTime<Utc>,
    ) -> LearningResult<()> {
        sqlx::query(
            r#"
            UPDATE enrollments SET
                progress_percentage = $3,
                status = CASE WHEN $4 THEN 'completed' ELSE status END,
                completed_at = CASE WHEN $4 THEN COALESCE(completed_at, $5) ELSE completed_at END
            WHERE user_id = $1 AND course_id = $2 AND status <> 'dropped'
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(course_id.as_uuid())
        .bind(percentage)
        .bind(completed)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Progress tracker
// ============================================================================

impl ProgressRepository for PgLearningRepository {
    async fn find_progress(
        &self,
        user_id: &UserId,
        lesson_id: &LessonId,
    ) -> LearningResult<Option<UserProgress>> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM user_progress WHERE user_id = $1 AND lesson_id = $2"
        );
        let row = sqlx::query_as::<_, ProgressRow>(&sql)
            .bind(user_id.as_uuid())
            .bind(lesson_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(ProgressRow::into_progress).transpose()
    }

    async fn start_progress(
        &self,
        user_id: &UserId,
        lesson: &Lesson,
        now: DateTime<Utc>,
    ) -> LearningResult<UserProgress> {
        let sql = format!(
            "INSERT INTO user_progress ({PROGRESS_COLUMNS}) \
             VALUES ($1, $2, $3, $4, 'in_progress', 0, NULL, $5) \
             ON CONFLICT (user_id, lesson_id) DO UPDATE SET \
                 last_accessed_at = EXCLUDED.last_accessed_at \
             RETURNING {PROGRESS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProgressRow>(&sql)
            .bind(ProgressId::new().as_uuid())
            .bind(user_id.as_uuid())
            .bind(lesson.lesson_id.as_uuid())
            .bind(lesson.course_id.as_uuid())
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        row.into_progress()
    }

    async fn complete_progress(
        &self,
        user_id: &UserId,
        lesson: &Lesson,
        status: ProgressStatus,
        now: DateTime<Utc>,
    ) -> LearningResult<UserProgress> {
        let sql = format!(
            "INSERT INTO user_progress ({PROGRESS_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $6, 0, $5, $5) \
             ON CONFLICT (user_id, lesson_id) DO UPDATE SET \
                 status = CASE WHEN user_progress.status = 'passed' THEN 'passed' ELSE EXCLUDED.status END, \
                 completed_at = COALESCE(user_progress.completed_at, EXCLUDED.completed_at), \
                 last_accessed_at = EXCLUDED.last_accessed_at \
             RETURNING {PROGRESS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProgressRow>(&sql)
            .bind(ProgressId::new().as_uuid())
            .bind(user_id.as_uuid())
            .bind(lesson.lesson_id.as_uuid())
            .bind(lesson.course_id.as_uuid())
            .bind(now)
            .bind(status.code())
            .fetch_one(&self.pool)
            .await?;

        row.into_progress()
    }

    async fn record_failed_attempt(
        &self,
        user_id: &UserId,
        lesson: &Lesson,
        now: DateTime<Utc>,
    ) -> LearningResult<UserProgress> {
        let sql = format!(
            "INSERT INTO user_progress ({PROGRESS_COLUMNS}) \
             VALUES ($1, $2, $3, $4, 'failed', 0, NULL, $5) \
             ON CONFLICT (user_id, lesson_id) DO UPDATE SET \
                 status = CASE WHEN user_progress.status IN ('completed', 'passed') \
                     THEN user_progress.status ELSE 'failed' END, \
                 last_accessed_at = EXCLUDED.last_accessed_at \
             RETURNING {PROGRESS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProgressRow>(&sql)
            .bind(ProgressId::new().as_uuid())
            .bind(user_id.as_uuid())
            .bind(lesson.lesson_id.as_uuid())
            .bind(lesson.course_id.as_uuid())
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        row.into_progress()
    }

    async fn add_time_spent(
        &self,
        user_id: &UserId,
        lesson: &Lesson,
        seconds: i64,
        now: DateTime<Utc>,
    ) -> LearningResult<i64> {
        let total: i64 = sqlx::query_scalar(&format!(
            "INSERT INTO user_progress ({PROGRESS_COLUMNS}) \
             VALUES ($1, $2, $3, $4, 'in_progress', $5, NULL, $6) \
             ON CONFLICT (user_id, lesson_id) DO UPDATE SET \
                 time_spent_seconds = user_progress.time_spent_seconds + EXCLUDED.time_spent_seconds, \
                 last_accessed_at = EXCLUDED.last_accessed_at \
             RETURNING time_spent_seconds"
        ))
        .bind(ProgressId::new().as_uuid())
        .bind(user_id.as_uuid())
        .bind(lesson.lesson_id.as_uuid())
        .bind(lesson.course_id.as_uuid())
        .bind(seconds)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn count_completed_lessons(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> LearningResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM user_progress p
            JOIN lessons l ON l.lesson_id = p.lesson_id
            WHERE p.user_id = $1
              AND l.course_id = $2
              AND l.status = 'published'
              AND p.status IN ('completed', 'passed')
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(course_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }
}

// ============================================================================
// Submissions and bookmarks
// ============================================================================

impl SubmissionRepository for PgLearningRepository {
    async fn insert_submission(&self, submission: &CodeSubmission) -> LearningResult<()> {
        sqlx::query(&format!(
            "INSERT INTO code_submissions ({SUBMISSION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(submission.submission_id.as_uuid())
        .bind(submission.user_id.as_uuid())
        .bind(submission.exercise_id.as_uuid())
        .bind(&submission.code)
        .bind(submission.status.code())
        .bind(&submission.output)
        .bind(submission.submitted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_submissions(
        &self,
        user_id: &UserId,
        exercise_id: &ExerciseId,
    ) -> LearningResult<Vec<CodeSubmission>> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM code_submissions \
             WHERE user_id = $1 AND exercise_id = $2 \
             ORDER BY submitted_at DESC"
        );
        let rows = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(user_id.as_uuid())
            .bind(exercise_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(SubmissionRow::into_submission).collect()
    }
}

impl BookmarkRepository for PgLearningRepository {
    async fn toggle_bookmark(
        &self,
        user_id: &UserId,
        lesson_id: &LessonId,
        now: DateTime<Utc>,
    ) -> LearningResult<bool> {
        let removed = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND lesson_id = $2")
            .bind(user_id.as_uuid())
            .bind(lesson_id.as_uuid())
            .execute(&self.pool)
            .await?;
        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO bookmarks (user_id, lesson_id, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, lesson_id) DO NOTHING",
        )
        .bind(user_id.as_uuid())
        .bind(lesson_id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    async fn is_bookmarked(&self, user_id: &UserId, lesson_id: &LessonId) -> LearningResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bookmarks WHERE user_id = $1 AND lesson_id = $2)",
        )
        .bind(user_id.as_uuid())
        .bind(lesson_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_bookmarks(&self, user_id: &UserId) -> LearningResult<Vec<BookmarkedLesson>> {
        let rows = sqlx::query_as::<_, BookmarkRow>(
            r#"
            SELECT
                b.lesson_id,
                l.slug AS lesson_slug,
                l.title AS lesson_title,
                c.slug AS course_slug,
                c.title AS course_title,
                b.created_at AS bookmarked_at
            FROM bookmarks b
            JOIN lessons l ON l.lesson_id = b.lesson_id
            JOIN courses c ON c.course_id = l.course_id
            WHERE b.user_id = $1
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BookmarkRow::into_bookmark).collect())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

fn decode<T>(column: &str, value: &str, from_code: fn(&str) -> Option<T>) -> LearningResult<T> {
    from_code(value).ok_or_else(|| LearningError::Internal(format!("Invalid {column}: {value}")))
}

#[derive(sqlx::FromRow)]
struct CourseRow {
    course_id: Uuid,
    slug: String,
    title: String,
    description: String,
    status: String,
    difficulty: String,
    enrollment_type: String,
    capacity: Option<i32>,
    parent_course_id: Option<Uuid>,
    instructor_id: Option<Uuid>,
    thumbnail_url: Option<String>,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CourseRow {
    fn into_course(self) -> LearningResult<Course> {
        Ok(Course {
            course_id: CourseId::from_uuid(self.course_id),
            slug: Slug::from_db(self.slug),
            title: self.title,
            description: self.description,
            status: decode("status", &self.status, PublishStatus::from_code)?,
            difficulty: decode("difficulty", &self.difficulty, Difficulty::from_code)?,
            enrollment_type: decode(
                "enrollment_type",
                &self.enrollment_type,
                EnrollmentType::from_code,
            )?,
            capacity: self.capacity,
            parent_course_id: self.parent_course_id.map(CourseId::from_uuid),
            instructor_id: self.instructor_id.map(UserId::from_uuid),
            thumbnail_url: self.thumbnail_url,
            sort_order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ModuleRow {
    module_id: Uuid,
    course_id: Uuid,
    title: String,
    description: String,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ModuleRow {
    fn into_module(self) -> Module {
        Module {
            module_id: ModuleId::from_uuid(self.module_id),
            course_id: CourseId::from_uuid(self.course_id),
            title: self.title,
            description: self.description,
            sort_order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LessonRow {
    lesson_id: Uuid,
    module_id: Uuid,
    course_id: Uuid,
    slug: String,
    title: String,
    content: String,
    status: String,
    content_type: String,
    video_url: Option<String>,
    duration_minutes: Option<i32>,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LessonRow {
    fn into_lesson(self) -> LearningResult<Lesson> {
        Ok(Lesson {
            lesson_id: LessonId::from_uuid(self.lesson_id),
            module_id: ModuleId::from_uuid(self.module_id),
            course_id: CourseId::from_uuid(self.course_id),
            slug: Slug::from_db(self.slug),
            title: self.title,
            content: self.content,
            status: decode("status", &self.status, PublishStatus::from_code)?,
            content_type: decode("content_type", &self.content_type, ContentType::from_code)?,
            video_url: self.video_url,
            duration_minutes: self.duration_minutes,
            sort_order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExerciseRow {
    exercise_id: Uuid,
    lesson_id: Uuid,
    title: String,
    instructions: String,
    starter_code: String,
    solution_code: String,
    hints: Vec<String>,
    test_cases: serde_json::Value,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ExerciseRow {
    fn into_exercise(self) -> Exercise {
        Exercise {
            exercise_id: ExerciseId::from_uuid(self.exercise_id),
            lesson_id: LessonId::from_uuid(self.lesson_id),
            title: self.title,
            instructions: self.instructions,
            starter_code: self.starter_code,
            solution_code: self.solution_code,
            hints: self.hints,
            test_cases: self.test_cases,
            sort_order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ContentBlockRow {
    block_id: Uuid,
    lesson_id: Uuid,
    block_type: String,
    content: String,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ContentBlockRow {
    fn into_block(self) -> LearningResult<ContentBlock> {
        Ok(ContentBlock {
            block_id: ContentBlockId::from_uuid(self.block_id),
            lesson_id: LessonId::from_uuid(self.lesson_id),
            block_type: decode("block_type", &self.block_type, BlockType::from_code)?,
            content: self.content,
            sort_order: self.sort_order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EnrollmentRow {
    enrollment_id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    status: String,
    progress_percentage: f64,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    last_accessed_at: Option<DateTime<Utc>>,
}

impl EnrollmentRow {
    fn into_enrollment(self) -> LearningResult<Enrollment> {
        Ok(Enrollment {
            enrollment_id: EnrollmentId::from_uuid(self.enrollment_id),
            user_id: UserId::from_uuid(self.user_id),
            course_id: CourseId::from_uuid(self.course_id),
            status: decode("status", &self.status, EnrollmentStatus::from_code)?,
            progress_percentage: self.progress_percentage,
            enrolled_at: self.enrolled_at,
            completed_at: self.completed_at,
            last_accessed_at: self.last_accessed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    progress_id: Uuid,
    user_id: Uuid,
    lesson_id: Uuid,
    course_id: Uuid,
    status: String,
    time_spent_seconds: i64,
    completed_at: Option<DateTime<Utc>>,
    last_accessed_at: Option<DateTime<Utc>>,
}

impl ProgressRow {
    fn into_progress(self) -> LearningResult<UserProgress> {
        Ok(UserProgress {
            progress_id: ProgressId::from_uuid(self.progress_id),
            user_id: UserId::from_uuid(self.user_id),
            lesson_id: LessonId::from_uuid(self.lesson_id),
            course_id: CourseId::from_uuid(self.course_id),
            status: decode("status", &self.status, ProgressStatus::from_code)?,
            time_spent_seconds: self.time_spent_seconds,
            completed_at: self.completed_at,
            last_accessed_at: self.last_accessed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    submission_id: Uuid,
    user_id: Uuid,
    exercise_id: Uuid,
    code: String,
    status: String,
    output: String,
    submitted_at: DateTime<Utc>,
}

impl SubmissionRow {
    fn into_submission(self) -> LearningResult<CodeSubmission> {
        Ok(CodeSubmission {
            submission_id: SubmissionId::from_uuid(self.submission_id),
            user_id: UserId::from_uuid(self.user_id),
            exercise_id: ExerciseId::from_uuid(self.exercise_id),
            code: self.code,
            status: decode("status", &self.status, SubmissionStatus::from_code)?,
            output: self.output,
            submitted_at: self.submitted_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookmarkRow {
    lesson_id: Uuid,
    lesson_slug: String,
    lesson_title: String,
    course_slug: String,
    course_title: String,
    bookmarked_at: DateTime<Utc>,
}

impl BookmarkRow {
    fn into_bookmark(self) -> BookmarkedLesson {
        BookmarkedLesson {
            lesson_id: LessonId::from_uuid(self.lesson_id),
            lesson_slug: Slug::from_db(self.lesson_slug),
            lesson_title: self.lesson_title,
            course_slug: Slug::from_db(self.course_slug),
            course_title: self.course_title,
            bookmarked_at: self.bookmarked_at,
        }
    }
}
