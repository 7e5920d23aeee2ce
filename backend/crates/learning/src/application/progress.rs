//! Lesson completion, time tracking and course progress

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{CourseId, LessonId, UserId};
use kernel::principal::CurrentUser;

use crate::domain::entities::{Enrollment, Lesson};
use crate::domain::repository::{
    EnrollmentRepository, LearningStore, LessonRepository, ProgressRepository,
};
use crate::domain::services::compute_progress_percentage;
use crate::domain::value_objects::{ProgressStatus, TrackedSeconds};
use crate::error::{LearningError, LearningResult};

/// Course progress after a completion event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseProgress {
    pub course_id: CourseId,
    pub percentage: f64,
    pub completed: bool,
}

/// Active (enrolled or completed) enrollment, or `NotEnrolled`
pub(crate) async fn require_enrollment<R>(
    repo: &R,
    user_id: &UserId,
    course_id: &CourseId,
) -> LearningResult<Enrollment>
where
    R: EnrollmentRepository,
{
    repo.find_enrollment(user_id, course_id)
        .await?
        .filter(Enrollment::is_active)
        .ok_or(LearningError::NotEnrolled)
}

/// Recount completed lessons and persist the enrollment percentage
pub(crate) async fn refresh_course_progress<R>(
    repo: &R,
    user_id: &UserId,
    course_id: &CourseId,
    now: DateTime<Utc>,
) -> LearningResult<CourseProgress>
where
    R: LessonRepository + ProgressRepository + EnrollmentRepository,
{
    let total = repo.count_published_lessons(course_id).await?;
    let completed = repo.count_completed_lessons(user_id, course_id).await?;
    let percentage = compute_progress_percentage(completed, total);
    let finished = total > 0 && completed >= total;

    repo.set_enrollment_progress(user_id, course_id, percentage, finished, now)
        .await?;

    Ok(CourseProgress {
        course_id: *course_id,
        percentage,
        completed: finished,
    })
}

/// Mark one lesson complete and roll the result up to the enrollment
pub(crate) async fn complete_lesson<R>(
    repo: &R,
    user_id: &UserId,
    lesson: &Lesson,
    status: ProgressStatus,
    now: DateTime<Utc>,
) -> LearningResult<CourseProgress>
where
    R: LessonRepository + ProgressRepository + EnrollmentRepository,
{
    repo.complete_progress(user_id, lesson, status, now).await?;
    let progress = refresh_course_progress(repo, user_id, &lesson.course_id, now).await?;

    tracing::info!(
        user_id = %user_id,
        lesson_id = %lesson.lesson_id,
        course_id = %lesson.course_id,
        percentage = progress.percentage,
        "Lesson completed"
    );
    if progress.completed {
        tracing::info!(user_id = %user_id, course_id = %lesson.course_id, "Course completed");
    }

    Ok(progress)
}

/// Published lesson or `NotFound`
pub(crate) async fn published_lesson<R>(repo: &R, lesson_id: &LessonId) -> LearningResult<Lesson>
where
    R: LessonRepository,
{
    repo.find_lesson(lesson_id)
        .await?
        .filter(Lesson::is_published)
        .ok_or(LearningError::NotFound("Lesson"))
}

pub struct MarkLessonCompleteUseCase<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> MarkLessonCompleteUseCase<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        user: &CurrentUser,
        lesson_id: &LessonId,
    ) -> LearningResult<CourseProgress> {
        let lesson = published_lesson(self.repo.as_ref(), lesson_id).await?;
        require_enrollment(self.repo.as_ref(), &user.user_id, &lesson.course_id).await?;

        complete_lesson(
            self.repo.as_ref(),
            &user.user_id,
            &lesson,
            ProgressStatus::Completed,
            Utc::now(),
        )
        .await
    }
}

pub struct TrackTimeUseCase<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> TrackTimeUseCase<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Returns the lesson's accumulated seconds
    pub async fn execute(
        &self,
        user: &CurrentUser,
        lesson_id: &LessonId,
        seconds: i64,
    ) -> LearningResult<i64> {
        let seconds = TrackedSeconds::new(seconds).ok_or_else(|| {
            LearningError::validation(
                "seconds",
                format!(
                    "Seconds must be between {} and {}",
                    TrackedSeconds::MIN,
                    TrackedSeconds::MAX
                ),
            )
        })?;

        let lesson = published_lesson(self.repo.as_ref(), lesson_id).await?;
        require_enrollment(self.repo.as_ref(), &user.user_id, &lesson.course_id).await?;

        self.repo
            .add_time_spent(&user.user_id, &lesson, seconds.get(), Utc::now())
            .await
    }
}
