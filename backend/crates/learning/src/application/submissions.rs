//! Exercise submission and grading

use std::sync::Arc;

use chrono::Utc;
use kernel::id::{ExerciseId, SubmissionId};
use kernel::principal::CurrentUser;

use crate::application::progress::{CourseProgress, complete_lesson, require_enrollment};
use crate::domain::entities::{CodeSubmission, Exercise, Lesson};
use crate::domain::repository::{
    ExerciseRepository, LearningStore, LessonRepository, ProgressRepository,
};
use crate::domain::services::grade_submission;
use crate::domain::value_objects::{ProgressStatus, SubmissionStatus};
use crate::error::{LearningError, LearningResult};

pub const MAX_SUBMISSION_BYTES: usize = 64 * 1024;

const PASSED_OUTPUT: &str = "Correct! Your solution matches the expected answer.";
const FAILED_OUTPUT: &str = "Not quite. Your code does not match the expected solution yet.";

#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub submission: CodeSubmission,
    /// Present when the submission passed and completed the lesson
    pub course_progress: Option<CourseProgress>,
}

/// Exercises of draft lessons are hidden from everyone but staff.
async fn exercise_with_lesson<R>(
    repo: &R,
    user: &CurrentUser,
    exercise_id: &ExerciseId,
) -> LearningResult<(Exercise, Lesson)>
where
    R: ExerciseRepository + LessonRepository,
{
    let exercise = repo
        .find_exercise(exercise_id)
        .await?
        .ok_or(LearningError::NotFound("Exercise"))?;
    let lesson = repo
        .find_lesson(&exercise.lesson_id)
        .await?
        .filter(|lesson| lesson.is_published() || user.role.is_staff())
        .ok_or(LearningError::NotFound("Exercise"))?;
    Ok((exercise, lesson))
}

pub struct SubmitExerciseUseCase<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> SubmitExerciseUseCase<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Every attempt is recorded. A pass also completes the lesson.
    pub async fn execute(
        &self,
        user: &CurrentUser,
        exercise_id: &ExerciseId,
        code: String,
    ) -> LearningResult<SubmissionResult> {
        if code.len() > MAX_SUBMISSION_BYTES {
            return Err(LearningError::validation(
                "code",
                format!("Code must be at most {MAX_SUBMISSION_BYTES} bytes"),
            ));
        }

        let repo = self.repo.as_ref();
        let (exercise, lesson) = exercise_with_lesson(repo, user, exercise_id).await?;
        require_enrollment(repo, &user.user_id, &lesson.course_id).await?;

        let status = grade_submission(&code, &exercise.solution_code);
        let now = Utc::now();
        let submission = CodeSubmission {
            submission_id: SubmissionId::new(),
            user_id: user.user_id,
            exercise_id: exercise.exercise_id,
            code,
            status,
            output: match status {
                SubmissionStatus::Passed => PASSED_OUTPUT,
                SubmissionStatus::Failed => FAILED_OUTPUT,
            }
            .to_string(),
            submitted_at: now,
        };
        repo.insert_submission(&submission).await?;

        tracing::info!(
            user_id = %user.user_id,
            exercise_id = %exercise.exercise_id,
            status = %status,
            "Exercise submitted"
        );

        // Draft lessons never count towards progress.
        let course_progress = match status {
            _ if !lesson.is_published() => None,
            SubmissionStatus::Passed => {
                Some(complete_lesson(repo, &user.user_id, &lesson, ProgressStatus::Passed, now).await?)
            }
            SubmissionStatus::Failed => {
                repo.record_failed_attempt(&user.user_id, &lesson, now).await?;
                None
            }
        };

        Ok(SubmissionResult {
            submission,
            course_progress,
        })
    }
}

pub struct ListSubmissionsUseCase<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> ListSubmissionsUseCase<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// The caller's own attempts, newest first
    pub async fn execute(
        &self,
        user: &CurrentUser,
        exercise_id: &ExerciseId,
    ) -> LearningResult<Vec<CodeSubmission>> {
        let (exercise, _) = exercise_with_lesson(self.repo.as_ref(), user, exercise_id).await?;
        self.repo
            .list_submissions(&user.user_id, &exercise.exercise_id)
            .await
    }
}
