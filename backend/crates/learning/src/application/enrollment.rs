//! Enrollment ledger: enroll, drop, dashboard

use std::sync::Arc;

use chrono::Utc;
use kernel::principal::CurrentUser;

use crate::application::progress::refresh_course_progress;
use crate::domain::entities::{Course, Enrollment};
use crate::domain::repository::{CourseRepository, EnrollOutcome, LearningStore};
use crate::domain::value_objects::{EnrollmentType, Slug};
use crate::error::{LearningError, LearningResult};

async fn course_by_slug<R>(repo: &R, slug: &str) -> LearningResult<Course>
where
    R: CourseRepository,
{
    let slug = Slug::new(slug).map_err(|_| LearningError::NotFound("Course"))?;
    repo.find_course_by_slug(&slug)
        .await?
        .ok_or(LearningError::NotFound("Course"))
}

pub struct EnrollUseCase<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> EnrollUseCase<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// `approval_required` courses enroll like open ones; there is no
    /// approval queue.
    pub async fn execute(&self, user: &CurrentUser, course_slug: &str) -> LearningResult<Enrollment> {
        let repo = self.repo.as_ref();
        let course = course_by_slug(repo, course_slug).await?;

        if !course.is_published() {
            return Err(LearningError::CourseNotPublished);
        }
        if course.enrollment_type == EnrollmentType::Closed {
            return Err(LearningError::EnrollmentClosed);
        }

        let now = Utc::now();
        match repo.enroll(&user.user_id, &course, now).await? {
            EnrollOutcome::Enrolled(enrollment) => {
                tracing::info!(
                    user_id = %user.user_id,
                    course_id = %course.course_id,
                    enrollment_type = %course.enrollment_type,
                    "User enrolled"
                );
                Ok(enrollment)
            }
            EnrollOutcome::Reactivated(enrollment) => {
                // Lessons may have changed while the enrollment was dropped
                let progress =
                    refresh_course_progress(repo, &user.user_id, &course.course_id, now).await?;
                tracing::info!(
                    user_id = %user.user_id,
                    course_id = %course.course_id,
                    percentage = progress.percentage,
                    "Enrollment reactivated"
                );
                Ok(repo
                    .find_enrollment(&user.user_id, &course.course_id)
                    .await?
                    .unwrap_or(enrollment))
            }
            EnrollOutcome::AlreadyEnrolled => Err(LearningError::AlreadyEnrolled),
            EnrollOutcome::CapacityReached => {
                tracing::info!(course_id = %course.course_id, capacity = ?course.capacity, "Course full");
                Err(LearningError::CapacityReached)
            }
        }
    }
}

pub struct DropEnrollmentUseCase<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> DropEnrollmentUseCase<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Progress rows are kept so a later re-enrollment picks up where it left off
    pub async fn execute(&self, user: &CurrentUser, course_slug: &str) -> LearningResult<()> {
        let course = course_by_slug(self.repo.as_ref(), course_slug).await?;

        if !self
            .repo
            .drop_enrollment(&user.user_id, &course.course_id)
            .await?
        {
            return Err(LearningError::NotEnrolled);
        }

        tracing::info!(user_id = %user.user_id, course_id = %course.course_id, "Enrollment dropped");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DashboardEntry {
    pub enrollment: Enrollment,
    pub course: Course,
}

pub struct DashboardUseCase<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> DashboardUseCase<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user: &CurrentUser) -> LearningResult<Vec<DashboardEntry>> {
        let enrollments = self.repo.list_enrollments(&user.user_id).await?;

        let mut entries = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            if let Some(course) = self.repo.find_course(&enrollment.course_id).await? {
                entries.push(DashboardEntry { enrollment, course });
            }
        }
        Ok(entries)
    }
}
