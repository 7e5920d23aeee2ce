//! Public course catalog and the lesson viewer

use std::sync::Arc;

use chrono::Utc;
use kernel::principal::CurrentUser;

use crate::application::progress::require_enrollment;
use crate::domain::entities::{
    ContentBlock, Course, Enrollment, Exercise, Lesson, Module, UserProgress,
};
use crate::domain::repository::{CourseRepository, LearningStore};
use crate::domain::services::{lesson_neighbours, ordered_published_lessons};
use crate::domain::value_objects::Slug;
use crate::error::{LearningError, LearningResult};

/// Module with its published lessons in reading order
#[derive(Debug, Clone)]
pub struct ModuleOutline {
    pub module: Module,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone)]
pub struct CourseDetail {
    pub course: Course,
    pub modules: Vec<ModuleOutline>,
    pub subcourses: Vec<Course>,
    /// The viewer's enrollment, when signed in and enrolled
    pub enrollment: Option<Enrollment>,
}

#[derive(Debug, Clone)]
pub struct LessonView {
    pub course: Course,
    pub lesson: Lesson,
    pub blocks: Vec<ContentBlock>,
    pub exercises: Vec<Exercise>,
    pub progress: Option<UserProgress>,
    pub enrollment: Option<Enrollment>,
    pub bookmarked: bool,
    pub previous: Option<Lesson>,
    pub next: Option<Lesson>,
}

/// Drafts are visible to staff only; everyone else gets a plain 404
fn visible(published: bool, viewer: Option<&CurrentUser>) -> bool {
    published || viewer.is_some_and(|u| u.role.is_staff())
}

async fn find_visible_course<R>(
    repo: &R,
    slug: &str,
    viewer: Option<&CurrentUser>,
) -> LearningResult<Course>
where
    R: CourseRepository,
{
    let slug = Slug::new(slug).map_err(|_| LearningError::NotFound("Course"))?;
    repo.find_course_by_slug(&slug)
        .await?
        .filter(|c| visible(c.is_published(), viewer))
        .ok_or(LearningError::NotFound("Course"))
}

/// Group the ordered lesson sequence under its modules
fn outline(modules: Vec<Module>, lessons: &[Lesson]) -> Vec<ModuleOutline> {
    let ordered = ordered_published_lessons(&modules, lessons);
    let mut outline: Vec<ModuleOutline> = modules
        .into_iter()
        .map(|module| ModuleOutline {
            module,
            lessons: Vec::new(),
        })
        .collect();
    outline.sort_by_key(|o| o.module.sort_order);

    for lesson in ordered {
        if let Some(entry) = outline.iter_mut().find(|o| o.module.module_id == lesson.module_id) {
            entry.lessons.push(lesson.clone());
        }
    }
    outline
}

pub struct ListCoursesUseCase<R>
where
    R: CourseRepository,
{
    repo: Arc<R>,
}

impl<R> ListCoursesUseCase<R>
where
    R: CourseRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self) -> LearningResult<Vec<Course>> {
        self.repo.list_published_courses().await
    }
}

pub struct CourseDetailUseCase<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> CourseDetailUseCase<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, slug: &str, viewer: Option<&CurrentUser>) -> LearningResult<CourseDetail> {
        let course = find_visible_course(self.repo.as_ref(), slug, viewer).await?;

        let modules = self.repo.list_modules(&course.course_id).await?;
        let lessons = self.repo.list_lessons(&course.course_id).await?;
        let subcourses = self.repo.list_subcourses(&course.course_id, true).await?;

        let enrollment = match viewer {
            Some(user) => self
                .repo
                .find_enrollment(&user.user_id, &course.course_id)
                .await?
                .filter(Enrollment::is_active),
            None => None,
        };

        Ok(CourseDetail {
            modules: outline(modules, &lessons),
            course,
            subcourses,
            enrollment,
        })
    }
}

pub struct ViewLessonUseCase<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> ViewLessonUseCase<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Enrolled users read lessons; staff may preview without enrolling.
    /// Viewing records the visit and starts progress on first view.
    pub async fn execute(
        &self,
        user: &CurrentUser,
        course_slug: &str,
        lesson_slug: &str,
    ) -> LearningResult<LessonView> {
        let repo = self.repo.as_ref();
        let course = find_visible_course(repo, course_slug, Some(user)).await?;

        let lesson_slug = Slug::new(lesson_slug).map_err(|_| LearningError::NotFound("Lesson"))?;
        let lesson = repo
            .find_lesson_by_slug(&course.course_id, &lesson_slug)
            .await?
            .filter(|l| visible(l.is_published(), Some(user)))
            .ok_or(LearningError::NotFound("Lesson"))?;

        let enrollment = match require_enrollment(repo, &user.user_id, &course.course_id).await {
            Ok(enrollment) => Some(enrollment),
            Err(LearningError::NotEnrolled) if user.role.is_staff() => None,
            Err(e) => return Err(e),
        };

        let modules = repo.list_modules(&course.course_id).await?;
        let lessons = repo.list_lessons(&course.course_id).await?;
        let ordered = ordered_published_lessons(&modules, &lessons);
        let neighbours = lesson_neighbours(&ordered, &lesson.lesson_id);
        let previous = neighbours.previous.cloned();
        let next = neighbours.next.cloned();

        let blocks = repo.list_blocks(&lesson.lesson_id).await?;
        let exercises = repo.list_exercises(&lesson.lesson_id).await?;
        let bookmarked = repo.is_bookmarked(&user.user_id, &lesson.lesson_id).await?;

        let now = Utc::now();
        let progress = if enrollment.is_some() && lesson.is_published() {
            repo.touch_enrollment(&user.user_id, &course.course_id, now).await?;
            Some(repo.start_progress(&user.user_id, &lesson, now).await?)
        } else {
            repo.find_progress(&user.user_id, &lesson.lesson_id).await?
        };

        Ok(LessonView {
            course,
            lesson,
            blocks,
            exercises,
            progress,
            enrollment,
            bookmarked,
            previous,
            next,
        })
    }
}
