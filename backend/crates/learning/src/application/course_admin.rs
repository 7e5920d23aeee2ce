//! Course authoring for instructors and admins

use std::sync::Arc;

use chrono::Utc;
use kernel::id::CourseId;
use kernel::principal::CurrentUser;

use crate::domain::entities::{Course, Lesson, Module};
use crate::domain::repository::{LearningStore, SlugWrite};
use crate::domain::services::would_create_cycle;
use crate::domain::value_objects::{Difficulty, EnrollmentType, PublishStatus, Slug};
use crate::error::{LearningError, LearningResult};

pub const TITLE_MAX_LENGTH: usize = 200;
pub const URL_MAX_LENGTH: usize = 2048;

/// Attempts at `slug-2`, `slug-3`, ... before giving up on a derived slug
const DERIVED_SLUG_ATTEMPTS: u32 = 50;

#[derive(Debug, Clone, Default)]
pub struct CourseInput {
    pub title: String,
    /// Derived from the title when absent
    pub slug: Option<String>,
    pub description: String,
    pub status: PublishStatus,
    pub difficulty: Difficulty,
    pub enrollment_type: EnrollmentType,
    pub capacity: Option<i32>,
    pub parent_course_id: Option<CourseId>,
    pub thumbnail_url: Option<String>,
    pub sort_order: i32,
}

/// Trimmed, non-empty, bounded
pub(crate) fn required_text(field: &'static str, value: &str, max: usize) -> LearningResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LearningError::validation(field, format!("{} is required", label(field))));
    }
    if value.chars().count() > max {
        return Err(LearningError::validation(
            field,
            format!("{} must be at most {max} characters", label(field)),
        ));
    }
    Ok(value.to_string())
}

pub(crate) fn optional_url(field: &'static str, value: Option<String>) -> LearningResult<Option<String>> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) if v.len() > URL_MAX_LENGTH => Err(LearningError::validation(
            field,
            format!("{} must be at most {URL_MAX_LENGTH} characters", label(field)),
        )),
        other => Ok(other),
    }
}

/// Explicit slugs must be valid as given
pub(crate) fn explicit_slug(value: &str) -> LearningResult<Slug> {
    Slug::new(value).map_err(|e| LearningError::validation("slug", e.to_string()))
}

pub(crate) fn derived_slug(title: &str) -> LearningResult<Slug> {
    Slug::from_title(title).map_err(|_| {
        LearningError::validation("slug", "Provide a slug; none can be derived from this title")
    })
}

/// Next numbered variant of a derived slug, `None` once attempts run out
pub(crate) fn retry_slug(base: &Slug, attempt: &mut u32) -> Option<Slug> {
    *attempt += 1;
    (*attempt <= DERIVED_SLUG_ATTEMPTS).then(|| base.with_suffix(*attempt))
}

fn label(field: &str) -> String {
    let mut label = field.replace('_', " ");
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    label
}

fn validate_capacity(capacity: Option<i32>) -> LearningResult<Option<i32>> {
    match capacity {
        Some(c) if c < 1 => Err(LearningError::validation(
            "capacity",
            "Capacity must be at least 1, or empty for unlimited",
        )),
        other => Ok(other),
    }
}

/// Course with every module and lesson, drafts included
#[derive(Debug, Clone)]
pub struct CourseOutline {
    pub course: Course,
    pub modules: Vec<Module>,
    pub lessons: Vec<Lesson>,
}

pub struct CourseAuthoring<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> CourseAuthoring<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> LearningResult<Vec<Course>> {
        self.repo.list_all_courses().await
    }

    pub async fn outline(&self, course_id: &CourseId) -> LearningResult<CourseOutline> {
        let course = self.find(course_id).await?;
        let modules = self.repo.list_modules(course_id).await?;
        let lessons = self.repo.list_lessons(course_id).await?;
        Ok(CourseOutline {
            course,
            modules,
            lessons,
        })
    }

    pub async fn create(&self, actor: &CurrentUser, input: CourseInput) -> LearningResult<Course> {
        let title = required_text("title", &input.title, TITLE_MAX_LENGTH)?;
        let capacity = validate_capacity(input.capacity)?;
        let thumbnail_url = optional_url("thumbnail_url", input.thumbnail_url)?;
        let explicit = input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let slug = match explicit {
            Some(s) => explicit_slug(s)?,
            None => derived_slug(&title)?,
        };

        if let Some(parent) = &input.parent_course_id {
            self.require_parent(parent).await?;
        }

        let now = Utc::now();
        let mut course = Course {
            course_id: CourseId::new(),
            slug: slug.clone(),
            title,
            description: input.description.trim().to_string(),
            status: input.status,
            difficulty: input.difficulty,
            enrollment_type: input.enrollment_type,
            capacity,
            parent_course_id: input.parent_course_id,
            instructor_id: Some(actor.user_id),
            thumbnail_url,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        };

        let mut attempt = 1;
        loop {
            match self.repo.insert_course(&course).await? {
                SlugWrite::Written => break,
                SlugWrite::SlugTaken => match retry_slug(&slug, &mut attempt) {
                    Some(next) if explicit.is_none() => course.slug = next,
                    _ => return Err(LearningError::SlugTaken(slug.to_string())),
                },
            }
        }

        tracing::info!(
            course_id = %course.course_id,
            slug = %course.slug,
            actor = %actor.user_id,
            "Course created"
        );
        Ok(course)
    }

    /// Full replacement. An absent slug keeps the current one.
    pub async fn update(&self, course_id: &CourseId, input: CourseInput) -> LearningResult<Course> {
        let mut course = self.find(course_id).await?;

        course.title = required_text("title", &input.title, TITLE_MAX_LENGTH)?;
        course.capacity = validate_capacity(input.capacity)?;
        course.thumbnail_url = optional_url("thumbnail_url", input.thumbnail_url)?;
        if let Some(s) = input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            course.slug = explicit_slug(s)?;
        }

        if let Some(parent) = &input.parent_course_id {
            self.require_parent(parent).await?;
            let ancestors = self.repo.course_ancestors(parent).await?;
            if would_create_cycle(course_id, parent, &ancestors) {
                return Err(LearningError::ParentCycle);
            }
        }

        course.description = input.description.trim().to_string();
        course.status = input.status;
        course.difficulty = input.difficulty;
        course.enrollment_type = input.enrollment_type;
        course.parent_course_id = input.parent_course_id;
        course.sort_order = input.sort_order;
        course.updated_at = Utc::now();

        if self.repo.update_course(&course).await? == SlugWrite::SlugTaken {
            return Err(LearningError::SlugTaken(course.slug.to_string()));
        }

        tracing::info!(course_id = %course.course_id, "Course updated");
        Ok(course)
    }

    pub async fn set_status(&self, course_id: &CourseId, status: PublishStatus) -> LearningResult<Course> {
        let mut course = self.find(course_id).await?;
        if course.status != status {
            course.status = status;
            course.updated_at = Utc::now();
            self.repo.update_course(&course).await?;
            tracing::info!(course_id = %course.course_id, status = %status, "Course status changed");
        }
        Ok(course)
    }

    pub async fn delete(&self, course_id: &CourseId) -> LearningResult<()> {
        if !self.repo.delete_course(course_id).await? {
            return Err(LearningError::NotFound("Course"));
        }
        tracing::info!(course_id = %course_id, "Course deleted");
        Ok(())
    }

    async fn find(&self, course_id: &CourseId) -> LearningResult<Course> {
        self.repo
            .find_course(course_id)
            .await?
            .ok_or(LearningError::NotFound("Course"))
    }

    async fn require_parent(&self, parent: &CourseId) -> LearningResult<()> {
        match self.repo.find_course(parent).await? {
            Some(_) => Ok(()),
            None => Err(LearningError::validation(
                "parent_course_id",
                "Parent course does not exist",
            )),
        }
    }
}
