//! Module, lesson, exercise and content block authoring

use std::sync::Arc;

use chrono::Utc;
use kernel::id::{ContentBlockId, CourseId, ExerciseId, LessonId, ModuleId};

use crate::application::course_admin::{
    TITLE_MAX_LENGTH, derived_slug, explicit_slug, optional_url, required_text, retry_slug,
};
use crate::domain::entities::{ContentBlock, Exercise, Lesson, Module};
use crate::domain::repository::{LearningStore, SlugWrite};
use crate::domain::value_objects::{BlockType, ContentType, PublishStatus};
use crate::error::{LearningError, LearningResult};

const MAX_HINTS: usize = 20;

fn validate_sort_order(sort_order: i32) -> LearningResult<i32> {
    if sort_order < 0 {
        return Err(LearningError::validation(
            "sort_order",
            "Sort order cannot be negative",
        ));
    }
    Ok(sort_order)
}

// ============================================================================
// Modules
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ModuleInput {
    pub title: String,
    pub description: String,
    pub sort_order: i32,
}

pub struct ModuleAuthoring<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> ModuleAuthoring<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Modules of a course in sort order
    pub async fn list(&self, course_id: &CourseId) -> LearningResult<Vec<Module>> {
        if self.repo.find_course(course_id).await?.is_none() {
            return Err(LearningError::NotFound("Course"));
        }
        self.repo.list_modules(course_id).await
    }

    pub async fn create(&self, course_id: &CourseId, input: ModuleInput) -> LearningResult<Module> {
        if self.repo.find_course(course_id).await?.is_none() {
            return Err(LearningError::NotFound("Course"));
        }

        let now = Utc::now();
        let module = Module {
            module_id: ModuleId::new(),
            course_id: *course_id,
            title: required_text("title", &input.title, TITLE_MAX_LENGTH)?,
            description: input.description.trim().to_string(),
            sort_order: validate_sort_order(input.sort_order)?,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_module(&module).await?;

        tracing::info!(module_id = %module.module_id, course_id = %course_id, "Module created");
        Ok(module)
    }

    pub async fn update(&self, module_id: &ModuleId, input: ModuleInput) -> LearningResult<Module> {
        let mut module = self
            .repo
            .find_module(module_id)
            .await?
            .ok_or(LearningError::NotFound("Module"))?;

        module.title = required_text("title", &input.title, TITLE_MAX_LENGTH)?;
        module.description = input.description.trim().to_string();
        module.sort_order = validate_sort_order(input.sort_order)?;
        module.updated_at = Utc::now();

        if !self.repo.update_module(&module).await? {
            return Err(LearningError::NotFound("Module"));
        }
        Ok(module)
    }

    /// Lessons in the module go with it
    pub async fn delete(&self, module_id: &ModuleId) -> LearningResult<()> {
        if !self.repo.delete_module(module_id).await? {
            return Err(LearningError::NotFound("Module"));
        }
        tracing::info!(module_id = %module_id, "Module deleted");
        Ok(())
    }
}

// ============================================================================
// Lessons
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct LessonInput {
    pub module_id: ModuleId,
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub status: PublishStatus,
    pub content_type: ContentType,
    pub video_url: Option<String>,
    pub duration_minutes: Option<i32>,
    pub sort_order: i32,
}

pub struct LessonAuthoring<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> LessonAuthoring<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, module_id: &ModuleId) -> LearningResult<Vec<Lesson>> {
        self.module(module_id).await?;
        self.repo.list_module_lessons(module_id).await
    }

    /// The lesson's course is taken from its module, never from the caller
    pub async fn create(&self, input: LessonInput) -> LearningResult<Lesson> {
        let module = self.module(&input.module_id).await?;
        let title = required_text("title", &input.title, TITLE_MAX_LENGTH)?;
        let explicit = input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let slug = match explicit {
            Some(s) => explicit_slug(s)?,
            None => derived_slug(&title)?,
        };

        let now = Utc::now();
        let mut lesson = Lesson {
            lesson_id: LessonId::new(),
            module_id: module.module_id,
            course_id: module.course_id,
            slug: slug.clone(),
            title,
            content: input.content,
            status: input.status,
            content_type: input.content_type,
            video_url: optional_url("video_url", input.video_url)?,
            duration_minutes: validate_duration(input.duration_minutes)?,
            sort_order: validate_sort_order(input.sort_order)?,
            created_at: now,
            updated_at: now,
        };

        let mut attempt = 1;
        loop {
            match self.repo.insert_lesson(&lesson).await? {
                SlugWrite::Written => break,
                SlugWrite::SlugTaken => match retry_slug(&slug, &mut attempt) {
                    Some(next) if explicit.is_none() => lesson.slug = next,
                    _ => return Err(LearningError::SlugTaken(slug.to_string())),
                },
            }
        }

        tracing::info!(
            lesson_id = %lesson.lesson_id,
            course_id = %lesson.course_id,
            slug = %lesson.slug,
            "Lesson created"
        );
        Ok(lesson)
    }

    /// Moving a lesson to another module re-derives its course
    pub async fn update(&self, lesson_id: &LessonId, input: LessonInput) -> LearningResult<Lesson> {
        let mut lesson = self
            .repo
            .find_lesson(lesson_id)
            .await?
            .ok_or(LearningError::NotFound("Lesson"))?;
        let module = self.module(&input.module_id).await?;

        lesson.title = required_text("title", &input.title, TITLE_MAX_LENGTH)?;
        if let Some(s) = input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            lesson.slug = explicit_slug(s)?;
        }
        lesson.module_id = module.module_id;
        lesson.course_id = module.course_id;
        lesson.content = input.content;
        lesson.status = input.status;
        lesson.content_type = input.content_type;
        lesson.video_url = optional_url("video_url", input.video_url)?;
        lesson.duration_minutes = validate_duration(input.duration_minutes)?;
        lesson.sort_order = validate_sort_order(input.sort_order)?;
        lesson.updated_at = Utc::now();

        if self.repo.update_lesson(&lesson).await? == SlugWrite::SlugTaken {
            return Err(LearningError::SlugTaken(lesson.slug.to_string()));
        }

        tracing::info!(lesson_id = %lesson.lesson_id, course_id = %lesson.course_id, "Lesson updated");
        Ok(lesson)
    }

    pub async fn delete(&self, lesson_id: &LessonId) -> LearningResult<()> {
        if !self.repo.delete_lesson(lesson_id).await? {
            return Err(LearningError::NotFound("Lesson"));
        }
        tracing::info!(lesson_id = %lesson_id, "Lesson deleted");
        Ok(())
    }

    async fn module(&self, module_id: &ModuleId) -> LearningResult<Module> {
        self.repo
            .find_module(module_id)
            .await?
            .ok_or(LearningError::NotFound("Module"))
    }
}

fn validate_duration(minutes: Option<i32>) -> LearningResult<Option<i32>> {
    match minutes {
        Some(m) if m < 0 => Err(LearningError::validation(
            "duration_minutes",
            "Duration cannot be negative",
        )),
        other => Ok(other),
    }
}

// ============================================================================
// Exercises
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ExerciseInput {
    pub title: String,
    pub instructions: String,
    pub starter_code: String,
    pub solution_code: String,
    pub hints: Vec<String>,
    pub test_cases: serde_json::Value,
    pub sort_order: i32,
}

impl ExerciseInput {
    /// Trimmed title and hints, `null` test cases stored as `[]`
    fn normalized(mut self) -> LearningResult<Self> {
        self.title = required_text("title", &self.title, TITLE_MAX_LENGTH)?;
        if self.solution_code.trim().is_empty() {
            return Err(LearningError::validation(
                "solution_code",
                "Solution code is required",
            ));
        }
        self.hints = self
            .hints
            .into_iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        if self.hints.len() > MAX_HINTS {
            return Err(LearningError::validation(
                "hints",
                format!("At most {MAX_HINTS} hints per exercise"),
            ));
        }
        if self.test_cases.is_null() {
            self.test_cases = serde_json::Value::Array(Vec::new());
        }
        self.sort_order = validate_sort_order(self.sort_order)?;
        Ok(self)
    }
}

pub struct ExerciseAuthoring<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> ExerciseAuthoring<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Full records, solutions included
    pub async fn list(&self, lesson_id: &LessonId) -> LearningResult<Vec<Exercise>> {
        self.lesson(lesson_id).await?;
        self.repo.list_exercises(lesson_id).await
    }

    pub async fn create(&self, lesson_id: &LessonId, input: ExerciseInput) -> LearningResult<Exercise> {
        self.lesson(lesson_id).await?;
        let input = input.normalized()?;

        let now = Utc::now();
        let exercise = Exercise {
            exercise_id: ExerciseId::new(),
            lesson_id: *lesson_id,
            title: input.title,
            instructions: input.instructions,
            starter_code: input.starter_code,
            solution_code: input.solution_code,
            hints: input.hints,
            test_cases: input.test_cases,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_exercise(&exercise).await?;

        tracing::info!(exercise_id = %exercise.exercise_id, lesson_id = %lesson_id, "Exercise created");
        Ok(exercise)
    }

    pub async fn update(&self, exercise_id: &ExerciseId, input: ExerciseInput) -> LearningResult<Exercise> {
        let mut exercise = self
            .repo
            .find_exercise(exercise_id)
            .await?
            .ok_or(LearningError::NotFound("Exercise"))?;
        let input = input.normalized()?;

        exercise.title = input.title;
        exercise.instructions = input.instructions;
        exercise.starter_code = input.starter_code;
        exercise.solution_code = input.solution_code;
        exercise.hints = input.hints;
        exercise.test_cases = input.test_cases;
        exercise.sort_order = input.sort_order;
        exercise.updated_at = Utc::now();

        if !self.repo.update_exercise(&exercise).await? {
            return Err(LearningError::NotFound("Exercise"));
        }
        Ok(exercise)
    }

    /// Submissions for the exercise go with it
    pub async fn delete(&self, exercise_id: &ExerciseId) -> LearningResult<()> {
        if !self.repo.delete_exercise(exercise_id).await? {
            return Err(LearningError::NotFound("Exercise"));
        }
        tracing::info!(exercise_id = %exercise_id, "Exercise deleted");
        Ok(())
    }

    async fn lesson(&self, lesson_id: &LessonId) -> LearningResult<Lesson> {
        self.repo
            .find_lesson(lesson_id)
            .await?
            .ok_or(LearningError::NotFound("Lesson"))
    }
}

// ============================================================================
// Content blocks
// ============================================================================

#[derive(Debug, Clone)]
pub struct ContentBlockInput {
    pub block_type: BlockType,
    pub content: String,
    pub sort_order: i32,
}

pub struct ContentBlockAuthoring<R>
where
    R: LearningStore,
{
    repo: Arc<R>,
}

impl<R> ContentBlockAuthoring<R>
where
    R: LearningStore,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, lesson_id: &LessonId) -> LearningResult<Vec<ContentBlock>> {
        if self.repo.find_lesson(lesson_id).await?.is_none() {
            return Err(LearningError::NotFound("Lesson"));
        }
        self.repo.list_blocks(lesson_id).await
    }

    pub async fn create(&self, lesson_id: &LessonId, input: ContentBlockInput) -> LearningResult<ContentBlock> {
        if self.repo.find_lesson(lesson_id).await?.is_none() {
            return Err(LearningError::NotFound("Lesson"));
        }

        let now = Utc::now();
        let block = ContentBlock {
            block_id: ContentBlockId::new(),
            lesson_id: *lesson_id,
            block_type: input.block_type,
            content: input.content,
            sort_order: validate_sort_order(input.sort_order)?,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_block(&block).await?;
        Ok(block)
    }

    pub async fn update(
        &self,
        block_id: &ContentBlockId,
        input: ContentBlockInput,
    ) -> LearningResult<ContentBlock> {
        let mut block = self
            .repo
            .find_block(block_id)
            .await?
            .ok_or(LearningError::NotFound("Content block"))?;

        block.block_type = input.block_type;
        block.content = input.content;
        block.sort_order = validate_sort_order(input.sort_order)?;
        block.updated_at = Utc::now();

        if !self.repo.update_block(&block).await? {
            return Err(LearningError::NotFound("Content block"));
        }
        Ok(block)
    }

    pub async fn delete(&self, block_id: &ContentBlockId) -> LearningResult<()> {
        if !self.repo.delete_block(block_id).await? {
            return Err(LearningError::NotFound("Content block"));
        }
        Ok(())
    }
}
