//! Lesson bookmarks

use std::sync::Arc;

use chrono::Utc;
use kernel::id::LessonId;
use kernel::principal::CurrentUser;

use crate::domain::entities::BookmarkedLesson;
use crate::domain::repository::{BookmarkRepository, LessonRepository};
use crate::error::{LearningError, LearningResult};

pub struct ToggleBookmarkUseCase<R>
where
    R: LessonRepository + BookmarkRepository,
{
    repo: Arc<R>,
}

impl<R> ToggleBookmarkUseCase<R>
where
    R: LessonRepository + BookmarkRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Returns whether the lesson is bookmarked afterwards
    pub async fn execute(&self, user: &CurrentUser, lesson_id: &LessonId) -> LearningResult<bool> {
        if self.repo.find_lesson(lesson_id).await?.is_none() {
            return Err(LearningError::NotFound("Lesson"));
        }
        self.repo
            .toggle_bookmark(&user.user_id, lesson_id, Utc::now())
            .await
    }
}

pub struct ListBookmarksUseCase<R>
where
    R: BookmarkRepository,
{
    repo: Arc<R>,
}

impl<R> ListBookmarksUseCase<R>
where
    R: BookmarkRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user: &CurrentUser) -> LearningResult<Vec<BookmarkedLesson>> {
        self.repo.list_bookmarks(&user.user_id).await
    }
}
