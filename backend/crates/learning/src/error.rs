//! Learning Error Types
//!
//! Catalog, enrollment, progress and upload failures, mapped onto the
//! unified `kernel::error::AppError` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

pub type LearningResult<T> = Result<T, LearningError>;

#[derive(Debug, Error)]
pub enum LearningError {
    /// Missing or not visible to the caller; the payload names the entity
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Course is not published")]
    CourseNotPublished,

    #[error("Course is closed for enrollment")]
    EnrollmentClosed,

    #[error("You are already enrolled in this course")]
    AlreadyEnrolled,

    #[error("Course has reached its capacity")]
    CapacityReached,

    #[error("You are not enrolled in this course")]
    NotEnrolled,

    #[error("Slug '{0}' is already in use")]
    SlugTaken(String),

    #[error("A course cannot be nested under itself or one of its subcourses")]
    ParentCycle,

    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Only JPEG, PNG, GIF and WebP images are accepted")]
    UnsupportedMediaType,

    #[error("Image exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    #[error("Malformed upload: {0}")]
    BadUpload(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LearningError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LearningError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LearningError::NotFound(_) => ErrorKind::NotFound,
            LearningError::CourseNotPublished
            | LearningError::EnrollmentClosed
            | LearningError::NotEnrolled => ErrorKind::Forbidden,
            LearningError::AlreadyEnrolled
            | LearningError::CapacityReached
            | LearningError::SlugTaken(_) => ErrorKind::Conflict,
            LearningError::ParentCycle | LearningError::Validation { .. } => {
                ErrorKind::UnprocessableEntity
            }
            LearningError::UnsupportedMediaType => ErrorKind::UnsupportedMediaType,
            LearningError::PayloadTooLarge(_) => ErrorKind::PayloadTooLarge,
            LearningError::BadUpload(_) => ErrorKind::BadRequest,
            LearningError::Io(_) | LearningError::Database(_) | LearningError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            // Storage details stay in the log
            LearningError::Io(_) | LearningError::Database(_) | LearningError::Internal(_) => {
                AppError::internal("Something went wrong on our side")
            }
            LearningError::Validation { field, message } => {
                AppError::new(self.kind(), message.clone()).with_field(*field, message.clone())
            }
            LearningError::SlugTaken(_) => {
                AppError::new(self.kind(), self.to_string()).with_field("slug", self.to_string())
            }
            LearningError::ParentCycle => AppError::new(self.kind(), self.to_string())
                .with_field("parent_course_id", self.to_string()),
            LearningError::NotEnrolled => AppError::new(self.kind(), self.to_string())
                .with_action("Enroll in the course to continue"),
            LearningError::CapacityReached => AppError::new(self.kind(), self.to_string())
                .with_action("Try again when a seat frees up"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            LearningError::Database(e) => {
                tracing::error!(error = %e, "Learning database error");
            }
            LearningError::Io(e) => {
                tracing::error!(error = %e, "Upload storage error");
            }
            LearningError::Internal(msg) => {
                tracing::error!(message = %msg, "Learning internal error");
            }
            LearningError::UnsupportedMediaType | LearningError::PayloadTooLarge(_) => {
                tracing::warn!(error = %self, "Rejected upload");
            }
            _ => {
                tracing::debug!(error = %self, "Learning error");
            }
        }
    }
}

impl IntoResponse for LearningError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for LearningError {
    fn from(err: AppError) -> Self {
        LearningError::Internal(err.to_string())
    }
}
