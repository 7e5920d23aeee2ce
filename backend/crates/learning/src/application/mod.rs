//! Application Layer
//!
//! Use cases and authoring services.

pub mod bookmarks;
pub mod catalog;
pub mod config;
pub mod content_admin;
pub mod course_admin;
pub mod enrollment;
pub mod progress;
pub mod submissions;
pub mod uploads;

pub use bookmarks::{ListBookmarksUseCase, ToggleBookmarkUseCase};
pub use catalog::{
    CourseDetail, CourseDetailUseCase, LessonView, ListCoursesUseCase, ModuleOutline,
    ViewLessonUseCase,
};
pub use config::LearningConfig;
pub use content_admin::{
    ContentBlockAuthoring, ContentBlockInput, ExerciseAuthoring, ExerciseInput, LessonAuthoring,
    LessonInput, ModuleAuthoring, ModuleInput,
};
pub use course_admin::{CourseAuthoring, CourseInput, CourseOutline};
pub use enrollment::{DashboardEntry, DashboardUseCase, DropEnrollmentUseCase, EnrollUseCase};
pub use progress::{CourseProgress, MarkLessonCompleteUseCase, TrackTimeUseCase};
pub use submissions::{ListSubmissionsUseCase, SubmissionResult, SubmitExerciseUseCase};
pub use uploads::{ServeImageUseCase, UploadImageUseCase, UploadedImage};
